use std::cell::UnsafeCell;
use std::ops::Deref;
use std::rc::Rc;
use std::time;
use std::time::Instant;

pub struct FpsCounter {
    count: u32,
    timer: Instant,
}

const SECOND: time::Duration = time::Duration::from_secs(1);

impl Default for FpsCounter {
    fn default() -> FpsCounter {
        FpsCounter {
            count: 0,
            timer: Instant::now(),
        }
    }
}

impl FpsCounter {
    pub fn tick(&mut self) -> Option<u32> {
        self.count += 1;
        if self.timer.elapsed() >= SECOND {
            let fps = self.count;
            self.timer = Instant::now();
            self.count = 0;
            Some(fps)
        } else {
            None
        }
    }
}

pub mod audio {
    pub use ringbuf::{Consumer, Producer, RingBuffer};
    pub type SampleProducer = Producer<i16>;
    pub type SampleConsumer = Consumer<i16>;

    pub struct AudioRingBuffer {
        prod: SampleProducer,
        cons: SampleConsumer,
    }

    impl Default for AudioRingBuffer {
        fn default() -> AudioRingBuffer {
            AudioRingBuffer::new_with_capacity(2 * 4096)
        }
    }

    impl AudioRingBuffer {
        pub fn new_with_capacity(capacity: usize) -> AudioRingBuffer {
            let rb = RingBuffer::new(capacity);
            let (prod, cons) = rb.split();

            AudioRingBuffer { prod, cons }
        }

        pub fn producer(&mut self) -> &mut SampleProducer {
            &mut self.prod
        }

        pub fn consumer(&mut self) -> &mut SampleConsumer {
            &mut self.cons
        }

        pub fn split(self) -> (SampleProducer, SampleConsumer) {
            (self.prod, self.cons)
        }
    }
}

/// Opt-out of runtime borrow checking of RefCell by using UnsafeCell.
/// SAFETY: up to the user to make sure the usage of the shared object is safe.
/// Peripherals within a single worker thread share state this way instead of
/// through `Rc<RefCell<_>>`, avoiding the runtime borrow-check cost on every
/// register access.
#[repr(transparent)]
#[derive(Debug)]
pub struct Shared<T>(Rc<UnsafeCell<T>>);

impl<T> std::ops::Deref for Shared<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        unsafe { &(*self.0.get()) }
    }
}

impl<T> std::ops::DerefMut for Shared<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { &mut (*self.0.get()) }
    }
}

impl<T> Clone for Shared<T> {
    #[inline]
    fn clone(&self) -> Shared<T> {
        Shared(self.0.clone())
    }
}

impl<T> Shared<T> {
    pub fn new(t: T) -> Shared<T> {
        Shared(Rc::new(UnsafeCell::new(t)))
    }
}

impl<T> Shared<T>
where
    T: Clone,
{
    pub fn clone_inner(&self) -> T {
        self.deref().clone()
    }
}

impl<T> Default for Shared<T>
where
    T: Default,
{
    fn default() -> Shared<T> {
        Shared::new(Default::default())
    }
}
