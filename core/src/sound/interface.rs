//! Host audio output glue, grounded on the teacher's `sound/interface.rs`
//! (`AudioInterface`, `NullAudio`, `SimpleAudioInterface`).

use gbcore_utils::audio::SampleProducer;

pub trait AudioInterface {
    fn push_sample(&mut self, left: i16, right: i16);
}

/// Discards every sample. Used when the embedder runs headless.
pub struct NullAudio;

impl AudioInterface for NullAudio {
    fn push_sample(&mut self, _left: i16, _right: i16) {}
}

/// Pushes interleaved stereo samples into a [`gbcore_utils::audio::AudioRingBuffer`]
/// producer half; samples are dropped once the ring buffer backs up.
pub struct SimpleAudioInterface {
    producer: SampleProducer,
}

impl SimpleAudioInterface {
    pub fn new(producer: SampleProducer) -> SimpleAudioInterface {
        SimpleAudioInterface { producer }
    }
}

impl AudioInterface for SimpleAudioInterface {
    fn push_sample(&mut self, left: i16, right: i16) {
        let _ = self.producer.push(left);
        let _ = self.producer.push(right);
    }
}

pub type DynAudioInterface = Box<dyn AudioInterface>;
