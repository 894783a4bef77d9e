// drum synthesizer: a (kind, time, velocity) hit becomes a voice graph handed to
// the audio bus. It knows nothing about patterns and never renders samples.

pub mod recipes;

use crate::audio::AudioBus;
use crate::shared::InstrumentKind;

pub struct Synthesizer {
    bus: AudioBus,
}

impl Synthesizer {
    pub fn new(bus: AudioBus) -> Self {
        Self { bus }
    }

    /// Schedule one hit at `time` seconds on the audio clock.
    /// Does nothing until the audio output exists.
    pub fn trigger(&self, kind: InstrumentKind, time: f64, velocity: f32) {
        let Some(output) = self.bus.output() else {
            return;
        };
        let velocity = if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) };
        let graph = recipes::build(kind, time, velocity as f64, output.sample_rate(), &mut rand::rng());
        output.submit(graph);
    }
}
