use crate::audio::VoiceGraph;

// What the scheduler and synth need from the audio side: a clock that never
// stops or resets, and somewhere to hand finished voice graphs. The real one is
// backed by cpal (see audio/mod.rs); tests use `ManualOutput`.
pub trait AudioOutput: Send + Sync {
    // seconds on the audio clock. Starts at 0 when the output is created.
    fn current_time(&self) -> f64;
    fn sample_rate(&self) -> u32;
    // must not block; a full queue drops the voice.
    fn submit(&self, graph: VoiceGraph);
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't build graphs (allocates, rolls noise), so the synth
    // builds them up front and ships the whole thing across
    Play(VoiceGraph),
}

#[cfg(test)]
pub(crate) use manual::ManualOutput;

#[cfg(test)]
mod manual {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, PoisonError};

    use super::{AudioOutput, VoiceGraph};

    // fake audio device: the test moves the clock by hand and reads back what was submitted
    pub(crate) struct ManualOutput {
        now: Mutex<f64>,
        sample_rate: u32,
        graphs: Mutex<Vec<VoiceGraph>>,
        clock_broken: AtomicBool, // reading the clock panics while set
    }

    impl ManualOutput {
        pub(crate) fn new(sample_rate: u32) -> Self {
            Self {
                now: Mutex::new(0.0),
                sample_rate,
                graphs: Mutex::new(Vec::new()),
                clock_broken: AtomicBool::new(false),
            }
        }

        pub(crate) fn set_time(&self, secs: f64) {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner) = secs;
        }

        pub(crate) fn set_clock_broken(&self, broken: bool) {
            self.clock_broken.store(broken, Ordering::Release);
        }

        pub(crate) fn submitted(&self) -> Vec<VoiceGraph> {
            self.graphs.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        pub(crate) fn take_submitted(&self) -> Vec<VoiceGraph> {
            std::mem::take(&mut *self.graphs.lock().unwrap_or_else(PoisonError::into_inner))
        }
    }

    impl AudioOutput for ManualOutput {
        fn current_time(&self) -> f64 {
            if self.clock_broken.load(Ordering::Acquire) {
                panic!("audio clock unavailable");
            }
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn submit(&self, graph: VoiceGraph) {
            self.graphs.lock().unwrap_or_else(PoisonError::into_inner).push(graph);
        }
    }
}
