// look-ahead scheduler: a coarse timer thread wakes every `lookahead` and hands
// the synth every step due within the next `schedule_ahead` seconds of the audio
// clock. The time stamped on each voice is what counts, not when the thread woke
// up, so timer jitter up to the window size never moves a note.

mod cursor;
mod playhead;

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

use crate::audio::AudioBus;
use crate::pipeline::PatternStore;
use crate::synth::Synthesizer;

pub use cursor::{Cursor, StepSink, VoiceInvocation};
pub use playhead::Playhead;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    pub lookahead: Duration, // how often the wake loop runs
    pub schedule_ahead: f64, // how far past now a tick may commit, must exceed lookahead
    pub start_offset: f64,   // gap between pressing play and the first step
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead: Duration::from_millis(25),
            schedule_ahead: 0.1,
            start_offset: 0.05,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("audio output is not initialized")]
    AudioNotReady,
    #[error("could not start the scheduler timer: {0}")]
    TimerUnavailable(#[from] std::io::Error),
}

// the live sink: voices to the synth, step times to the playhead
struct LiveSink<'a> {
    synth: &'a Synthesizer,
    playhead: &'a Playhead,
}

impl StepSink for LiveSink<'_> {
    fn step_scheduled(&mut self, step: usize, time: f64) {
        self.playhead.record(step, time);
    }

    fn voice(&mut self, invocation: VoiceInvocation) {
        self.synth.trigger(invocation.kind, invocation.time, invocation.velocity);
    }
}

// everything the timer thread needs, moved into it on start
struct WakeLoop {
    store: PatternStore,
    bus: AudioBus,
    synth: Arc<Synthesizer>,
    cursor: Arc<Mutex<Cursor>>,
    playhead: Arc<Playhead>,
    config: SchedulerConfig,
}

impl WakeLoop {
    fn run(self, stop_rx: crossbeam_channel::Receiver<()>) {
        log::debug!(target: "scheduler", "wake loop running every {:?}", self.config.lookahead);
        loop {
            self.tick();
            match stop_rx.recv_timeout(self.config.lookahead) {
                Err(RecvTimeoutError::Timeout) => continue,
                // stop() asked, or the scheduler went away
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::debug!(target: "scheduler", "wake loop stopped");
    }

    fn tick(&self) {
        let snapshot = self.store.snapshot();
        let now = self.bus.current_time();
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sink = LiveSink { synth: &self.synth, playhead: &self.playhead };
        let scheduled = cursor.tick(now, self.config.schedule_ahead, &snapshot, &mut sink);
        if scheduled > 1 {
            log::trace!(target: "scheduler", "caught up {scheduled} steps at t={now:.3}");
        }
    }
}

struct Running {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Running {
    // signal (harmless if the loop already died) and wait for the thread
    fn shut_down(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            log::error!(target: "scheduler", "wake loop panicked");
        }
    }
}

pub struct Scheduler {
    store: PatternStore,
    bus: AudioBus,
    synth: Arc<Synthesizer>,
    config: SchedulerConfig,
    cursor: Arc<Mutex<Cursor>>,
    playhead: Arc<Playhead>,
    running: Option<Running>, // some while a wake loop thread exists, alive or not
}

impl Scheduler {
    pub fn new(store: PatternStore, bus: AudioBus, config: SchedulerConfig) -> Self {
        Self {
            synth: Arc::new(Synthesizer::new(bus.clone())),
            store,
            bus,
            config,
            cursor: Arc::new(Mutex::new(Cursor::starting_at(0.0, config.start_offset))),
            playhead: Arc::new(Playhead::new()),
            running: None,
        }
    }

    // a wake loop that died (panicked) counts as stopped
    pub fn is_playing(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// Start playback from step 0, `start_offset` seconds from now.
    /// Already playing: nothing happens, there is only ever one wake loop.
    pub fn start(&mut self) -> Result<(), SequencerError> {
        if self.is_playing() {
            log::debug!(target: "scheduler", "start ignored, already playing");
            return Ok(());
        }
        if let Some(dead) = self.running.take() {
            dead.shut_down();
        }
        if !self.bus.is_ready() {
            return Err(SequencerError::AudioNotReady);
        }

        let now = self.bus.current_time();
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) =
            Cursor::starting_at(now, self.config.start_offset);
        self.playhead.reset();

        let (stop_tx, stop_rx) = crossbeam_channel::bounded(1);
        let wake_loop = WakeLoop {
            store: self.store.clone(),
            bus: self.bus.clone(),
            synth: Arc::clone(&self.synth),
            cursor: Arc::clone(&self.cursor),
            playhead: Arc::clone(&self.playhead),
            config: self.config,
        };
        let handle = thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || wake_loop.run(stop_rx))
            .inspect_err(|e| log::error!(target: "scheduler", "could not spawn wake loop: {e}"))?;

        self.running = Some(Running { stop_tx, handle });
        log::info!(target: "scheduler", "playing from t={now:.3}");
        Ok(())
    }

    // voices already handed off ring out; stopped is a no-op
    pub fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        running.shut_down();
        log::info!(target: "scheduler", "stopped at t={:.3}", self.bus.current_time());
    }

    // returns whether we're playing afterwards
    pub fn toggle(&mut self) -> Result<bool, SequencerError> {
        if self.is_playing() {
            self.stop();
        } else {
            self.start()?;
        }
        Ok(self.is_playing())
    }

    // the step sounding right now on the audio clock, for display only
    pub fn current_step(&self) -> Option<usize> {
        if !self.is_playing() {
            return None;
        }
        self.playhead.current_step(self.bus.current_time())
    }

    pub fn cursor(&self) -> Cursor {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
