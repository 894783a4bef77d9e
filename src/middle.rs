// Sits between the TUI and the sequencer core: turns semantic input events into
// pattern edits and transport commands, and builds the `DisplayState` the TUI
// draws every frame.

use crate::audio::AudioEngine;
use crate::pipeline::PatternStore;
use crate::sequencer::{Scheduler, SchedulerConfig, SequencerError};
use crate::shared::{DisplayState, InputEvent, RowDisplay, STEPS_PER_BAR};

pub struct Middle {
    store: PatternStore,
    engine: AudioEngine,
    scheduler: Scheduler,
    selected_track: usize,
    selected_step: usize,
    status: String,
    audio_failed: bool, // device open was tried and failed; only play retries it
    display: DisplayState,
}

impl Middle {
    pub fn new(store: PatternStore, engine: AudioEngine, config: SchedulerConfig) -> Self {
        let scheduler = Scheduler::new(store.clone(), engine.bus(), config);
        let mut middle = Self {
            store,
            engine,
            scheduler,
            selected_track: 0,
            selected_step: 0,
            status: String::new(),
            audio_failed: false,
            display: DisplayState {
                rows: Vec::new(),
                playing_step: None,
                playing: false,
                audio_ready: false,
                bpm: 0.0,
                selected_track: 0,
                selected_step: 0,
                display_text: String::new(),
            },
        };
        if !middle.engine.is_ready() {
            middle.status = "PRESS ANY KEY".into();
        }
        middle.refresh_display();
        middle
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        // the audio device only opens in response to a key press
        if !self.engine.is_ready()
            && event != InputEvent::Quit
            && (!self.audio_failed || event == InputEvent::PlayPress)
        {
            self.init_audio();
        }

        match event {
            InputEvent::PlayPress => self.toggle_transport(),
            InputEvent::CursorLeft => {
                self.selected_step = (self.selected_step + STEPS_PER_BAR - 1) % STEPS_PER_BAR;
            }
            InputEvent::CursorRight => {
                self.selected_step = (self.selected_step + 1) % STEPS_PER_BAR;
            }
            InputEvent::CursorUp => {
                let tracks = self.track_count();
                if tracks > 0 {
                    self.selected_track = (self.selected_track + tracks - 1) % tracks;
                }
            }
            InputEvent::CursorDown => {
                let tracks = self.track_count();
                if tracks > 0 {
                    self.selected_track = (self.selected_track + 1) % tracks;
                }
            }
            InputEvent::ToggleStep => {
                self.store.toggle_step(self.selected_track, self.selected_step);
            }
            InputEvent::ToggleMute => {
                if let Some(muted) = self.store.toggle_mute(self.selected_track) {
                    let label = self.selected_label();
                    self.status = if muted { format!("{label} MUTE") } else { format!("{label} ON") };
                }
            }
            InputEvent::NudgeVelocity(delta) => {
                if let Some(v) = self.store.nudge_velocity(self.selected_track, delta) {
                    self.status = format!("{} VEL {:.2}", self.selected_label(), v);
                }
            }
            InputEvent::NudgeTempo(delta) => {
                let tempo = self.store.nudge_tempo(delta);
                self.status = format!("{:.0} BPM", tempo.bpm());
            }
            InputEvent::ClearPattern => {
                self.store.clear();
                self.status = "CLEARED".into();
            }
            InputEvent::Quit => self.scheduler.stop(),
        }
        self.refresh_display();
    }

    // rebuilt on every call so the playhead follows the audio clock
    pub fn display_state(&mut self) -> &DisplayState {
        self.refresh_display();
        &self.display
    }

    fn init_audio(&mut self) {
        match self.engine.init() {
            Ok(()) => {
                self.audio_failed = false;
                self.status.clear();
            }
            Err(e) => {
                log::error!(target: "audio", "could not open audio output: {e:#}");
                self.audio_failed = true;
                self.status = "AUDIO ERROR".into();
            }
        }
    }

    fn toggle_transport(&mut self) {
        match self.scheduler.toggle() {
            Ok(true) => self.status.clear(),
            Ok(false) => {}
            Err(SequencerError::AudioNotReady) => self.status = "AUDIO ERROR".into(),
            Err(e) => {
                log::error!(target: "scheduler", "{e}");
                self.status = "TIMER ERROR".into();
            }
        }
    }

    fn track_count(&self) -> usize {
        self.store.snapshot().pattern.len()
    }

    fn selected_label(&self) -> &'static str {
        self.store
            .snapshot()
            .pattern
            .tracks()
            .get(self.selected_track)
            .map_or("--", |t| t.kind().label())
    }

    fn refresh_display(&mut self) {
        let snapshot = self.store.snapshot();
        let d = &mut self.display;
        d.rows = snapshot
            .pattern
            .tracks()
            .iter()
            .map(|t| RowDisplay {
                label: t.kind().label(),
                steps: *t.steps(),
                muted: t.is_muted(),
                velocity: t.velocity(),
            })
            .collect();
        d.playing = self.scheduler.is_playing();
        d.playing_step = self.scheduler.current_step().map(|s| s as u8);
        d.audio_ready = self.engine.is_ready();
        d.bpm = snapshot.tempo.bpm();
        d.selected_track = self.selected_track;
        d.selected_step = self.selected_step;
        d.display_text.clone_from(&self.status);
    }
}
