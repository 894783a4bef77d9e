// pocketbeat: a 16-step drum machine. A coarse timer thread reads the audio
// clock and stamps every due step with its exact audio-clock time; the synth
// turns each hit into a voice graph the audio callback renders at that time.

pub mod audio;
pub mod audio_api;
pub mod config;
pub mod middle;
pub mod pipeline;
pub mod sequencer;
pub mod shared;
pub mod synth;
pub mod tui;

pub use audio::{AudioBus, AudioEngine};
pub use pipeline::{Pattern, PatternStore, Snapshot, Tempo, Track};
pub use sequencer::{Scheduler, SchedulerConfig, SequencerError};
pub use shared::InstrumentKind;
pub use synth::Synthesizer;
