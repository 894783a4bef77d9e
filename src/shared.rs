// Types shared between the sequencer core and the terminal front end.
//
// The idea of the rendering process (same as always):
//   - Only the middle layer owns sequencer and transport state; the TUI just
//     renders whatever `DisplayState` it is handed on every frame.
//   - Keys are resolved into semantic `InputEvent`s by the TUI, and the middle
//     layer turns those into store mutations or transport commands.
//   - The playhead column is whatever the scheduler says is sounding right now
//     on the audio clock. The TUI never works out timing on its own.

pub const STEPS_PER_BAR: usize = 16; // one bar of 16th notes
pub const STEPS_PER_BEAT: usize = 4;

pub const MIN_BPM: f64 = 60.0;
pub const MAX_BPM: f64 = 200.0;
pub const DEFAULT_BPM: f64 = 120.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    Kick,
    Snare,
    HiHat,
    Clap,
}

impl InstrumentKind {
    pub const ALL: [InstrumentKind; 4] = [
        InstrumentKind::Kick,
        InstrumentKind::Snare,
        InstrumentKind::HiHat,
        InstrumentKind::Clap,
    ];

    // the two-letter names printed on the PO panel
    pub fn label(self) -> &'static str {
        match self {
            InstrumentKind::Kick => "BD",
            InstrumentKind::Snare => "SD",
            InstrumentKind::HiHat => "CH",
            InstrumentKind::Clap => "CP",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // transport (space)
    PlayPress,

    // grid cursor (arrows / hjkl)
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,

    // edits on the cell / track under the cursor
    ToggleStep,        // enter
    ToggleMute,        // m
    NudgeVelocity(f32), // - / =
    NudgeTempo(f64),   // [ ] and { }
    ClearPattern,      // c

    // quit button (esc)
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowDisplay {
    pub label: &'static str,
    pub steps: [bool; STEPS_PER_BAR],
    pub muted: bool,
    pub velocity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    pub rows: Vec<RowDisplay>,
    pub playing_step: Option<u8>, // advisory, mirrored from the scheduler
    pub playing: bool,
    pub audio_ready: bool,
    pub bpm: f64,
    pub selected_track: usize,
    pub selected_step: usize,
    pub display_text: String, // short status text for the lcd strip
}
