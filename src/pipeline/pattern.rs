// the pattern data: a fixed set of tracks, 16 steps each, plus the tempo.
//
// "pattern": the whole grid, one track per instrument, in display order.
// "track": one instrument row; which steps fire, whether it's muted, how loud.
// "step": a 16th-note slot in the bar.

use crate::shared::{DEFAULT_BPM, InstrumentKind, MAX_BPM, MIN_BPM, STEPS_PER_BAR};

/// Tempo in beats per minute, always inside [`MIN_BPM`, `MAX_BPM`].
///
/// Construction clamps, so a zero, negative or NaN tempo can never reach the
/// scheduler's step arithmetic.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct Tempo(f64);

impl Tempo {
    pub fn new(bpm: f64) -> Self {
        if !bpm.is_finite() {
            return Self::default();
        }
        Self(bpm.clamp(MIN_BPM, MAX_BPM))
    }

    pub fn bpm(self) -> f64 {
        self.0
    }

    // duration of one 16th note: 60 / bpm / 4.
    pub fn seconds_per_step(self) -> f64 {
        15.0 / self.0
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self(DEFAULT_BPM)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    kind: InstrumentKind, // fixed for the life of the track
    steps: [bool; STEPS_PER_BAR],
    muted: bool,
    velocity: f32, // 0.0 to 1.0
}

impl Track {
    pub fn new(kind: InstrumentKind, velocity: f32) -> Self {
        Self {
            kind,
            steps: [false; STEPS_PER_BAR],
            muted: false,
            velocity: clamp_velocity(velocity),
        }
    }

    // builder for the preset patterns
    pub fn with_steps(mut self, active: impl Fn(usize) -> bool) -> Self {
        self.steps = std::array::from_fn(active);
        self
    }

    pub fn kind(&self) -> InstrumentKind { self.kind }
    pub fn steps(&self) -> &[bool; STEPS_PER_BAR] { &self.steps }
    pub fn is_muted(&self) -> bool { self.muted }
    pub fn velocity(&self) -> f32 { self.velocity }

    // whether this track sounds on `step`: the cell is on and the track isn't muted.
    pub fn fires_on(&self, step: usize) -> bool {
        !self.muted && self.steps.get(step).copied().unwrap_or(false)
    }

    pub(crate) fn set_step(&mut self, step: usize, active: bool) -> bool {
        match self.steps.get_mut(step) {
            Some(cell) => {
                *cell = active;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub(crate) fn set_velocity(&mut self, velocity: f32) {
        self.velocity = clamp_velocity(velocity);
    }

    pub(crate) fn clear(&mut self) {
        self.steps = [false; STEPS_PER_BAR];
    }
}

fn clamp_velocity(velocity: f32) -> f32 {
    if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) }
}

// ordered tracks; the count is fixed once the pattern exists.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    tracks: Vec<Track>,
}

impl Pattern {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    // the stock kit: four on the floor, backbeat snare, 8th hats, one clap
    pub fn default_kit() -> Self {
        Self::new(vec![
            Track::new(InstrumentKind::Kick, 0.8).with_steps(|i| i % 4 == 0),
            Track::new(InstrumentKind::Snare, 0.7).with_steps(|i| i % 8 == 4),
            Track::new(InstrumentKind::HiHat, 0.6).with_steps(|i| i % 2 == 0),
            Track::new(InstrumentKind::Clap, 0.6).with_steps(|i| i == 12),
        ])
    }

    // same kit, nothing programmed
    #[cfg(test)]
    pub(crate) fn empty_kit() -> Self {
        Self::new(InstrumentKind::ALL.iter().map(|&kind| Track::new(kind, 0.8)).collect())
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub(crate) fn track_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::default_kit()
    }
}

// what the scheduler reads on each tick: the grid plus the tempo, frozen.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub pattern: Pattern,
    pub tempo: Tempo,
}
