// holds the pattern + tempo behind an Arc'd snapshot so the ui can edit while the
// scheduler is playing. Every edit clones the snapshot (only if a tick is still
// holding the old one), changes it, and swaps it in, so a tick always sees
// whole tracks and never a half-written one.

use std::sync::{Arc, PoisonError, RwLock};

use super::pattern::{Pattern, Snapshot, Tempo};

#[derive(Clone, Default)]
pub struct PatternStore {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl PatternStore {
    pub fn new(pattern: Pattern, tempo: Tempo) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(Snapshot { pattern, tempo }))),
        }
    }

    // the current immutable view. Cheap: one Arc clone under a read lock.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    fn update<R>(&self, edit: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        edit(Arc::make_mut(&mut guard))
    }

    // flip one cell; returns the new value, or `None` for a bad index.
    pub fn toggle_step(&self, track: usize, step: usize) -> Option<bool> {
        let result = self.update(|snap| {
            let t = snap.pattern.track_mut(track)?;
            let next = !*t.steps().get(step)?;
            t.set_step(step, next);
            Some(next)
        });
        if result.is_none() {
            log::warn!(target: "store", "ignoring toggle of track {track} step {step}: out of range");
        }
        result
    }

    pub fn set_step(&self, track: usize, step: usize, active: bool) -> bool {
        let accepted = self.update(|snap| {
            snap.pattern
                .track_mut(track)
                .is_some_and(|t| t.set_step(step, active))
        });
        if !accepted {
            log::warn!(target: "store", "ignoring write to track {track} step {step}: out of range");
        }
        accepted
    }

    pub fn toggle_mute(&self, track: usize) -> Option<bool> {
        let result = self.update(|snap| {
            let t = snap.pattern.track_mut(track)?;
            let muted = !t.is_muted();
            t.set_muted(muted);
            Some(muted)
        });
        if result.is_none() {
            log::warn!(target: "store", "ignoring mute of track {track}: out of range");
        }
        result
    }

    // returns the velocity actually stored (after clamping to [0, 1]).
    pub fn set_velocity(&self, track: usize, velocity: f32) -> Option<f32> {
        self.update(|snap| {
            let t = snap.pattern.track_mut(track)?;
            t.set_velocity(velocity);
            Some(t.velocity())
        })
    }

    pub fn nudge_velocity(&self, track: usize, delta: f32) -> Option<f32> {
        self.update(|snap| {
            let t = snap.pattern.track_mut(track)?;
            t.set_velocity(t.velocity() + delta);
            Some(t.velocity())
        })
    }

    // returns the tempo actually stored (after clamping).
    pub fn set_tempo(&self, bpm: f64) -> Tempo {
        let tempo = Tempo::new(bpm);
        if tempo.bpm() != bpm {
            log::debug!(target: "store", "tempo {bpm} clamped to {}", tempo.bpm());
        }
        self.update(|snap| snap.tempo = tempo);
        tempo
    }

    pub fn nudge_tempo(&self, delta: f64) -> Tempo {
        self.update(|snap| {
            snap.tempo = Tempo::new(snap.tempo.bpm() + delta);
            snap.tempo
        })
    }

    // wipe every step, keep mutes and velocities
    pub fn clear(&self) {
        self.update(|snap| {
            for i in 0..snap.pattern.len() {
                if let Some(t) = snap.pattern.track_mut(i) {
                    t.clear();
                }
            }
        });
    }
}
