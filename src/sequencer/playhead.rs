use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

const HISTORY: usize = 32; // two bars is plenty for a 100 ms look-ahead

// Steps get scheduled ahead of when they sound, so the step the scheduler is
// working on is not the step you hear. This remembers (time, step) for recent
// steps and answers "what's sounding at time t" for the display.
#[derive(Default)]
pub struct Playhead {
    recent: Mutex<VecDeque<(f64, usize)>>,
}

impl Playhead {
    pub fn new() -> Self {
        Self { recent: Mutex::new(VecDeque::with_capacity(HISTORY + 1)) }
    }

    pub fn record(&self, step: usize, time: f64) {
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.push_back((time, step));
        if recent.len() > HISTORY {
            recent.pop_front();
        }
    }

    pub fn reset(&self) {
        self.recent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    // latest step whose time has come, or `None` if nothing has sounded yet.
    pub fn current_step(&self, now: f64) -> Option<usize> {
        let recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.iter().rev().find(|(time, _)| *time <= now).map(|&(_, step)| step)
    }
}
