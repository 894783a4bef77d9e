use crate::pipeline::{Snapshot, Tempo};
use crate::shared::{InstrumentKind, STEPS_PER_BAR};

// one hit for the synth: what, when (audio clock seconds), how loud.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VoiceInvocation {
    pub kind: InstrumentKind,
    pub time: f64,
    pub velocity: f32,
}

// where the scheduler pushes what a tick produces
pub trait StepSink {
    // called once per step, before that step's voices.
    fn step_scheduled(&mut self, _step: usize, _time: f64) {}

    fn voice(&mut self, invocation: VoiceInvocation);
}

// the scheduler's position: when the next unscheduled step is due, and which
// step that is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    next_event_time: f64,
    next_step: usize,
}

impl Cursor {
    pub fn starting_at(now: f64, offset: f64) -> Self {
        Self { next_event_time: now + offset, next_step: 0 }
    }

    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    pub fn next_step(&self) -> usize {
        self.next_step
    }

    pub fn advance(&mut self, tempo: Tempo) {
        self.next_event_time += tempo.seconds_per_step();
        self.next_step = (self.next_step + 1) % STEPS_PER_BAR;
    }

    /// One wake-up: schedule every step due before `now + schedule_ahead`.
    ///
    /// Voices of the same step go out in track order and share a time. An
    /// empty or fully muted pattern still moves the cursor. Returns how many
    /// steps were scheduled.
    pub fn tick(&mut self, now: f64, schedule_ahead: f64, snapshot: &Snapshot, sink: &mut impl StepSink) -> usize {
        let horizon = now + schedule_ahead;
        let mut scheduled = 0;

        while self.next_event_time < horizon {
            let (step, time) = (self.next_step, self.next_event_time);
            sink.step_scheduled(step, time);

            for track in snapshot.pattern.tracks().iter().filter(|t| t.fires_on(step)) {
                sink.voice(VoiceInvocation { kind: track.kind(), time, velocity: track.velocity() });
            }

            self.advance(snapshot.tempo);
            scheduled += 1;
        }

        scheduled
    }
}
