// The four drum voices. Each one is a pure function of (time, velocity) that
// lays out oscillators / noise, filters and envelopes on the absolute clock;
// nothing here touches the audio device.

use rand::Rng;

use crate::audio::{Automation, FilterSpec, Layer, VoiceGraph, Waveform};
use crate::shared::InstrumentKind;

// exponential ramps can't hit 0, so every "decay to silence" lands here.
pub const RAMP_FLOOR: f64 = 0.001;

// every noise voice gets at least this much fresh noise.
pub const NOISE_SECONDS: f64 = 0.5;

const KICK_START_HZ: f64 = 150.0;
const KICK_DECAY: f64 = 0.5;

const SNARE_TONE_HZ: f64 = 300.0;
const SNARE_TONE_DECAY: f64 = 0.1;
const SNARE_NOISE_DECAY: f64 = 0.2;
const SNARE_HIGH_PASS_HZ: f32 = 1000.0;

const HAT_HIGH_PASS_HZ: f32 = 7000.0;
const HAT_DECAY: f64 = 0.05;

const CLAP_CENTER_HZ: f32 = 1500.0;
const CLAP_Q: f32 = 1.0;
const CLAP_TAIL: f64 = 0.3;

pub fn build<R: Rng + ?Sized>(
    kind: InstrumentKind,
    time: f64,
    velocity: f64,
    sample_rate: u32,
    rng: &mut R,
) -> VoiceGraph {
    match kind {
        InstrumentKind::Kick => kick(time, velocity),
        InstrumentKind::Snare => snare(time, velocity, noise_buffer(sample_rate, rng)),
        InstrumentKind::HiHat => hi_hat(time, velocity, noise_buffer(sample_rate, rng)),
        InstrumentKind::Clap => clap(time, velocity, noise_buffer(sample_rate, rng)),
    }
}

// uniform white noise in [-1, 1), fresh for every hit so nothing audibly loops.
pub fn noise_buffer<R: Rng + ?Sized>(sample_rate: u32, rng: &mut R) -> Vec<f32> {
    let len = (sample_rate as f64 * NOISE_SECONDS).ceil() as usize;
    (0..len).map(|_| rng.random_range(-1.0..1.0)).collect()
}

// gain that starts at `peak` on `time` and falls exponentially to the floor
fn decay(time: f64, peak: f64, length: f64) -> Automation {
    let mut gain = Automation::new(1.0);
    gain.set_value_at(time, peak).exponential_ramp_to(time + length, RAMP_FLOOR);
    gain
}

// sine with a pitch drop
pub fn kick(time: f64, velocity: f64) -> VoiceGraph {
    let mut frequency = Automation::new(440.0);
    frequency
        .set_value_at(time, KICK_START_HZ)
        .exponential_ramp_to(time + KICK_DECAY, RAMP_FLOOR);

    let gain = decay(time, velocity, KICK_DECAY);
    let body = Layer::oscillator(Waveform::Sine, frequency, gain, time, time + KICK_DECAY);
    VoiceGraph::new(InstrumentKind::Kick, vec![body])
}

// short triangle tone plus high-passed noise
pub fn snare(time: f64, velocity: f64, noise: Vec<f32>) -> VoiceGraph {
    let mut pitch = Automation::new(440.0);
    pitch.set_value_at(time, SNARE_TONE_HZ);
    let tone = Layer::oscillator(
        Waveform::Triangle,
        pitch,
        decay(time, 0.5 * velocity, SNARE_TONE_DECAY),
        time,
        time + SNARE_TONE_DECAY,
    );

    let rattle = Layer::noise(
        noise,
        FilterSpec::HighPass { cutoff: SNARE_HIGH_PASS_HZ },
        decay(time, velocity, SNARE_NOISE_DECAY),
        time,
        time + SNARE_NOISE_DECAY,
    );

    VoiceGraph::new(InstrumentKind::Snare, vec![tone, rattle])
}

pub fn hi_hat(time: f64, velocity: f64, noise: Vec<f32>) -> VoiceGraph {
    let sizzle = Layer::noise(
        noise,
        FilterSpec::HighPass { cutoff: HAT_HIGH_PASS_HZ },
        decay(time, 0.7 * velocity, HAT_DECAY),
        time,
        time + HAT_DECAY,
    );
    VoiceGraph::new(InstrumentKind::HiHat, vec![sizzle])
}

// band-passed noise with three quick re-strikes, like several hands at once
pub fn clap(time: f64, velocity: f64, noise: Vec<f32>) -> VoiceGraph {
    let dip = (0.1 * velocity).max(RAMP_FLOOR);
    let mut gain = Automation::new(1.0);
    gain.set_value_at(time, 0.0)
        .linear_ramp_to(time + 0.010, velocity)
        .exponential_ramp_to(time + 0.040, dip)
        .linear_ramp_to(time + 0.050, velocity)
        .exponential_ramp_to(time + 0.080, dip)
        .linear_ramp_to(time + 0.090, velocity)
        .exponential_ramp_to(time + CLAP_TAIL, RAMP_FLOOR);

    let burst = Layer::noise(
        noise,
        FilterSpec::BandPass { center: CLAP_CENTER_HZ, q: CLAP_Q },
        gain,
        time,
        time + CLAP_TAIL,
    );
    VoiceGraph::new(InstrumentKind::Clap, vec![burst])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Source;
    use crate::audio::automation::Ramp;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SR: u32 = 48_000;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn frequency(layer: &Layer) -> &Automation {
        match &layer.source {
            Source::Oscillator { frequency, .. } => frequency,
            Source::Noise(_) => panic!("expected an oscillator"),
        }
    }

    #[test]
    fn test_kick_gain_starts_at_velocity() {
        for v in [0.1, 0.5, 0.8, 1.0] {
            let graph = kick(2.0, v);
            let gain = &graph.layers[0].gain;
            assert_eq!(gain.initial_value(), v);
            assert_eq!(gain.value_at(2.0), v);
            assert!(close(gain.value_at(2.5), RAMP_FLOOR));
        }
    }

    #[test]
    fn test_kick_pitch_ignores_velocity() {
        let soft = kick(1.0, 0.2);
        let hard = kick(1.0, 1.0);
        assert_eq!(frequency(&soft.layers[0]), frequency(&hard.layers[0]));

        let f = frequency(&soft.layers[0]);
        assert_eq!(f.value_at(1.0), 150.0);
        assert!(f.value_at(1.25) < 150.0);
        assert!(close(f.value_at(1.5), RAMP_FLOOR));
        assert_eq!(soft.layers[0].stop, 1.5);
    }

    #[test]
    fn test_snare_layers() {
        let graph = build(InstrumentKind::Snare, 0.5, 0.8, SR, &mut rng());
        assert_eq!(graph.kind, InstrumentKind::Snare);
        assert_eq!(graph.layers.len(), 2);

        let tone = &graph.layers[0];
        assert!(matches!(tone.source, Source::Oscillator { waveform: Waveform::Triangle, .. }));
        assert_eq!(frequency(tone).value_at(0.55), 300.0);
        assert!(close(tone.gain.initial_value(), 0.4));
        assert!(close(tone.stop, 0.6));

        let rattle = &graph.layers[1];
        assert_eq!(rattle.filter, Some(FilterSpec::HighPass { cutoff: 1000.0 }));
        assert!(close(rattle.gain.initial_value(), 0.8));
        assert!(close(rattle.stop, 0.7));
    }

    #[test]
    fn test_hi_hat_is_short_and_bright() {
        let graph = build(InstrumentKind::HiHat, 1.0, 1.0, SR, &mut rng());
        let layer = &graph.layers[0];
        assert_eq!(layer.filter, Some(FilterSpec::HighPass { cutoff: 7000.0 }));
        assert!(close(layer.gain.initial_value(), 0.7));
        assert!(close(layer.stop - layer.start, 0.05));
    }

    #[test]
    fn test_clap_envelope_bursts() {
        let graph = build(InstrumentKind::Clap, 0.0, 1.0, SR, &mut rng());
        let layer = &graph.layers[0];
        assert_eq!(layer.filter, Some(FilterSpec::BandPass { center: 1500.0, q: 1.0 }));

        let g = &layer.gain;
        assert_eq!(g.value_at(0.0), 0.0);
        assert!(close(g.value_at(0.010), 1.0));
        assert!(close(g.value_at(0.040), 0.1));
        assert!(close(g.value_at(0.050), 1.0));
        assert!(close(g.value_at(0.080), 0.1));
        assert!(close(g.value_at(0.090), 1.0));
        assert!(close(g.value_at(0.300), RAMP_FLOOR));
        // still decaying, not flat, between strikes
        assert!(g.value_at(0.025) < 1.0 && g.value_at(0.025) > 0.1);
        assert!(close(layer.stop, 0.3));
    }

    #[test]
    fn test_clap_dips_scale_with_velocity() {
        let graph = clap(0.0, 0.5, vec![]);
        assert!(close(graph.layers[0].gain.value_at(0.040), 0.05));
    }

    #[test]
    fn test_exponential_ramps_never_target_zero() {
        let mut r = rng();
        for kind in InstrumentKind::ALL {
            for v in [0.0, 0.3, 1.0] {
                let graph = build(kind, 1.0, v, SR, &mut r);
                for layer in &graph.layers {
                    let mut curves = vec![&layer.gain];
                    if let Source::Oscillator { frequency, .. } = &layer.source {
                        curves.push(frequency);
                    }
                    for curve in curves {
                        for p in curve.points().iter().filter(|p| p.ramp == Ramp::Exponential) {
                            assert!(p.value > 0.0, "{kind:?} ramps to {}", p.value);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_noise_is_fresh_and_long_enough() {
        let mut r = rng();
        let a = noise_buffer(SR, &mut r);
        let b = noise_buffer(SR, &mut r);
        assert!(a.len() >= SR as usize / 2);
        assert_ne!(a, b);
        assert!(a.iter().all(|s| (-1.0..1.0).contains(s)));
    }

    #[test]
    fn test_noise_voices_get_their_own_buffers() {
        let mut r = rng();
        let first = build(InstrumentKind::HiHat, 0.0, 1.0, SR, &mut r);
        let second = build(InstrumentKind::HiHat, 0.0, 1.0, SR, &mut r);
        let (Source::Noise(a), Source::Noise(b)) = (&first.layers[0].source, &second.layers[0].source) else {
            panic!("hi-hat should be noise");
        };
        assert_ne!(a, b);
    }

    #[test]
    fn test_all_times_relative_to_trigger() {
        let mut r = rng();
        for kind in InstrumentKind::ALL {
            let early = build(kind, 0.0, 1.0, SR, &mut r);
            let late = build(kind, 10.0, 1.0, SR, &mut r);
            assert!(close(late.start_time() - early.start_time(), 10.0));
            assert!(close(late.stop_time() - early.stop_time(), 10.0));
        }
    }
}
