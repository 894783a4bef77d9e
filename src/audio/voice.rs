use std::f64::consts::TAU;

use super::automation::Automation;
use super::filter::{Biquad, FilterSpec};
use crate::shared::InstrumentKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
}

impl Waveform {
    // phase in cycles, [0, 1)
    #[inline]
    fn sample(self, phase: f64) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin() as f32,
            Waveform::Triangle => {
                // starts at 0 and rises, like the sine
                let v = if phase < 0.25 {
                    4.0 * phase
                } else if phase < 0.75 {
                    2.0 - 4.0 * phase
                } else {
                    4.0 * phase - 4.0
                };
                v as f32
            }
        }
    }
}

#[derive(Clone, Debug)]
pub enum Source {
    Oscillator { waveform: Waveform, frequency: Automation },
    Noise(Vec<f32>), // played once from the start, never looped
}

// what the engine needs between blocks; filled in on the first rendered frame
#[derive(Clone, Copy, Debug, Default)]
struct LayerRuntime {
    primed: bool,
    phase: f64,
    filter: Option<Biquad>,
}

// one source → filter → gain chain, alive between `start` and `stop` on the audio clock.
#[derive(Clone, Debug)]
pub struct Layer {
    pub source: Source,
    pub filter: Option<FilterSpec>,
    pub gain: Automation,
    pub start: f64,
    pub stop: f64,
    runtime: LayerRuntime,
}

impl Layer {
    pub fn oscillator(waveform: Waveform, frequency: Automation, gain: Automation, start: f64, stop: f64) -> Self {
        Self::new(Source::Oscillator { waveform, frequency }, None, gain, start, stop)
    }

    pub fn noise(buffer: Vec<f32>, filter: FilterSpec, gain: Automation, start: f64, stop: f64) -> Self {
        Self::new(Source::Noise(buffer), Some(filter), gain, start, stop)
    }

    // a stop before the start is an empty layer, not a negative one
    fn new(source: Source, filter: Option<FilterSpec>, gain: Automation, start: f64, stop: f64) -> Self {
        Self { source, filter, gain, start, stop: stop.max(start), runtime: LayerRuntime::default() }
    }

    // mix this layer into `out`, whose first frame sits at `block_start` on
    // the audio clock. Returns false once the layer has played out.
    pub(crate) fn render_into(&mut self, out: &mut [f32], block_start: u64, sample_rate: f32) -> bool {
        let sr = sample_rate as f64;
        let start_frame = (self.start.max(0.0) * sr).round() as u64;
        let stop_frame = (self.stop.max(0.0) * sr).round() as u64;
        let block_end = block_start + out.len() as u64;

        if block_end <= start_frame {
            return true; // not started yet
        }
        if block_start >= stop_frame || stop_frame <= start_frame {
            return false;
        }

        if !self.runtime.primed {
            self.runtime.filter = self.filter.map(|spec| Biquad::new(spec, sample_rate));
            self.runtime.primed = true;
        }

        let first = start_frame.saturating_sub(block_start) as usize;
        let last = (stop_frame.min(block_end) - block_start) as usize;

        for (i, slot) in out[first..last].iter_mut().enumerate() {
            let frame = block_start + (first + i) as u64;
            let t = frame as f64 / sr;

            let raw = match &self.source {
                Source::Oscillator { waveform, frequency } => {
                    let s = waveform.sample(self.runtime.phase);
                    self.runtime.phase = (self.runtime.phase + frequency.value_at(t) / sr).fract();
                    s
                }
                Source::Noise(buffer) => {
                    let idx = (frame - start_frame) as usize;
                    buffer.get(idx).copied().unwrap_or(0.0)
                }
            };

            let shaped = match self.runtime.filter.as_mut() {
                Some(f) => f.process(raw),
                None => raw,
            };
            *slot += shaped * self.gain.value_at(t) as f32;
        }

        block_end < stop_frame
    }
}

// everything one trigger produces: a handful of layers summed onto the bus.
#[derive(Clone, Debug)]
pub struct VoiceGraph {
    pub kind: InstrumentKind,
    pub layers: Vec<Layer>,
}

impl VoiceGraph {
    pub fn new(kind: InstrumentKind, layers: Vec<Layer>) -> Self {
        Self { kind, layers }
    }

    pub fn start_time(&self) -> f64 {
        self.layers.iter().map(|l| l.start).fold(f64::INFINITY, f64::min)
    }

    #[cfg(test)]
    pub(crate) fn stop_time(&self) -> f64 {
        self.layers.iter().map(|l| l.stop).fold(0.0, f64::max)
    }

    // returns false when every layer has finished
    pub(crate) fn render_into(&mut self, out: &mut [f32], block_start: u64, sample_rate: f32) -> bool {
        let mut alive = false;
        for layer in &mut self.layers {
            alive |= layer.render_into(out, block_start, sample_rate);
        }
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 1000.0;

    fn flat(value: f64) -> Automation {
        Automation::new(value)
    }

    #[test]
    fn test_layer_starts_on_its_frame() {
        let mut layer = Layer::noise(vec![1.0; 100], FilterSpec::HighPass { cutoff: 1.0 }, flat(1.0), 0.010, 0.050);
        layer.filter = None;
        let mut out = [0.0f32; 64];
        let alive = layer.render_into(&mut out, 0, SR);
        assert!(!alive); // stop frame 50 falls inside this block
        assert!(out[..10].iter().all(|s| *s == 0.0));
        assert!(out[10..50].iter().all(|s| *s == 1.0));
        assert!(out[50..].iter().all(|s| *s == 0.0));

        // next block is past the stop frame
        let mut next = [0.0f32; 64];
        assert!(!layer.render_into(&mut next, 64, SR));
        assert!(next.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_inverted_layer_is_silent() {
        let mut layer = Layer::oscillator(Waveform::Sine, flat(100.0), flat(1.0), 0.030, 0.010);
        assert_eq!(layer.stop, 0.030);
        let mut out = [0.0f32; 64];
        assert!(!layer.render_into(&mut out, 0, SR));
        assert!(out.iter().all(|s| *s == 0.0));

        // fields are public; an inversion made after construction is just as harmless
        let mut layer = Layer::noise(vec![1.0; 64], FilterSpec::HighPass { cutoff: 1.0 }, flat(1.0), 0.0, 0.064);
        layer.start = 0.040;
        layer.stop = 0.020;
        let mut out = [0.0f32; 64];
        assert!(!layer.render_into(&mut out, 0, SR));
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_layer_spanning_blocks() {
        let buffer: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let mut layer = Layer::noise(buffer, FilterSpec::HighPass { cutoff: 1.0 }, flat(1.0), 0.030, 0.090);
        layer.filter = None;

        let mut a = [0.0f32; 40];
        assert!(layer.render_into(&mut a, 0, SR));
        assert_eq!(a[30], 0.0);
        assert_eq!(a[39], 9.0);

        let mut b = [0.0f32; 40];
        assert!(layer.render_into(&mut b, 40, SR));
        assert_eq!(b[0], 10.0); // noise buffer picks up where it left off
        assert_eq!(b[39], 49.0);

        let mut c = [0.0f32; 40];
        assert!(!layer.render_into(&mut c, 80, SR));
        assert_eq!(c[9], 59.0);
        assert!(c[10..].iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_mixes_additively() {
        let mut out = [0.5f32; 8];
        let mut graph = VoiceGraph::new(
            InstrumentKind::Clap,
            vec![
                Layer { filter: None, ..Layer::noise(vec![0.25; 8], FilterSpec::HighPass { cutoff: 1.0 }, flat(1.0), 0.0, 0.008) },
                Layer { filter: None, ..Layer::noise(vec![0.25; 8], FilterSpec::HighPass { cutoff: 1.0 }, flat(2.0), 0.0, 0.008) },
            ],
        );
        assert!(!graph.render_into(&mut out, 0, SR));
        assert!(out.iter().all(|s| (*s - 1.25).abs() < 1e-6));
    }

    #[test]
    fn test_oscillator_follows_frequency_curve() {
        // 250 Hz at 1 kHz: quarter cycle per sample
        let mut layer = Layer::oscillator(Waveform::Triangle, flat(250.0), flat(1.0), 0.0, 1.0);
        let mut out = [0.0f32; 4];
        layer.render_into(&mut out, 0, SR);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert!((out[2] - 0.0).abs() < 1e-6);
        assert!((out[3] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_graph_bounds() {
        let graph = VoiceGraph::new(
            InstrumentKind::Snare,
            vec![
                Layer::oscillator(Waveform::Sine, flat(300.0), flat(1.0), 1.0, 1.1),
                Layer::noise(vec![], FilterSpec::HighPass { cutoff: 1000.0 }, flat(1.0), 1.0, 1.2),
            ],
        );
        assert_eq!(graph.start_time(), 1.0);
        assert_eq!(graph.stop_time(), 1.2);
    }
}
