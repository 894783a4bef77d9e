use std::f32::consts::{FRAC_1_SQRT_2, PI};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterSpec {
    HighPass { cutoff: f32 },
    BandPass { center: f32, q: f32 },
}

// RBJ cookbook biquad, transposed direct form II
#[derive(Clone, Copy, Debug)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    z1: f32,
    z2: f32,
}

impl Biquad {
    pub fn new(spec: FilterSpec, sample_rate: f32) -> Self {
        match spec {
            FilterSpec::HighPass { cutoff } => Self::high_pass(sample_rate, cutoff, FRAC_1_SQRT_2),
            FilterSpec::BandPass { center, q } => Self::band_pass(sample_rate, center, q),
        }
    }

    pub fn high_pass(sample_rate: f32, cutoff: f32, q: f32) -> Self {
        let (cos_w0, alpha) = Self::prewarp(sample_rate, cutoff, q);
        let b0 = (1.0 + cos_w0) / 2.0;
        let b1 = -(1.0 + cos_w0);
        let b2 = (1.0 + cos_w0) / 2.0;
        Self::normalized(b0, b1, b2, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
    }

    // constant 0 dB peak gain
    pub fn band_pass(sample_rate: f32, center: f32, q: f32) -> Self {
        let (cos_w0, alpha) = Self::prewarp(sample_rate, center, q);
        Self::normalized(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w0, 1.0 - alpha)
    }

    fn prewarp(sample_rate: f32, freq: f32, q: f32) -> (f32, f32) {
        let w0 = 2.0 * PI * (freq / sample_rate).clamp(0.0, 0.49);
        let alpha = w0.sin() / (2.0 * q.max(0.1));
        (w0.cos(), alpha)
    }

    fn normalized(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            z1: 0.0,
            z2: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.z1;
        self.z1 = self.b1 * x - self.a1 * y + self.z2;
        self.z2 = self.b2 * x - self.a2 * y;
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    // steady-state peak amplitude of a sine run through the filter
    fn response(mut filter: Biquad, freq: f32) -> f32 {
        let mut peak = 0.0f32;
        for n in 0..(SR as usize / 2) {
            let x = (2.0 * PI * freq * n as f32 / SR).sin();
            let y = filter.process(x);
            if n > SR as usize / 4 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn test_high_pass_blocks_lows() {
        let hp = Biquad::new(FilterSpec::HighPass { cutoff: 7000.0 }, SR);
        assert!(response(hp, 200.0) < 0.01);
        assert!(response(hp, 15_000.0) > 0.8);
    }

    #[test]
    fn test_high_pass_blocks_dc() {
        let mut hp = Biquad::new(FilterSpec::HighPass { cutoff: 1000.0 }, SR);
        let mut last = 1.0;
        for _ in 0..10_000 {
            last = hp.process(1.0);
        }
        assert!(last.abs() < 1e-3);
    }

    #[test]
    fn test_band_pass_peaks_at_center() {
        let spec = FilterSpec::BandPass { center: 1500.0, q: 1.0 };
        let at_center = response(Biquad::new(spec, SR), 1500.0);
        assert!((at_center - 1.0).abs() < 0.05);
        assert!(response(Biquad::new(spec, SR), 100.0) < 0.2);
        assert!(response(Biquad::new(spec, SR), 15_000.0) < 0.2);
    }
}
