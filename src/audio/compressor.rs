// master bus dynamics: soft-knee feed-forward compressor, so four voices landing
// on the same step don't clip the output

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressorSettings {
    pub threshold_db: f32,
    pub knee_db: f32,
    pub ratio: f32,
    pub attack_secs: f32,
    pub release_secs: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            knee_db: 30.0,
            ratio: 12.0,
            attack_secs: 0.003,
            release_secs: 0.25,
        }
    }
}

pub struct Compressor {
    settings: CompressorSettings,
    attack_coeff: f32,
    release_coeff: f32,
    reduction_db: f32, // smoothed, always <= 0
}

impl Compressor {
    pub fn new(settings: CompressorSettings, sample_rate: f32) -> Self {
        Self {
            settings,
            attack_coeff: smoothing_coeff(settings.attack_secs, sample_rate),
            release_coeff: smoothing_coeff(settings.release_secs, sample_rate),
            reduction_db: 0.0,
        }
    }

    // static curve: how many dB to take off a signal at `level_db`.
    pub fn gain_reduction_db(&self, level_db: f32) -> f32 {
        let CompressorSettings { threshold_db, knee_db, ratio, .. } = self.settings;
        let over = level_db - threshold_db;
        let slope = 1.0 / ratio - 1.0;

        if knee_db > 0.0 && 2.0 * over.abs() <= knee_db {
            let x = over + knee_db / 2.0;
            slope * x * x / (2.0 * knee_db)
        } else if over > 0.0 {
            slope * over
        } else {
            0.0
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let level_db = 20.0 * input.abs().max(1e-6).log10();
        let target = self.gain_reduction_db(level_db);

        // more reduction wanted = attack, less = release
        let coeff = if target < self.reduction_db { self.attack_coeff } else { self.release_coeff };
        self.reduction_db = coeff * self.reduction_db + (1.0 - coeff) * target;

        input * 10.0_f32.powf(self.reduction_db / 20.0)
    }

    #[cfg(test)]
    fn current_reduction_db(&self) -> f32 {
        self.reduction_db
    }
}

fn smoothing_coeff(secs: f32, sample_rate: f32) -> f32 {
    (-1.0 / (secs.max(1e-5) * sample_rate)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_signal_untouched() {
        let comp = Compressor::new(CompressorSettings::default(), 48_000.0);
        assert_eq!(comp.gain_reduction_db(-60.0), 0.0);
        assert_eq!(comp.gain_reduction_db(-40.0), 0.0);
    }

    #[test]
    fn test_curve_above_knee_follows_ratio() {
        let comp = Compressor::new(CompressorSettings::default(), 48_000.0);
        // 24 dB over threshold, outside the 15 dB half-knee
        let reduction = comp.gain_reduction_db(0.0);
        assert!((reduction - (24.0 / 12.0 - 24.0)).abs() < 1e-4);
    }

    #[test]
    fn test_knee_is_continuous() {
        let comp = Compressor::new(CompressorSettings::default(), 48_000.0);
        let edge_low = -24.0 - 15.0;
        let edge_high = -24.0 + 15.0;
        assert!(comp.gain_reduction_db(edge_low + 1e-3).abs() < 1e-3);
        let above = comp.gain_reduction_db(edge_high + 1e-3);
        let inside = comp.gain_reduction_db(edge_high - 1e-3);
        assert!((above - inside).abs() < 1e-2);
    }

    #[test]
    fn test_loud_signal_is_pulled_down() {
        let mut comp = Compressor::new(CompressorSettings::default(), 48_000.0);
        let mut out = 0.0;
        for _ in 0..4_800 {
            out = comp.process(1.0);
        }
        assert!(out < 0.5, "got {out}");
        assert!(comp.current_reduction_db() < -6.0);
    }

    #[test]
    fn test_release_recovers() {
        let mut comp = Compressor::new(CompressorSettings::default(), 48_000.0);
        for _ in 0..4_800 {
            comp.process(1.0);
        }
        for _ in 0..96_000 {
            comp.process(0.0);
        }
        assert!(comp.current_reduction_db() > -0.1);
    }
}
