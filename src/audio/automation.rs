// time-stamped parameter curves on the absolute audio clock. Before the first
// point the curve sits at its initial value, a `Set` jumps, a `Linear` or
// `Exponential` point ramps from the previous point, and the last value holds.
// An exponential segment without two positive endpoints holds its start value.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ramp {
    Set,
    Linear,
    Exponential,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutomationPoint {
    pub time: f64,
    pub value: f64,
    pub ramp: Ramp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Automation {
    default: f64,
    points: Vec<AutomationPoint>,
}

impl Automation {
    pub fn new(default: f64) -> Self {
        Self { default, points: Vec::with_capacity(8) }
    }

    pub fn set_value_at(&mut self, time: f64, value: f64) -> &mut Self {
        self.insert(AutomationPoint { time, value, ramp: Ramp::Set })
    }

    pub fn linear_ramp_to(&mut self, time: f64, value: f64) -> &mut Self {
        self.insert(AutomationPoint { time, value, ramp: Ramp::Linear })
    }

    pub fn exponential_ramp_to(&mut self, time: f64, value: f64) -> &mut Self {
        self.insert(AutomationPoint { time, value, ramp: Ramp::Exponential })
    }

    // keep points sorted; equal times keep insertion order
    fn insert(&mut self, point: AutomationPoint) -> &mut Self {
        let at = self.points.partition_point(|p| p.time <= point.time);
        self.points.insert(at, point);
        self
    }

    #[cfg(test)]
    pub(crate) fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    // value at the first scheduled point, what the voice starts at
    #[cfg(test)]
    pub(crate) fn initial_value(&self) -> f64 {
        self.points.first().map_or(self.default, |p| p.value)
    }

    pub fn value_at(&self, time: f64) -> f64 {
        // number of points at or before `time`
        let idx = self.points.partition_point(|p| p.time <= time);
        let Some(next) = self.points.get(idx) else {
            return self.points.last().map_or(self.default, |p| p.value);
        };
        let Some(prev) = idx.checked_sub(1).map(|i| self.points[i]) else {
            // nothing to ramp from yet
            return self.default;
        };

        match next.ramp {
            Ramp::Set => prev.value,
            Ramp::Linear => {
                let frac = (time - prev.time) / (next.time - prev.time);
                prev.value + (next.value - prev.value) * frac
            }
            Ramp::Exponential => {
                if prev.value <= 0.0 || next.value <= 0.0 {
                    return prev.value;
                }
                let frac = (time - prev.time) / (next.time - prev.time);
                prev.value * (next.value / prev.value).powf(frac)
            }
        }
    }
}
