/// Compensated (Neumaier) summation. Large sums of squares are
/// formed with an error term so that small contributions are not lost.
#[derive(Debug, Default, Clone, Copy)]
pub struct Accumulator {
    sum: f64,
    compensation: f64,
    count: u64,
}

impl Accumulator {
    /// Builds new [Accumulator]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push new value into [Accumulator]
    pub fn add(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
        self.count += 1;
    }

    /// Compensated sum
    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }

    /// Number of contributions
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean of the contributions
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.value() / self.count as f64
        }
    }
}

/// Population mean and standard deviation, computed with compensated sums
pub(crate) fn mean_std<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> (f64, f64) {
    let values = values.into_iter().copied().collect::<Vec<_>>();
    if values.is_empty() {
        return (0.0, 0.0);
    }

    let mut sum = Accumulator::new();
    for x in values.iter() {
        sum.add(*x);
    }
    let mean = sum.mean();

    let mut var = Accumulator::new();
    for x in values.iter() {
        var.add((x - mean).powi(2));
    }

    (mean, var.mean().sqrt())
}
