/// Converts byte counts reported by the transport into percent values.
///
/// Within one transfer attempt the reported values never decrease and stay
/// within `[0, 100]`. Start a new tracker for every attempt.
#[derive(Debug, Clone, Default)]
pub struct PercentTracker {
    last: Option<f64>,
}

impl PercentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a byte-count update.
    ///
    /// Returns the percent value to publish, or `None` when the total is
    /// unknown or zero.
    pub fn update(&mut self, sent: u64, total: Option<u64>) -> Option<f64> {
        let total = total.filter(|t| *t > 0)?;
        let percent = (sent as f64 / total as f64 * 100.0).clamp(0.0, 100.0);
        let percent = match self.last {
            Some(last) if last > percent => last,
            _ => percent,
        };
        self.last = Some(percent);
        Some(percent)
    }

    /// Marks the attempt as complete and returns exactly `100.0`.
    pub fn complete(&mut self) -> f64 {
        self.last = Some(100.0);
        100.0
    }

    /// Last published value, if any.
    pub fn last(&self) -> Option<f64> {
        self.last
    }
}
