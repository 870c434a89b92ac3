/// Exponentially weighted moving average over a stream of samples.
///
/// Each new sample contributes `alpha` of its value; the running average
/// keeps `1 - alpha` of its previous value. Empty until the first sample.
///
/// ```rust
/// use skbhook::hooks::stats::util::ewma::Ewma;
///
/// let mut avg = Ewma::new(0.5);
/// avg.update(2.0);
/// avg.update(4.0);
/// assert_eq!(avg.get(), Some(3.0));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Ewma {
    alpha: f64,
    value: Option<f64>,
}

impl Ewma {
    /// Creates an empty average.
    ///
    /// # Panics
    ///
    /// Panics unless `0 < alpha <= 1`.
    pub fn new(alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha <= 1.0,
            "EWMA alpha must be in (0, 1], got {alpha}"
        );
        Self { alpha, value: None }
    }

    /// Folds `sample` into the average and returns the new value.
    pub fn update(&mut self, sample: f64) -> f64 {
        let next = match self.value {
            Some(current) => current.mul_add(1.0 - self.alpha, sample * self.alpha),
            None => sample,
        };
        self.value = Some(next);
        next
    }

    pub fn get(&self) -> Option<f64> {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_sample_seeds_average() {
        let mut avg = Ewma::new(0.25);
        assert_eq!(avg.get(), None);
        assert_eq!(avg.update(8.0), 8.0);
    }

    #[test]
    fn test_weighting() {
        let mut avg = Ewma::new(0.25);
        avg.update(8.0);
        // 0.75 * 8 + 0.25 * 0
        assert_eq!(avg.update(0.0), 6.0);
    }

    #[test]
    #[should_panic]
    fn test_rejects_zero_alpha() {
        Ewma::new(0.0);
    }

    #[test]
    fn test_reset_keeps_alpha() {
        let mut avg = Ewma::new(0.5);
        avg.update(1.0);
        avg.reset();
        assert_eq!(avg.get(), None);
        avg.update(2.0);
        assert_eq!(avg.update(4.0), 3.0);
    }
}
