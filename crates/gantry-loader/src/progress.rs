/// Snapshot of how far a bundle fetch has come.
///
/// Emitted repeatedly during a development-mode fetch; ephemeral and never
/// retained. `total` is absent when the server did not announce a length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingProgress {
    pub done: u64,
    pub total: Option<u64>,
    pub status: Option<String>,
}

impl LoadingProgress {
    pub fn new(done: u64, total: Option<u64>) -> Self {
        Self {
            done,
            total,
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Completion as a fraction in `0.0..=1.0`, when the total is known.
    pub fn fraction(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some(self.done as f64 / total as f64),
            None => None,
        }
    }

    /// True once every announced byte has arrived.
    pub fn is_complete(&self) -> bool {
        self.total.is_some_and(|total| self.done >= total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_with_known_total() {
        let p = LoadingProgress::new(40, Some(100));
        assert_eq!(p.fraction(), Some(0.4));
        assert!(!p.is_complete());
    }

    #[test]
    fn fraction_without_total() {
        let p = LoadingProgress::new(512, None);
        assert_eq!(p.fraction(), None);
        assert!(!p.is_complete());
    }

    #[test]
    fn zero_total_counts_as_complete() {
        let p = LoadingProgress::new(0, Some(0));
        assert_eq!(p.fraction(), Some(1.0));
        assert!(p.is_complete());
    }

    #[test]
    fn complete_at_total() {
        let p = LoadingProgress::new(100, Some(100));
        assert_eq!(p.fraction(), Some(1.0));
        assert!(p.is_complete());
    }

    #[test]
    fn status_is_attached() {
        let p = LoadingProgress::new(0, Some(10)).with_status("downloading bundle");
        assert_eq!(p.status.as_deref(), Some("downloading bundle"));
    }
}
