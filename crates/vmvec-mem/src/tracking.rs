//! Lightweight commit/growth accounting.
//!
//! Keep this cheap: plain counters updated on the commit path, which already
//! pays for a syscall.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GrowthStats {
    /// Successful commits, including the initial one.
    pub commits: usize,
    /// Commits that extended an already non-empty committed prefix.
    pub growth_events: usize,
    /// Largest committed prefix seen, in bytes.
    pub peak_committed_bytes: usize,
}

impl GrowthStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit that moved the committed prefix from `old_bytes` to `new_bytes`.
    pub fn record_commit(&mut self, old_bytes: usize, new_bytes: usize) {
        self.commits += 1;
        if old_bytes > 0 {
            self.growth_events += 1;
        }
        self.peak_committed_bytes = self.peak_committed_bytes.max(new_bytes);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            old_bytes,
            new_bytes,
            growth_events = self.growth_events,
            peak = self.peak_committed_bytes,
            "commit"
        );
    }
}
