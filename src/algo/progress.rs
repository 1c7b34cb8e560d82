//! Progress reporting for pipeline runs.
//!
//! The coordinate pipeline reports one tick per processed schema entry so that
//! callers can display how far a long run has advanced.
//!
//! # Example
//!
//! ```
//! use atrium::algo::progress::Progress;
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//! progress.report(1, 4, "feature_extraction LIPV/inner");
//! ```

/// A progress callback that receives updates during a pipeline run.
///
/// The callback receives:
/// - `current`: Number of completed steps
/// - `total`: Total number of steps in the current stage
/// - `message`: Description of the step that just completed
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_callback_receives_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress = Progress::new(move |current, total, message| {
            sink.lock().unwrap().push((current, total, message.to_string()));
        });

        progress.report(1, 2, "first");
        progress.report(2, 2, "second");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], (2, 2, "second".to_string()));
    }
}
