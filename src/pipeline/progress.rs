use std::sync::Mutex;

use crate::pipeline::traits::ProgressListener;

/// Forwards a sub-task's `[0, 1]` progress into a slice `[start, end]` of
/// the parent's percent range. Repeated values are not forwarded.
pub struct PartialProgress<'a> {
    parent: &'a dyn ProgressListener,
    start: f64,
    end: f64,
    last: Mutex<Option<f64>>,
}

impl<'a> PartialProgress<'a> {
    pub fn new(parent: &'a dyn ProgressListener, start: f64, end: f64) -> Self {
        Self {
            parent,
            start,
            end,
            last: Mutex::new(None),
        }
    }
}

impl ProgressListener for PartialProgress<'_> {
    fn on_progress(&self, progress: f64) {
        let progress = progress.clamp(0.0, 1.0);
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *last == Some(progress) {
            return;
        }
        *last = Some(progress);
        self.parent
            .on_progress(self.start + (self.end - self.start) * progress);
    }
}
