use std::sync::{Mutex, MutexGuard, PoisonError};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub scanned: u64,
    pub uploaded: u64,
    pub uploaded_bytes: u64,
    pub skipped: u64,
    pub duplicates: u64,
    pub errors: u64,
    pub deleted: u64,
}

impl Summary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

/// Shared, lock-guarded [`Summary`]. Workers can only add to it; readers get
/// a copy.
#[derive(Debug, Default)]
pub struct Tally(Mutex<Summary>);

impl Tally {
    fn lock(&self) -> MutexGuard<'_, Summary> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn scanned(&self, count: u64) {
        self.lock().scanned += count;
    }

    pub fn uploaded(&self, bytes: u64) {
        let mut summary = self.lock();
        summary.uploaded += 1;
        summary.uploaded_bytes += bytes;
    }

    pub fn skipped(&self) {
        self.lock().skipped += 1;
    }

    pub fn duplicate(&self) {
        self.lock().duplicates += 1;
    }

    pub fn error(&self) {
        self.lock().errors += 1;
    }

    pub fn deleted(&self) {
        self.lock().deleted += 1;
    }

    pub fn snapshot(&self) -> Summary {
        *self.lock()
    }
}
