use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, AtomicUsize, Ordering};
use parking_lot::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Finish,
    Done,
}

/// Shared view on a running build.
///
/// Handles are cheap clones and may be read from other threads while the
/// build runs; reads are advisory and only guaranteed to be torn-free.
#[derive(Clone, Default)]
pub struct Progress {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    phase: AtomicU8,
    input_frac: AtomicU32,     // f32 bits, reported by the parser
    spos: AtomicUsize,         // patched size entries
    ssize: AtomicUsize,        // total size entries to patch
    stop: AtomicBool,
    detail: RwLock<String>,
}

impl Progress {
    pub fn new() -> Self {
        Progress::default()
    }

    pub fn title(&self) -> &'static str {
        "Creating Database"
    }

    pub fn detail(&self) -> String {
        match self.phase() {
            Phase::Parse => self.inner.detail.read().clone(),
            Phase::Finish => "Finishing".to_string(),
            Phase::Done => "Done".to_string(),
        }
    }

    /// Fraction of completed work in [0, 1]
    pub fn progress(&self) -> f64 {
        match self.phase() {
            Phase::Parse => f32::from_bits(self.inner.input_frac.load(Ordering::Relaxed)) as f64,
            Phase::Finish => {
                let ssize = self.inner.ssize.load(Ordering::Relaxed);
                if ssize == 0 {
                    1.0
                } else {
                    self.inner.spos.load(Ordering::Relaxed) as f64 / ssize as f64
                }
            }
            Phase::Done => 1.0,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.inner.phase.load(Ordering::Relaxed) {
            0 => Phase::Parse,
            1 => Phase::Finish,
            _ => Phase::Done,
        }
    }

    /// Asks the build to stop; observed at the next element close.
    pub fn stop(&self) {
        self.inner.stop.store(true, Ordering::Relaxed);
    }

    pub fn stopped(&self) -> bool {
        self.inner.stop.load(Ordering::Relaxed)
    }

    /// Lets the parser publish its input position.
    pub fn set_input(&self, frac: f64, detail: Option<&str>) {
        self.inner
            .input_frac
            .store((frac.clamp(0.0, 1.0) as f32).to_bits(), Ordering::Relaxed);
        if let Some(detail) = detail {
            *self.inner.detail.write() = detail.to_string();
        }
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        let code = match phase {
            Phase::Parse => 0,
            Phase::Finish => 1,
            Phase::Done => 2,
        };
        self.inner.phase.store(code, Ordering::Relaxed);
    }

    pub(crate) fn patch_total(&self, total: usize) {
        self.inner.ssize.store(total, Ordering::Relaxed);
    }

    pub(crate) fn patch_done(&self, done: usize) {
        self.inner.spos.store(done, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_drive_the_reported_fraction() {
        let progress = Progress::new();
        assert_eq!(progress.title(), "Creating Database");
        assert_eq!(progress.phase(), Phase::Parse);
        progress.set_input(0.5, Some("halfway"));
        assert!((progress.progress() - 0.5).abs() < 1e-6);
        assert_eq!(progress.detail(), "halfway");

        progress.set_phase(Phase::Finish);
        progress.patch_total(4);
        progress.patch_done(1);
        assert!((progress.progress() - 0.25).abs() < 1e-6);

        progress.set_phase(Phase::Done);
        assert_eq!(progress.progress(), 1.0);
    }

    #[test]
    fn empty_patch_pass_reports_complete() {
        let progress = Progress::new();
        progress.set_phase(Phase::Finish);
        assert_eq!(progress.progress(), 1.0);
    }

    #[test]
    fn stop_flag_is_visible_across_clones() {
        let progress = Progress::new();
        let handle = progress.clone();
        handle.stop();
        assert!(progress.stopped());
    }
}
