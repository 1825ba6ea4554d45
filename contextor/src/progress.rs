//! Lightweight progress reporting for index runs.
//!
//! Use `NoopProgress` for servers (default) and `IndicatifProgress` for
//! CLI/TTY runs.

use indicatif::{ProgressBar, ProgressStyle};

/// Minimal progress interface used by the indexer.
pub trait Progress: Send + Sync {
    /// Set known total units (passages).
    fn set_total(&self, _n: u64) {}
    /// Advance by `n` units with a short message.
    fn advance(&self, _n: u64, _msg: &str) {}
    /// Replace current message without advancing.
    fn message(&self, _msg: &str) {}
    /// Finish the UI.
    fn finish(&self, _msg: &str) {}
}

/// No-op reporter for servers/headless runs.
#[derive(Default, Clone, Copy)]
pub struct NoopProgress;
impl Progress for NoopProgress {}

/// Indicatif-based bar.
pub struct IndicatifProgress {
    pb: ProgressBar,
}

impl IndicatifProgress {
    /// Bar whose length is set later through [`Progress::set_total`].
    pub fn bar() -> Self {
        let pb = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>5}/{len:5} {msg}")
        {
            pb.set_style(style);
        }
        Self { pb }
    }
}

impl Progress for IndicatifProgress {
    fn set_total(&self, n: u64) {
        self.pb.set_length(n);
    }
    fn advance(&self, n: u64, msg: &str) {
        self.pb.inc(n);
        self.pb.set_message(msg.to_string());
    }
    fn message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }
    fn finish(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
