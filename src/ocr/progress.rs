//! OCR progress reporting.

use crossbeam_channel::Sender;

/// Receives OCR progress as a percentage (0-100).
///
/// Implemented for closures, so `&mut |p| println!("{p}%")` works directly.
pub trait ProgressSink {
    /// Report progress; called once per recognized page.
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Forwards progress over a channel, e.g. to a UI thread.
///
/// A disconnected receiver is not an error; later reports are dropped.
#[derive(Debug, Clone)]
pub struct ChannelProgress(pub Sender<u8>);

impl ChannelProgress {
    /// Wrap a sender.
    pub fn new(sender: Sender<u8>) -> Self {
        Self(sender)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&mut self, percent: u8) {
        if self.0.send(percent).is_err() {
            log::debug!("Progress receiver dropped at {}%", percent);
        }
    }
}

/// Percentage after `done` of `total` steps.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
