//! Transient user-facing notices.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Whether a notice reports success or a problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
  /// The action succeeded.
  Success,
  /// The action failed or had nothing to do.
  Error,
}

/// Message shown for a limited time after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
  /// Success or error.
  pub kind: NoticeKind,
  /// Text shown to the user.
  pub message: String,
  raised_at: Instant,
}

impl Notice {
  /// Whether this is an error notice.
  pub fn is_error(&self) -> bool {
    self.kind == NoticeKind::Error
  }
}

impl fmt::Display for Notice {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.message)
  }
}

/// Holds the most recent notice and hides it once its display window has passed.
#[derive(Debug, Clone)]
pub struct NoticeBoard {
  window: Duration,
  latest: Option<Notice>,
}

impl NoticeBoard {
  /// Board whose notices stay visible for `window`.
  pub fn new(window: Duration) -> Self {
    Self {
      window,
      latest: None,
    }
  }

  /// Post a success notice, replacing any previous one.
  pub fn success(&mut self, message: impl Into<String>) {
    let message = message.into();
    info!(notice = %message);
    self.post(NoticeKind::Success, message);
  }

  /// Post an error notice, replacing any previous one.
  pub fn error(&mut self, message: impl Into<String>) {
    let message = message.into();
    warn!(notice = %message);
    self.post(NoticeKind::Error, message);
  }

  fn post(&mut self, kind: NoticeKind, message: String) {
    self.latest = Some(Notice {
      kind,
      message,
      raised_at: Instant::now(),
    });
  }

  /// The notice still inside its display window, if any.
  pub fn current(&self) -> Option<&Notice> {
    self.current_at(Instant::now())
  }

  fn current_at(&self, now: Instant) -> Option<&Notice> {
    self
      .latest
      .as_ref()
      .filter(|notice| now.saturating_duration_since(notice.raised_at) < self.window)
  }

  /// The last notice posted, visible or not.
  pub fn latest(&self) -> Option<&Notice> {
    self.latest.as_ref()
  }

  /// Hide the current notice.
  pub fn dismiss(&mut self) {
    self.latest = None;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn notices_expire_after_their_window() {
    let mut board = NoticeBoard::new(Duration::from_millis(2500));
    board.error("No routes to copy.");
    let raised_at = board.latest().map(|notice| notice.raised_at).unwrap();

    let visible = board.current_at(raised_at + Duration::from_millis(2499)).unwrap();
    assert!(visible.is_error());
    assert_eq!(visible.to_string(), "No routes to copy.");
    assert!(board.current_at(raised_at + Duration::from_millis(2500)).is_none());
    assert!(board.latest().is_some());
  }

  #[test]
  fn newer_notices_replace_older_ones() {
    let mut board = NoticeBoard::new(Duration::from_secs(60));
    board.error("first");
    board.success("Copied!");
    let current = board.current().unwrap();
    assert_eq!(current.kind, NoticeKind::Success);
    assert_eq!(current.message, "Copied!");

    board.dismiss();
    assert!(board.current().is_none());
  }
}
