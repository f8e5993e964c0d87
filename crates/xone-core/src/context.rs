//! Cancellation and deadline token threaded through every store operation.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// A cancellation token plus an optional deadline.
///
/// Clones share the same token: cancelling any clone cancels them all.
/// Storage backends poll [`Context::is_done`] while a statement runs and
/// abort it (rolling back the enclosing transaction) once it returns `true`.
#[derive(Debug, Clone, Default)]
pub struct Context {
  token:    CancellationToken,
  deadline: Option<Instant>,
}

impl Context {
  /// A context that is never cancelled and has no deadline.
  pub fn background() -> Self { Self::default() }

  /// A child context that expires `timeout` from now. A timeout too large
  /// to represent adds no deadline of its own.
  pub fn with_timeout(&self, timeout: Duration) -> Self {
    match Instant::now().checked_add(timeout) {
      Some(deadline) => self.with_deadline(deadline),
      None => self.child(),
    }
  }

  /// A child context that expires at `deadline`, or at the parent's deadline
  /// if that is earlier.
  pub fn with_deadline(&self, deadline: Instant) -> Self {
    let deadline = match self.deadline {
      Some(parent) if parent < deadline => parent,
      _ => deadline,
    };
    Self { token: self.token.child_token(), deadline: Some(deadline) }
  }

  /// A child context: cancelled when `self` is, but cancelling it leaves
  /// `self` untouched.
  pub fn child(&self) -> Self {
    Self { token: self.token.child_token(), deadline: self.deadline }
  }

  pub fn cancel(&self) { self.token.cancel() }

  pub fn is_cancelled(&self) -> bool { self.token.is_cancelled() }

  pub fn deadline(&self) -> Option<Instant> { self.deadline }

  pub fn is_expired(&self) -> bool {
    self.deadline.is_some_and(|d| Instant::now() >= d)
  }

  /// `true` once the context is cancelled or past its deadline.
  pub fn is_done(&self) -> bool { self.is_cancelled() || self.is_expired() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn background_is_never_done() {
    let ctx = Context::background();
    assert!(!ctx.is_done());
    assert!(ctx.deadline().is_none());
  }

  #[test]
  fn cancel_propagates_to_children_only() {
    let parent = Context::background();
    let child = parent.child();
    child.cancel();
    assert!(child.is_done());
    assert!(!parent.is_done());

    let child = parent.child();
    parent.cancel();
    assert!(child.is_cancelled());
  }

  #[test]
  fn elapsed_deadline_is_done() {
    let ctx = Context::background().with_timeout(Duration::ZERO);
    assert!(ctx.is_expired());
    assert!(ctx.is_done());
  }

  #[test]
  fn child_deadline_never_exceeds_parent() {
    let parent = Context::background().with_timeout(Duration::from_secs(1));
    let child = parent.with_timeout(Duration::from_secs(3600));
    assert_eq!(child.deadline(), parent.deadline());
  }

  #[test]
  fn unrepresentable_timeout_keeps_parent_deadline() {
    let unbounded = Context::background().with_timeout(Duration::MAX);
    assert!(unbounded.deadline().is_none());
    assert!(!unbounded.is_done());

    let parent = Context::background().with_timeout(Duration::from_secs(60));
    let child = parent.with_timeout(Duration::MAX);
    assert_eq!(child.deadline(), parent.deadline());

    parent.cancel();
    assert!(child.is_cancelled());
  }
}
