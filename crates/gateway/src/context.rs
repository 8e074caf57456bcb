//! Per-request cancellation context.
//!
//! Every gateway operation takes a [`RequestContext`]. Provider calls race
//! against [`RequestContext::done`], so a caller can bound latency either by
//! cancelling the token or by attaching a deadline.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Why a context finished before the work did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CancelReason {
    /// The token was cancelled explicitly.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "cancelled"),
            Self::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Cancellation token, optional deadline, and request id for one gateway call.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request_id: Uuid,
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A fresh context with no deadline.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Wrap an existing token, e.g. one owned by a server's shutdown handler.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::new()
        }
    }

    /// Attach a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Attach an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// A context cancelled whenever this one is, sharing its deadline.
    pub fn child(&self) -> Self {
        Self {
            request_id: self.request_id,
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns the reason if the context has already finished.
    pub fn check(&self) -> Option<CancelReason> {
        if self.token.is_cancelled() {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.check().is_some()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> CancelReason {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.token.cancelled() => CancelReason::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CancelReason::Cancelled
            }
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
