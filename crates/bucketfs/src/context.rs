// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Cancellation and deadlines for network operations
//!
//! Every call that reaches the backing store runs under an `OpContext`:
//! cancelling its token or passing its deadline makes the outstanding
//! call return `Error::Cancelled` / `Error::DeadlineExceeded` promptly.

use crate::error::{Error, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::Context;
use std::time::Duration;
use tokio::time::{Instant, Sleep};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Cancellation token plus optional absolute deadline
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context that is never cancelled and has no deadline
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe an externally owned token
    #[must_use]
    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancel every operation running under this context (and its clones)
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Fail immediately if the context is already cancelled or expired
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Run one network operation, racing it against cancellation and the
    /// deadline. The operation future is dropped when it loses.
    pub async fn run<F, T>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(Error::Cancelled),
            () = expired => Err(Error::DeadlineExceeded),
            result = op => result,
        }
    }

    /// A poll-based guard for readers that cannot await `run`
    pub(crate) fn interrupt(&self) -> Interrupt {
        Interrupt {
            cancelled: Box::pin(self.token.clone().cancelled_owned()),
            expired: self
                .deadline
                .map(|deadline| Box::pin(tokio::time::sleep_until(deadline))),
            fired: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Fired {
    Cancelled,
    Expired,
}

/// Registers wakers for cancellation and deadline from inside `poll_*`
pub(crate) struct Interrupt {
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    expired: Option<Pin<Box<Sleep>>>,
    fired: Option<Fired>,
}

impl Interrupt {
    /// `Some` once the context has been cancelled or has expired; stays
    /// `Some` from then on.
    pub(crate) fn poll_interrupted(&mut self, cx: &mut Context<'_>) -> Option<Error> {
        if self.fired.is_none() {
            if self.cancelled.as_mut().poll(cx).is_ready() {
                self.fired = Some(Fired::Cancelled);
            } else if let Some(expired) = self.expired.as_mut() {
                if expired.as_mut().poll(cx).is_ready() {
                    self.fired = Some(Fired::Expired);
                }
            }
        }

        self.fired.map(|fired| match fired {
            Fired::Cancelled => Error::Cancelled,
            Fired::Expired => Error::DeadlineExceeded,
        })
    }
}
