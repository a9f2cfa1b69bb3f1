use crate::CoreError;
use std::future::Future;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Lifetime of one screen or command. Work started through [`Scope::run`]
/// is dropped when the scope closes, and a result that arrives after the
/// close is reported as [`CoreError::Cancelled`] instead of being applied.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed together with `self`, or on its own.
    pub fn child(&self) -> Scope {
        Scope {
            token: self.token.child_token(),
        }
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Closes the scope when the guard is dropped.
    pub fn guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    pub async fn run<F, T>(&self, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, CoreError>>,
    {
        if !self.is_live() {
            return Err(CoreError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(CoreError::Cancelled),
            res = fut => {
                if self.is_live() { res } else { Err(CoreError::Cancelled) }
            }
        }
    }
}
