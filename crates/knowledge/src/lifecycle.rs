//! One-shot index construction with readiness gating.
//!
//! The state lives in a `tokio::sync::watch` cell:
//!
//! ```text
//! Uninitialized --initialize()--> Initializing --> Ready(T)
//!                                              \-> Failed(error)
//! ```
//!
//! Only the first `initialize` call runs its build; later callers wait for
//! the same outcome. Reads never wait: before `Ready` they fail with
//! `NotReady`, after a failure with `IndexFailed`.

use crate::types::LifecycleStatus;
use ragdesk_core::{AppError, AppResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// Current lifecycle state.
#[derive(Debug)]
pub enum LifecycleState<T> {
    Uninitialized,
    Initializing,
    Ready(Arc<T>),
    Failed(AppError),
}

impl<T> Clone for LifecycleState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Uninitialized => Self::Uninitialized,
            Self::Initializing => Self::Initializing,
            Self::Ready(value) => Self::Ready(Arc::clone(value)),
            Self::Failed(err) => Self::Failed(err.clone()),
        }
    }
}

impl<T> LifecycleState<T> {
    pub fn status(&self) -> LifecycleStatus {
        match self {
            Self::Uninitialized => LifecycleStatus::Uninitialized,
            Self::Initializing => LifecycleStatus::Initializing,
            Self::Ready(_) => LifecycleStatus::Ready,
            Self::Failed(_) => LifecycleStatus::Failed,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Failed(_))
    }
}

/// Guards a lifecycle whose value is built exactly once.
#[derive(Debug)]
pub struct IndexLifecycle<T> {
    state: watch::Sender<LifecycleState<T>>,
}

impl<T> Default for IndexLifecycle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IndexLifecycle<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::Uninitialized);
        Self { state }
    }

    /// Current status; never waits.
    pub fn status(&self) -> LifecycleStatus {
        self.state.borrow().status()
    }

    /// The built value, if ready.
    ///
    /// # Errors
    /// - `AppError::NotReady` while uninitialized or initializing
    /// - `AppError::IndexFailed` carrying the build error after a failure
    pub fn ready(&self) -> AppResult<Arc<T>> {
        match &*self.state.borrow() {
            LifecycleState::Ready(value) => Ok(Arc::clone(value)),
            LifecycleState::Failed(err) => Err(AppError::IndexFailed(Box::new(err.clone()))),
            LifecycleState::Uninitialized | LifecycleState::Initializing => Err(AppError::NotReady),
        }
    }

    /// Run `build` if nobody has started yet, otherwise wait for the build
    /// already in progress (or finished). Every caller sees the same value
    /// or the same error.
    ///
    /// If the future running the build is dropped before finishing, the
    /// lifecycle moves to `Failed` with `AppError::Cancelled`.
    pub async fn initialize<F, Fut>(&self, build: F) -> AppResult<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let claimed = self.state.send_if_modified(|state| {
            if matches!(state, LifecycleState::Uninitialized) {
                *state = LifecycleState::Initializing;
                true
            } else {
                false
            }
        });

        if !claimed {
            tracing::debug!("Index initialization already claimed, waiting for outcome");
            return self.wait().await;
        }

        tracing::info!("Index initialization started");

        let mut guard = CancelGuard {
            state: &self.state,
            armed: true,
        };
        let outcome = build().await;
        guard.armed = false;

        match outcome {
            Ok(value) => {
                let value = Arc::new(value);
                self.state.send_replace(LifecycleState::Ready(Arc::clone(&value)));
                tracing::info!("Index is ready");
                Ok(value)
            }
            Err(err) => {
                tracing::error!("Index initialization failed: {}", err);
                self.state.send_replace(LifecycleState::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Wait until the lifecycle reaches `Ready` or `Failed`.
    async fn wait(&self) -> AppResult<Arc<T>> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|state| state.is_terminal())
            .await
            .map_err(|_| AppError::Cancelled("index lifecycle was dropped".to_string()))?
            .clone();

        match state {
            LifecycleState::Ready(value) => Ok(value),
            LifecycleState::Failed(err) => Err(err),
            LifecycleState::Uninitialized | LifecycleState::Initializing => Err(AppError::NotReady),
        }
    }
}

/// Moves an unfinished build to `Failed` when dropped.
struct CancelGuard<'a, T> {
    state: &'a watch::Sender<LifecycleState<T>>,
    armed: bool,
}

impl<T> Drop for CancelGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        tracing::warn!("Index initialization was cancelled");
        self.state.send_if_modified(|state| {
            if matches!(state, LifecycleState::Initializing) {
                *state = LifecycleState::Failed(AppError::Cancelled(
                    "index build did not finish".to_string(),
                ));
                true
            } else {
                false
            }
        });
    }
}
