//! The request context passed to every handler.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::parser::QueryMap;

/// Key under which the decoded query string is stored.
pub const QUERY_MAP_KEY: &str = "queryMap";

/// Cancellation signal plus immutable request-scoped values.
///
/// Contexts are cheap to clone. `with_*` methods return a derived context
/// and leave the original untouched, so middleware can hand a modified
/// context down the chain.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<String, Arc<dyn Any + Send + Sync>>>,
    cancel: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl Context {
    /// An empty context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that is cancelled once `cancel` turns `true`.
    pub fn with_cancel(&self, cancel: watch::Receiver<bool>) -> Self {
        Self {
            cancel: Some(cancel),
            ..self.clone()
        }
    }

    /// Derive a context carrying `value` under `key`.
    pub fn with_value<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key.into(), Arc::new(value));
        Self {
            values: Arc::new(values),
            ..self.clone()
        }
    }

    /// The value stored under `key`, if it exists and has type `T`.
    pub fn value<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|value| value.as_ref().downcast_ref::<T>())
    }

    /// The decoded query string of the current request.
    pub fn query(&self) -> Option<&QueryMap> {
        self.value::<QueryMap>(QUERY_MAP_KEY)
    }

    /// Derive a context whose deadline is `timeout` from now.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context with the given deadline. An earlier existing
    /// deadline is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the cancellation signal fired or the deadline passed.
    pub fn is_cancelled(&self) -> bool {
        let signalled = self.cancel.as_ref().is_some_and(|cancel| *cancel.borrow());
        let expired = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        signalled || expired
    }

    /// Wait until the context is cancelled.
    ///
    /// Never resolves for a context without a cancellation signal or
    /// deadline.
    pub async fn cancelled(&self) {
        let signal = async {
            match self.cancel.clone() {
                Some(mut cancel) => {
                    // A dropped sender means the transport went away.
                    let _ = cancel.wait_for(|cancelled| *cancelled).await;
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expiry = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = signal => {}
            _ = expiry => {}
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Context")
            .field("values", &keys)
            .field("deadline", &self.deadline)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
