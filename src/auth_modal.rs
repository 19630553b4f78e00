//! Signal for opening the authentication modal from non-UI code.
//!
//! The UI registers one subscriber when it mounts; the API client triggers it when a
//! request comes back `401`. Registering again replaces the previous subscriber. A
//! trigger with nobody listening is dropped with a warning.

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthModalMode {
    #[default]
    Login,
    Register,
}

impl fmt::Display for AuthModalMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login => write!(formatter, "login"),
            Self::Register => write!(formatter, "register"),
        }
    }
}

type Subscriber = Arc<dyn Fn(AuthModalMode) + Send + Sync>;

#[derive(Default)]
pub struct AuthModalSignal {
    subscriber: RwLock<Option<Subscriber>>,
}

impl fmt::Debug for AuthModalSignal {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthModalSignal")
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl AuthModalSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `subscriber` as the single listener, replacing any previous one.
    pub fn register<F>(&self, subscriber: F)
    where
        F: Fn(AuthModalMode) + Send + Sync + 'static,
    {
        *self.subscriber.write().unwrap_or_else(PoisonError::into_inner) =
            Some(Arc::new(subscriber));
    }

    /// Remove the listener, e.g. when the UI unmounts.
    pub fn clear(&self) {
        *self.subscriber.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.subscriber
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Ask the listener to open the modal in `mode`. Returns whether anyone was notified.
    pub fn trigger(&self, mode: AuthModalMode) -> bool {
        // clone out so the subscriber runs without the lock held
        let subscriber = self
            .subscriber
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        if let Some(subscriber) = subscriber {
            debug!(%mode, "opening auth modal");
            subscriber(mode);
            true
        } else {
            warn!(%mode, "Auth modal callback not initialized yet");
            false
        }
    }
}
