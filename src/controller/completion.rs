//! One-shot channel carrying the result of the out-of-band authorization
//! window back to the controller.
//!
//! Each `authorize()` call creates a fresh pair. The sender is consumed by
//! its single delivery, so the controller can never see two completions for
//! the same request.

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;

/// Provider URL the user must open to grant access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationUrl(String);

impl AuthorizationUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorizationUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationCompletion {
    pub code: String,
    pub state: Option<String>,
}

/// Handed to whatever hosts the authorization window (callback listener,
/// prompt, popup bridge).
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<AuthorizationCompletion>,
}

impl CompletionSender {
    /// Returns false when the controller stopped listening (a newer
    /// authorization replaced this one).
    pub fn deliver(self, code: impl Into<String>, state: Option<String>) -> bool {
        self.tx
            .send(AuthorizationCompletion {
                code: code.into(),
                state,
            })
            .is_ok()
    }
}

pub(crate) enum Delivery {
    Received(AuthorizationCompletion),
    TimedOut,
    Closed,
}

pub(crate) struct CompletionSubscription {
    rx: oneshot::Receiver<AuthorizationCompletion>,
    expected_state: Option<String>,
}

pub(crate) fn subscribe(expected_state: Option<String>) -> (CompletionSender, CompletionSubscription) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionSender { tx },
        CompletionSubscription { rx, expected_state },
    )
}

impl CompletionSubscription {
    /// Wait for the delivery. A timeout leaves the subscription usable.
    pub(crate) async fn wait(&mut self, timeout: Duration) -> Delivery {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(completion)) => Delivery::Received(completion),
            Ok(Err(_)) => Delivery::Closed,
            Err(_) => Delivery::TimedOut,
        }
    }

    /// A completion is accepted when the request carried no `state`, or the
    /// echoed `state` matches it.
    pub(crate) fn accepts(&self, completion: &AuthorizationCompletion) -> bool {
        match &self.expected_state {
            None => true,
            Some(expected) => completion.state.as_deref() == Some(expected.as_str()),
        }
    }
}
