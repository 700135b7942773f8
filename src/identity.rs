//! Identity provider seam.
//!
//! Authentication itself is someone else's job; the core only needs to know
//! *who* is signed in (if anyone) and to hear about changes.  Changes are
//! published through a `tokio::sync::watch` channel.

use tokio::sync::watch;

/// An authenticated user handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user id; scopes every remote history operation.
    pub user_id: String,
    /// Bearer token for the remote history service, when it wants one.
    pub token: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Source of the current identity.
pub trait IdentityProvider: Send + Sync {
    fn current(&self) -> Option<Identity>;
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Identity set explicitly by the application (sign-in form, CLI flag, …).
pub struct StaticIdentityProvider {
    tx: watch::Sender<Option<Identity>>,
}

impl StaticIdentityProvider {
    pub fn new(initial: Option<Identity>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn sign_in(&self, identity: Identity) {
        log::info!("identity: signed in as {}", identity.user_id);
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        log::info!("identity: signed out");
        self.tx.send_replace(None);
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_out_update_current() {
        let provider = StaticIdentityProvider::new(None);
        assert!(provider.current().is_none());

        provider.sign_in(Identity::new("ada").with_token("t0k"));
        let id = provider.current().unwrap();
        assert_eq!(id.user_id, "ada");
        assert_eq!(id.token.as_deref(), Some("t0k"));

        provider.sign_out();
        assert!(provider.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_transitions() {
        let provider = StaticIdentityProvider::new(None);
        let mut rx = provider.subscribe();

        provider.sign_in(Identity::new("grace"));
        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|i| i.user_id.clone()),
            Some("grace".to_string())
        );
    }
}
