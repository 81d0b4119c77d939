use log::{debug, error, info};
use tokio::sync::{watch, Mutex, OnceCell};

use super::token_store::{Credential, SessionError, TokenStore};

/// Login state as dependents should render it
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SessionStatus {
    /// Stored credential not loaded yet. Render neither logged in nor out.
    Unknown,
    Anonymous,
    Authenticated,
}

/// Snapshot of the session. Derived state only, never cached by consumers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub credential: Option<Credential>,
    /// Initialization finished, or a credential was set explicitly
    pub resolved: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        match (self.resolved, self.is_authenticated()) {
            (_, true) => SessionStatus::Authenticated,
            (false, false) => SessionStatus::Unknown,
            (true, false) => SessionStatus::Anonymous,
        }
    }
}

/// Process-wide session, injected into whatever needs the credential.
pub struct SessionContext {
    store: TokenStore,
    state: watch::Sender<Session>,
    init: OnceCell<()>,
    // Serializes persist-then-publish so storage and memory agree
    write_lock: Mutex<()>,
}

impl SessionContext {
    pub fn new(store: TokenStore) -> Self {
        let (state, _) = watch::channel(Session::default());
        Self {
            store,
            state,
            init: OnceCell::new(),
            write_lock: Mutex::new(()),
        }
    }

    /// Load the persisted credential. Runs once; later calls wait for the
    /// first to finish and return the current status.
    pub async fn initialize(&self) -> SessionStatus {
        self.init
            .get_or_init(|| async {
                let loaded = match self.store.load().await {
                    Ok(credential) => credential,
                    Err(e) => {
                        error!("Failed to load stored credential: {}", e);
                        None
                    }
                };

                self.state.send_modify(|session| {
                    if session.resolved {
                        debug!("Credential was set during initialization, keeping it");
                        return;
                    }
                    session.credential = loaded;
                    session.resolved = true;
                });
                info!("Session initialized: {}", self.status());
            })
            .await;

        self.status()
    }

    /// Persist (or clear) the credential, then publish it.
    pub async fn set_credential(&self, credential: Option<Credential>) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().await;

        match &credential {
            Some(credential) => self.store.save(credential).await?,
            None => self.store.clear().await?,
        }

        let authenticated = credential.is_some();
        self.state.send_modify(|session| {
            session.credential = credential;
            session.resolved = true;
        });
        info!("Session updated: authenticated={}", authenticated);
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), SessionError> {
        self.set_credential(None).await
    }

    pub fn credential(&self) -> Option<Credential> {
        self.state.borrow().credential.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every change
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}
