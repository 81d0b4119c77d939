use std::sync::Arc;

use log::{info, warn};

use super::oauth::AuthError;
use crate::clients::{Backend, ClientError, Profile};
use crate::session::SessionContext;

/// Login and logout sequencing over the backend and the session.
pub struct Authenticator {
    backend: Arc<dyn Backend>,
    session: Arc<SessionContext>,
}

impl Authenticator {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionContext>) -> Self {
        Self { backend, session }
    }

    /// Exchange `code`, store the credential, and return the display name.
    ///
    /// The profile lookup is best-effort: a failure there still leaves the
    /// user logged in, shown as "Guest".
    pub async fn login_with_code(&self, code: &str) -> Result<String, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::MissingCode);
        }

        let credential = self.backend.exchange_code(code).await?;
        self.session.set_credential(Some(credential)).await?;
        info!("Logged in");

        let name = match self.backend.profile().await {
            Ok(profile) => profile.name().to_string(),
            Err(e) => {
                warn!("Failed to fetch user profile: {}", e);
                Profile::default().name().to_string()
            }
        };
        Ok(name)
    }

    pub async fn fetch_profile(&self) -> Result<Profile, ClientError> {
        self.backend.profile().await
    }

    /// Best-effort backend logout, then always drop the local credential.
    pub async fn logout(&self) -> Result<(), AuthError> {
        if let Err(e) = self.backend.logout().await {
            warn!("Error logging out: {}", e);
        }
        self.session.clear().await?;
        info!("Logged out");
        Ok(())
    }
}
