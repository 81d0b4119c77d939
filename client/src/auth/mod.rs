mod flow;
mod oauth;

pub use flow::Authenticator;
pub use oauth::{extract_authorization_code, AuthError, AuthorizationRequest, AUTHORIZE_URL};
