mod context;
mod token_store;

pub use context::{Session, SessionContext, SessionStatus};
pub use token_store::{Credential, SessionError, TokenStore, TOKEN_KEY};
