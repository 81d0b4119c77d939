use derive_more::{Display, From};

#[derive(Debug, Display, From)]
pub enum Error {
    #[from]
    Recorder(crate::recording::RecorderError),

    #[from]
    Client(crate::clients::ClientError),

    #[from]
    Storage(riff_storage::StorageError),

    #[from]
    Session(crate::session::SessionError),

    #[from]
    Auth(crate::auth::AuthError),

    #[from]
    Analysis(crate::analysis::AnalysisError),

    #[from]
    Playlist(crate::playlist::PlaylistError),

    #[from]
    Config(crate::config::ConfigError),
}

impl std::error::Error for Error {}

impl Error {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            Error::Recorder(e) => e.user_message(),
            Error::Client(e) => e.user_message(),
            Error::Session(e) => e.user_message(),
            Error::Auth(e) => e.user_message(),
            Error::Analysis(e) => e.user_message(),
            Error::Playlist(e) => e.user_message(),
            Error::Storage(_) => "Could not access local storage.".to_string(),
            Error::Config(e) => format!("Invalid configuration: {}", e),
        }
    }
}
