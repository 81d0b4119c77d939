use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "riff")]
#[command(about = "Riff - mood-based music recommendations", long_about = None, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the Spotify authorization URL to open in a browser
    LoginUrl,
    /// Finish login with the URL Spotify redirected to
    Login {
        /// Full callback URL, including the `code` parameter
        callback_url: String,
    },
    /// Log out and forget the stored credential
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Analyze text and list recommended songs
    Analyze {
        text: String,
        /// Send your approximate location with the recommendation request
        #[arg(long)]
        location: bool,
    },
    /// Record from the microphone, then analyze the recording
    Record {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
        #[arg(long)]
        location: bool,
    },
    /// Analyze text and save the recommendations as a Spotify playlist
    Playlist {
        text: String,
        /// Playlist name (derived from the mood, and the detected country
        /// with --location, when omitted)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Create a public playlist
        #[arg(long)]
        public: bool,
        #[arg(long)]
        location: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_record() {
        let cli = Cli::try_parse_from(["riff", "record", "--seconds", "3", "--location"]).unwrap();
        match cli.command {
            Command::Record { seconds, location } => {
                assert_eq!(seconds, 3);
                assert!(location);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_location_playlist() {
        let cli =
            Cli::try_parse_from(["riff", "playlist", "sunny day", "--location", "--public"]).unwrap();
        match cli.command {
            Command::Playlist {
                text,
                name,
                public,
                location,
                ..
            } => {
                assert_eq!(text, "sunny day");
                assert_eq!(name, None);
                assert!(public);
                assert!(location);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
