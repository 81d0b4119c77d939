//! Riff client library.
//!
//! Session handling, the authenticated backend client, microphone capture,
//! the analyze-then-recommend pipeline and playlist export. The `riff`
//! binary drives it from the command line; UI hosts embed it directly.

pub mod analysis;
pub mod auth;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod log;
pub mod playlist;
pub mod recording;
pub mod session;
pub mod setup;

use std::time::Duration;

use crate::analysis::{AnalysisInput, AnalysisOutcome, AnalysisReport};
use crate::auth::{extract_authorization_code, AuthorizationRequest};
use crate::cli::{Cli, Command};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::playlist::PlaylistOptions;
use crate::setup::App;

pub async fn run(cli: Cli) -> Result<(), Error> {
    let config = ClientConfig::from_env()?;
    let app = setup::setup_app(config).await?;

    match cli.command {
        Command::LoginUrl => {
            let url = AuthorizationRequest::from_config(&app.config).url()?;
            println!("{}", url);
        }
        Command::Login { callback_url } => {
            let code = extract_authorization_code(&callback_url)?;
            let name = app.auth.login_with_code(&code).await?;
            println!("Logged in as {}", name);
        }
        Command::Logout => {
            app.auth.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            if !app.session.is_authenticated() {
                println!("Not logged in");
                return Ok(());
            }
            let profile = app.auth.fetch_profile().await?;
            println!("{}", profile.name());
        }
        Command::Analyze { text, location } => {
            use_location(&app, location);
            if let Some(report) = analyze(&app, AnalysisInput::text(text)).await? {
                print_report(&report);
            }
        }
        Command::Record { seconds, location } => {
            use_location(&app, location);
            let controller = app.capture_controller(None)?;
            controller.start().await?;
            println!("Recording for {}s...", seconds);
            tokio::time::sleep(Duration::from_secs(seconds)).await;

            match controller.stop().await? {
                Some(payload) => {
                    if payload.truncated {
                        println!("Recording hit the configured limit and was cut short");
                    }
                    if let Some(report) = analyze(&app, AnalysisInput::Audio(payload)).await? {
                        print_report(&report);
                    }
                }
                None => println!("Nothing was recorded"),
            }
        }
        Command::Playlist {
            text,
            name,
            description,
            public,
            location,
        } => {
            use_location(&app, location);
            let Some(report) = analyze(&app, AnalysisInput::text(text)).await? else {
                return Ok(());
            };
            print_report(&report);

            let songs = match report.recommendations {
                Ok(songs) => songs,
                Err(e) => return Err(e.into()),
            };
            let options = PlaylistOptions {
                name,
                description,
                is_public: public || app.config.public_playlists,
                ..PlaylistOptions::from_analysis(&report.emotion, report.location.as_ref(), songs)
            };
            let handle = app.playlists.create_playlist(options).await?;
            match handle.url {
                Some(url) => println!("Playlist created: {}", url),
                None => println!("Playlist created"),
            }
        }
    }

    Ok(())
}

fn use_location(app: &App, forced: bool) {
    if forced {
        app.analysis.set_use_location(true);
    }
}

async fn analyze(app: &App, input: AnalysisInput) -> Result<Option<AnalysisReport>, Error> {
    match app.analysis.analyze(input).await? {
        AnalysisOutcome::Completed(report) => Ok(Some(report)),
        AnalysisOutcome::Skipped => {
            println!("Nothing to analyze");
            Ok(None)
        }
        AnalysisOutcome::Superseded => Ok(None),
    }
}

fn print_report(report: &AnalysisReport) {
    println!("Emotion: {}", report.emotion.emotion);
    println!("Mood: {}", report.emotion.mood);
    if let Some(specific) = &report.emotion.specific_emotion {
        println!("Specific emotion: {}", specific);
    }
    if let Some(transcript) = &report.emotion.transcript {
        println!("Heard: {}", transcript);
    }
    if let Some(location) = &report.location {
        println!(
            "Detected location: {}, {}",
            location.city.as_deref().unwrap_or("N/A"),
            location.country.as_deref().unwrap_or("N/A")
        );
    }

    match &report.recommendations {
        Ok(songs) if songs.is_empty() => println!("No recommendations"),
        Ok(songs) => {
            for song in songs {
                match song.link() {
                    Some(link) => println!("  {} - {} ({})", song.name, song.artist, link),
                    None => println!("  {} - {}", song.name, song.artist),
                }
            }
        }
        Err(e) => println!("Recommendations unavailable: {}", e.user_message()),
    }
}
