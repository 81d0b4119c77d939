//! Analysis pipeline: classify the input, then fetch recommendations.
//!
//! Each call to [`AnalysisOrchestrator::analyze`] or
//! [`AnalysisOrchestrator::recommend`] starts a new request generation and
//! cancels the previous one. Results are published only while their
//! generation is still current, so a slow stale response can never overwrite
//! what a newer request produced.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::models::{AnalysisInput, EmotionResult, Mood, Song};
use crate::clients::{AnalysisRoute, Backend, ClientError, GeoIpClient, Location};
use crate::session::SessionContext;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No analysis result to recommend from")]
    NoAnalysis,
    #[error("Not logged in")]
    MissingCredential,
    #[error(transparent)]
    Client(ClientError),
}

impl From<ClientError> for AnalysisError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::MissingCredential => AnalysisError::MissingCredential,
            other => AnalysisError::Client(other),
        }
    }
}

impl AnalysisError {
    /// Returns a user-friendly error message suitable for display in the UI
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::NoAnalysis => "Analyze some text or a recording first.".to_string(),
            AnalysisError::MissingCredential => "Please log in with Spotify first.".to_string(),
            AnalysisError::Client(e) => e.user_message(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
pub enum AnalysisPhase {
    #[default]
    Idle,
    Analyzing,
    Recommending,
    Done,
    Failed,
}

/// Everything a results screen renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisView {
    pub phase: AnalysisPhase,
    pub emotion: Option<EmotionResult>,
    /// Replaced wholesale on every recommendation fetch
    pub songs: Vec<Song>,
    pub analysis_error: Option<String>,
    pub recommendation_error: Option<String>,
    /// Detected location the current songs were fetched for
    pub location: Option<Location>,
}

/// Result of one finished `analyze` call. The two steps fail independently.
#[derive(Debug)]
pub struct AnalysisReport {
    pub emotion: EmotionResult,
    pub recommendations: Result<Vec<Song>, AnalysisError>,
    /// Set when location mode was on and the lookup succeeded
    pub location: Option<Location>,
}

#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Blank input, nothing was sent
    Skipped,
    /// A newer request (or `cancel`) took over; nothing was published
    Superseded,
    Completed(AnalysisReport),
}

struct RequestState {
    generation: u64,
    token: CancellationToken,
}

pub struct AnalysisOrchestrator {
    backend: Arc<dyn Backend>,
    session: Arc<SessionContext>,
    geoip: Option<GeoIpClient>,
    use_location: AtomicBool,
    fallback_enabled: bool,
    request: Mutex<RequestState>,
    view: watch::Sender<AnalysisView>,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionContext>) -> Self {
        let (view, _) = watch::channel(AnalysisView::default());
        Self {
            backend,
            session,
            geoip: None,
            use_location: AtomicBool::new(false),
            fallback_enabled: false,
            request: Mutex::new(RequestState {
                generation: 0,
                token: CancellationToken::new(),
            }),
            view,
        }
    }

    /// Retry text analysis once on the fallback route when the primary
    /// answers non-2xx.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    /// Location source for location-aware recommendations
    pub fn with_geoip(mut self, geoip: GeoIpClient) -> Self {
        self.geoip = Some(geoip);
        self
    }

    pub fn set_use_location(&self, enabled: bool) {
        self.use_location.store(enabled, Ordering::Relaxed);
    }

    pub fn view(&self) -> AnalysisView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisView> {
        self.view.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, RequestState> {
        self.request.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new generation, cancelling whatever was in flight.
    fn begin_request(&self) -> (u64, CancellationToken) {
        let mut request = self.lock();
        request.token.cancel();
        request.generation += 1;
        request.token = CancellationToken::new();
        (request.generation, request.token.clone())
    }

    /// Apply `update` to the view if `generation` is still current.
    fn publish<F>(&self, generation: u64, update: F) -> bool
    where
        F: FnOnce(&mut AnalysisView),
    {
        let request = self.lock();
        if request.generation != generation {
            return false;
        }
        self.view.send_modify(update);
        true
    }

    /// Abandon in-flight work. Late responses are discarded.
    pub fn cancel(&self) {
        let mut request = self.lock();
        request.token.cancel();
        request.generation += 1;
        self.view.send_if_modified(|view| {
            let busy = matches!(
                view.phase,
                AnalysisPhase::Analyzing | AnalysisPhase::Recommending
            );
            if busy {
                view.phase = AnalysisPhase::Idle;
            }
            busy
        });
        debug!("Analysis cancelled");
    }

    /// Classify `input`, then fetch recommendations for the result.
    ///
    /// Blank text is skipped without any backend call or state change. A
    /// failed classification ends the run with that error; a failed
    /// recommendation still completes, carrying the emotion and the error.
    pub async fn analyze(&self, input: AnalysisInput) -> Result<AnalysisOutcome, AnalysisError> {
        if input.is_blank() {
            debug!("Skipping analysis of blank input");
            return Ok(AnalysisOutcome::Skipped);
        }
        if !self.session.is_authenticated() {
            return Err(AnalysisError::MissingCredential);
        }

        let (generation, token) = self.begin_request();
        self.publish(generation, |view| {
            view.phase = AnalysisPhase::Analyzing;
            view.songs.clear();
            view.analysis_error = None;
            view.recommendation_error = None;
            view.location = None;
        });

        let analysis = tokio::select! {
            _ = token.cancelled() => return Ok(AnalysisOutcome::Superseded),
            result = self.classify(&input) => result,
        };

        let emotion = match analysis {
            Ok(emotion) => emotion,
            Err(e) => {
                let e = AnalysisError::from(e);
                let message = e.user_message();
                if !self.publish(generation, |view| {
                    view.phase = AnalysisPhase::Failed;
                    view.analysis_error = Some(message);
                }) {
                    return Ok(AnalysisOutcome::Superseded);
                }
                return Err(e);
            }
        };

        if let AnalysisInput::Audio(payload) = &input {
            payload.cleanup();
        }

        let published = emotion.clone();
        if !self.publish(generation, |view| {
            view.phase = AnalysisPhase::Recommending;
            view.emotion = Some(published);
        }) {
            return Ok(AnalysisOutcome::Superseded);
        }
        info!("Analysis result: {}", emotion);

        let (location, recommendations) = tokio::select! {
            _ = token.cancelled() => return Ok(AnalysisOutcome::Superseded),
            result = self.fetch_recommendations(generation, &emotion.emotion, emotion.mood) => result,
        };

        let recommendations = recommendations.map_err(AnalysisError::from);
        if !self.publish_recommendations(generation, &recommendations) {
            return Ok(AnalysisOutcome::Superseded);
        }

        Ok(AnalysisOutcome::Completed(AnalysisReport {
            emotion,
            recommendations,
            location,
        }))
    }

    /// Fetch recommendations again. Requires a successful analysis first.
    pub async fn recommend(&self, emotion: &str, mood: Mood) -> Result<Vec<Song>, AnalysisError> {
        if self.view.borrow().emotion.is_none() {
            return Err(AnalysisError::NoAnalysis);
        }
        if !self.session.is_authenticated() {
            return Err(AnalysisError::MissingCredential);
        }

        let (generation, token) = self.begin_request();
        self.publish(generation, |view| {
            view.phase = AnalysisPhase::Recommending;
            view.recommendation_error = None;
        });

        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!("Recommendation request superseded");
                return Ok(Vec::new());
            }
            (_, result) = self.fetch_recommendations(generation, emotion, mood) => result.map_err(AnalysisError::from),
        };

        self.publish_recommendations(generation, &result);
        result
    }

    fn publish_recommendations(
        &self,
        generation: u64,
        result: &Result<Vec<Song>, AnalysisError>,
    ) -> bool {
        self.publish(generation, |view| {
            view.phase = AnalysisPhase::Done;
            match result {
                Ok(songs) => {
                    view.songs = songs.clone();
                    view.recommendation_error = None;
                }
                Err(e) => {
                    view.songs = Vec::new();
                    view.recommendation_error = Some(e.user_message());
                }
            }
        })
    }

    async fn classify(&self, input: &AnalysisInput) -> Result<EmotionResult, ClientError> {
        match input {
            AnalysisInput::Text(text) => {
                match self.backend.analyze_text(text, AnalysisRoute::Primary).await {
                    Err(e @ ClientError::Backend { .. }) if self.fallback_enabled => {
                        warn!("Primary analysis failed ({}), trying fallback", e);
                        self.backend.analyze_text(text, AnalysisRoute::Fallback).await
                    }
                    result => result,
                }
            }
            AnalysisInput::Audio(payload) => self.backend.analyze_audio(payload).await,
        }
    }

    async fn fetch_recommendations(
        &self,
        generation: u64,
        emotion: &str,
        mood: Mood,
    ) -> (Option<Location>, Result<Vec<Song>, ClientError>) {
        let location = self.location().await;
        let published = location.clone();
        self.publish(generation, |view| view.location = published);

        let result = self
            .backend
            .recommendations(emotion, mood, location.as_ref())
            .await;
        (location, result)
    }

    async fn location(&self) -> Option<Location> {
        if !self.use_location.load(Ordering::Relaxed) {
            return None;
        }
        let geoip = self.geoip.as_ref()?;
        match geoip.locate().await {
            Ok(location) => Some(location),
            Err(e) => {
                warn!("GeoIP lookup failed, recommending without location: {}", e);
                None
            }
        }
    }
}
