//! End-to-end checks of the client pipeline against a scripted backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use riff_lib::analysis::{
    AnalysisError, AnalysisInput, AnalysisOrchestrator, AnalysisOutcome, AnalysisPhase,
    EmotionResult, Mood, Song,
};
use riff_lib::auth::Authenticator;
use riff_lib::clients::{
    AnalysisRoute, Backend, BackendClient, ClientError, GeoIpClient, Location, Profile,
};
use riff_lib::config::ClientConfig;
use riff_lib::playlist::{
    PlaylistError, PlaylistExporter, PlaylistHandle, PlaylistOptions, PlaylistRequest,
    DEFAULT_LOCATION_DESCRIPTION,
};
use riff_lib::recording::{
    AudioPayload, CaptureController, CaptureLimits, CaptureState, ChunkSink, MediaDeviceError,
    MediaDevices, MediaRecorderBackend, MediaStream, MIME_MP4,
};
use riff_lib::session::{Credential, SessionContext, SessionStatus, TokenStore};
use riff_storage::{FileStorage, MemoryStorage};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;

#[derive(Default)]
struct FakeBackend {
    primary_fails: bool,
    recommendations_fail: bool,
    playlist_fails: bool,
    logout_fails: bool,
    calls: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    playlists: Mutex<Vec<PlaylistRequest>>,
}

impl FakeBackend {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Hold `analyze_text(text)` until the returned gate is notified.
    fn gate(&self, text: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(text.to_string(), gate.clone());
        gate
    }

    async fn wait_for_call(&self, call: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.calls().iter().any(|c| c == call) {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("call never happened");
    }
}

fn emotion_for(text: &str) -> EmotionResult {
    let (emotion, mood) = match text {
        "a" | "what a gloomy day" => ("sadness", Mood::Negative),
        _ => ("joy", Mood::Positive),
    };
    EmotionResult {
        emotion: emotion.to_string(),
        mood,
        specific_emotion: None,
        transcript: None,
    }
}

fn song(name: &str) -> Song {
    Song {
        name: name.to_string(),
        artist: "Band".to_string(),
        spotify_url: None,
        url: None,
        image_url: None,
        preview_url: None,
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn exchange_code(&self, code: &str) -> Result<Credential, ClientError> {
        self.record(format!("exchange_code:{}", code));
        Credential::new(format!("token-{}", code)).ok_or_else(|| ClientError::Decode("empty".into()))
    }

    async fn profile(&self) -> Result<Profile, ClientError> {
        self.record("profile".to_string());
        Ok(Profile {
            display_name: Some("Ada".to_string()),
            id: Some("ada123".to_string()),
        })
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.record("logout".to_string());
        if self.logout_fails {
            return Err(ClientError::Network("offline".to_string()));
        }
        Ok(())
    }

    async fn analyze_text(
        &self,
        text: &str,
        route: AnalysisRoute,
    ) -> Result<EmotionResult, ClientError> {
        self.record(format!("analyze_text:{}", text));
        if route == AnalysisRoute::Primary && self.primary_fails {
            return Err(ClientError::Backend {
                status: 500,
                message: "model offline".to_string(),
            });
        }

        let gate = self.gates.lock().unwrap().get(text).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(emotion_for(text))
    }

    async fn analyze_audio(&self, payload: &AudioPayload) -> Result<EmotionResult, ClientError> {
        let bytes = payload.read_bytes().await?;
        self.record(format!("analyze_audio:{}:{}", payload.mime_type, bytes.len()));
        Ok(EmotionResult {
            transcript: Some("hello there".to_string()),
            ..emotion_for("hello there")
        })
    }

    async fn recommendations(
        &self,
        emotion: &str,
        mood: Mood,
        location: Option<&Location>,
    ) -> Result<Vec<Song>, ClientError> {
        match location.and_then(|l| l.country.as_deref()) {
            Some(country) => self.record(format!("recommendations:{}:{}@{}", emotion, mood, country)),
            None => self.record(format!("recommendations:{}:{}", emotion, mood)),
        }
        if self.recommendations_fail {
            return Err(ClientError::Backend {
                status: 502,
                message: "catalog unavailable".to_string(),
            });
        }
        Ok(vec![song(&format!("{} song", emotion))])
    }

    async fn create_playlist(
        &self,
        request: &PlaylistRequest,
    ) -> Result<PlaylistHandle, ClientError> {
        self.record("create_playlist".to_string());
        if self.playlist_fails {
            return Err(ClientError::Backend {
                status: 401,
                message: "invalid token".to_string(),
            });
        }
        self.playlists.lock().unwrap().push(request.clone());
        Ok(PlaylistHandle {
            id: Some("pl1".to_string()),
            url: Some("https://open.spotify.com/playlist/pl1".to_string()),
            ..Default::default()
        })
    }
}

async fn session(logged_in: bool) -> Arc<SessionContext> {
    let session = Arc::new(SessionContext::new(TokenStore::new(Arc::new(
        MemoryStorage::new(),
    ))));
    session.initialize().await;
    if logged_in {
        session
            .set_credential(Credential::new("token"))
            .await
            .unwrap();
    }
    session
}

async fn orchestrator(backend: &Arc<FakeBackend>) -> Arc<AnalysisOrchestrator> {
    Arc::new(AnalysisOrchestrator::new(
        backend.clone(),
        session(true).await,
    ))
}

#[tokio::test]
async fn test_analysis_feeds_its_exact_result_into_recommendations() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;

    let outcome = orchestrator
        .analyze(AnalysisInput::text("I feel great"))
        .await
        .unwrap();
    let AnalysisOutcome::Completed(report) = outcome else {
        panic!("expected a completed analysis, got {:?}", outcome);
    };

    assert_eq!(report.emotion, emotion_for("I feel great"));
    assert_eq!(report.recommendations.unwrap(), vec![song("joy song")]);
    assert_eq!(
        backend.calls(),
        vec!["analyze_text:I feel great", "recommendations:joy:positive"]
    );

    let view = orchestrator.view();
    assert_eq!(view.phase, AnalysisPhase::Done);
    assert_eq!(view.emotion, Some(emotion_for("I feel great")));
    assert_eq!(view.songs, vec![song("joy song")]);
    assert_eq!(view.analysis_error, None);
    assert_eq!(view.recommendation_error, None);
}

#[tokio::test]
async fn test_blank_text_is_skipped() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;
    let before = orchestrator.view();

    let outcome = orchestrator.analyze(AnalysisInput::text("   ")).await.unwrap();

    assert!(matches!(outcome, AnalysisOutcome::Skipped));
    assert!(backend.calls().is_empty());
    assert_eq!(orchestrator.view(), before);
}

#[tokio::test]
async fn test_analysis_requires_login() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = AnalysisOrchestrator::new(backend.clone(), session(false).await);

    let result = orchestrator.analyze(AnalysisInput::text("hello")).await;

    assert!(matches!(result, Err(AnalysisError::MissingCredential)));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_stale_response_never_overwrites_newer_result() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;
    let gate = backend.gate("a");

    let first = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.analyze(AnalysisInput::text("a")).await })
    };
    backend.wait_for_call("analyze_text:a").await;

    let second = orchestrator.analyze(AnalysisInput::text("b")).await.unwrap();
    assert!(matches!(second, AnalysisOutcome::Completed(_)));

    // Let the first request's response arrive late
    gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(matches!(first, AnalysisOutcome::Superseded));

    let view = orchestrator.view();
    assert_eq!(view.emotion, Some(emotion_for("b")));
    assert_eq!(view.songs, vec![song("joy song")]);
    assert!(!backend.calls().contains(&"recommendations:sadness:negative".to_string()));
}

#[tokio::test]
async fn test_cancel_discards_in_flight_analysis() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;
    let _gate = backend.gate("what a gloomy day");

    let pending = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            orchestrator
                .analyze(AnalysisInput::text("what a gloomy day"))
                .await
        })
    };
    backend.wait_for_call("analyze_text:what a gloomy day").await;
    assert_eq!(orchestrator.view().phase, AnalysisPhase::Analyzing);

    orchestrator.cancel();

    let outcome = pending.await.unwrap().unwrap();
    assert!(matches!(outcome, AnalysisOutcome::Superseded));
    let view = orchestrator.view();
    assert_eq!(view.phase, AnalysisPhase::Idle);
    assert_eq!(view.emotion, None);
}

#[tokio::test]
async fn test_recommend_requires_prior_analysis() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;

    let result = orchestrator.recommend("joy", Mood::Positive).await;

    assert!(matches!(result, Err(AnalysisError::NoAnalysis)));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_recommend_replaces_song_list() {
    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;
    orchestrator
        .analyze(AnalysisInput::text("great"))
        .await
        .unwrap();

    let songs = orchestrator
        .recommend("sadness", Mood::Negative)
        .await
        .unwrap();

    assert_eq!(songs, vec![song("sadness song")]);
    assert_eq!(orchestrator.view().songs, vec![song("sadness song")]);
    // The analysis result itself is untouched
    assert_eq!(orchestrator.view().emotion, Some(emotion_for("great")));
}

#[tokio::test]
async fn test_recommendation_failure_keeps_emotion() {
    let backend = Arc::new(FakeBackend {
        recommendations_fail: true,
        ..Default::default()
    });
    let orchestrator = orchestrator(&backend).await;

    let outcome = orchestrator
        .analyze(AnalysisInput::text("great"))
        .await
        .unwrap();
    let AnalysisOutcome::Completed(report) = outcome else {
        panic!("expected a completed analysis, got {:?}", outcome);
    };
    assert_eq!(report.emotion, emotion_for("great"));
    assert!(matches!(
        report.recommendations,
        Err(AnalysisError::Client(ClientError::Backend { status: 502, .. }))
    ));

    let view = orchestrator.view();
    assert_eq!(view.phase, AnalysisPhase::Done);
    assert_eq!(view.emotion, Some(emotion_for("great")));
    assert!(view.songs.is_empty());
    assert_eq!(
        view.recommendation_error.as_deref(),
        Some("catalog unavailable")
    );
    assert_eq!(view.analysis_error, None);
}

#[tokio::test]
async fn test_fallback_route_after_primary_failure() {
    let backend = Arc::new(FakeBackend {
        primary_fails: true,
        ..Default::default()
    });

    let without = orchestrator(&backend).await;
    let result = without.analyze(AnalysisInput::text("great")).await;
    assert!(matches!(
        result,
        Err(AnalysisError::Client(ClientError::Backend { status: 500, .. }))
    ));
    assert_eq!(without.view().phase, AnalysisPhase::Failed);
    assert!(without.view().analysis_error.is_some());

    let with = AnalysisOrchestrator::new(backend.clone(), session(true).await).with_fallback(true);
    let outcome = with.analyze(AnalysisInput::text("great")).await.unwrap();
    assert!(matches!(outcome, AnalysisOutcome::Completed(_)));
    assert_eq!(with.view().emotion, Some(emotion_for("great")));
}

#[tokio::test]
async fn test_playlist_export_checks_before_calling_backend() {
    let backend = Arc::new(FakeBackend::default());

    let logged_out = PlaylistExporter::new(backend.clone(), session(false).await);
    let result = logged_out
        .create_playlist(PlaylistOptions {
            songs: vec![song("joy song")],
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(PlaylistError::MissingCredential)));

    let exporter = PlaylistExporter::new(backend.clone(), session(true).await);
    let result = exporter.create_playlist(PlaylistOptions::default()).await;
    assert!(matches!(result, Err(PlaylistError::EmptySongList)));

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_playlist_export_sends_derived_request() {
    let backend = Arc::new(FakeBackend::default());
    let exporter = PlaylistExporter::new(backend.clone(), session(true).await);

    let handle = exporter
        .create_playlist(PlaylistOptions {
            emotion: Some("joy".to_string()),
            mood: Some("positive".to_string()),
            songs: vec![song("joy song"), song("another")],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(handle.id.as_deref(), Some("pl1"));
    let sent = backend.playlists.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].name, "Joy positive Vibes");
    assert!(!sent[0].is_public);
    assert_eq!(sent[0].songs.len(), 2);
    assert_eq!(sent[0].songs[1].name, "another");
}

#[tokio::test]
async fn test_playlist_backend_error_is_surfaced() {
    let backend = Arc::new(FakeBackend {
        playlist_fails: true,
        ..Default::default()
    });
    let exporter = PlaylistExporter::new(backend.clone(), session(true).await);

    let err = exporter
        .create_playlist(PlaylistOptions {
            songs: vec![song("joy song")],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlaylistError::Client(ClientError::Backend { status: 401, .. })
    ));
    assert!(err.to_string().contains("invalid token"));
}

#[tokio::test]
async fn test_login_and_logout() {
    let backend = Arc::new(FakeBackend {
        logout_fails: true,
        ..Default::default()
    });
    let session = session(false).await;
    let auth = Authenticator::new(backend.clone(), session.clone());

    let name = auth.login_with_code("abc").await.unwrap();
    assert_eq!(name, "Ada");
    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.credential().unwrap().expose(), "token-abc");

    // A failed backend logout still clears the local session
    auth.logout().await.unwrap();
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(backend.calls().last().map(String::as_str), Some("logout"));
}

#[tokio::test]
async fn test_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let open = || {
        SessionContext::new(TokenStore::new(Arc::new(FileStorage::new(path.clone()))))
    };

    let first = open();
    assert_eq!(first.status(), SessionStatus::Unknown);
    assert_eq!(first.initialize().await, SessionStatus::Anonymous);
    first
        .set_credential(Credential::new("persisted"))
        .await
        .unwrap();

    let second = open();
    assert_eq!(second.status(), SessionStatus::Unknown);
    assert_eq!(second.initialize().await, SessionStatus::Authenticated);
    assert_eq!(second.credential().unwrap().expose(), "persisted");

    second.clear().await.unwrap();
    let third = open();
    assert_eq!(third.initialize().await, SessionStatus::Anonymous);
}

struct HostMedia {
    sink: Mutex<Option<ChunkSink>>,
}

struct HostStream;

impl MediaStream for HostStream {
    fn stop(&mut self) {}
}

impl MediaDevices for HostMedia {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        mime_type == MIME_MP4
    }

    fn open(
        &self,
        _mime_type: &str,
        sink: ChunkSink,
    ) -> Result<Box<dyn MediaStream>, MediaDeviceError> {
        *self.sink.lock().unwrap() = Some(sink);
        Ok(Box::new(HostStream))
    }
}

#[tokio::test]
async fn test_recording_flows_into_analysis() {
    let media = Arc::new(HostMedia {
        sink: Mutex::new(None),
    });
    let controller = CaptureController::spawn(
        Box::new(MediaRecorderBackend::new(media.clone())),
        CaptureLimits::default(),
    )
    .unwrap();

    controller.start().await.unwrap();
    assert_eq!(controller.state(), CaptureState::Capturing);

    let sink = media.sink.lock().unwrap().clone().unwrap();
    sink.push(b"chunk-one");
    sink.push(b"");
    sink.push(b"chunk-two");

    let payload = controller.stop().await.unwrap().unwrap();
    assert_eq!(controller.state(), CaptureState::Idle);
    assert_eq!(payload.mime_type, MIME_MP4);
    assert!(!payload.truncated);

    let backend = Arc::new(FakeBackend::default());
    let orchestrator = orchestrator(&backend).await;
    let outcome = orchestrator
        .analyze(AnalysisInput::Audio(payload))
        .await
        .unwrap();

    let AnalysisOutcome::Completed(report) = outcome else {
        panic!("expected a completed analysis, got {:?}", outcome);
    };
    assert_eq!(report.emotion.transcript.as_deref(), Some("hello there"));
    assert_eq!(
        backend.calls(),
        vec!["analyze_audio:audio/mp4:18", "recommendations:joy:positive"]
    );
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&raw).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    l.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap())
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&raw).to_string()
}

/// Answer each request by path with a canned JSON body, keeping the raw
/// requests. Both the backend and the GeoIP lookup point here.
async fn serve_routes(
    routes: Vec<(&'static str, &'static str)>,
) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = requests.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let raw = read_request(&mut socket).await;
            let path = raw.split_whitespace().nth(1).unwrap_or("").to_string();
            let (status_line, body) = match routes.iter().find(|(p, _)| *p == path) {
                Some((_, body)) => ("200 OK", *body),
                None => ("404 Not Found", r#"{"error": "not found"}"#),
            };
            seen.lock().unwrap().push(raw);

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (base_url, requests)
}

fn request_to(requests: &Mutex<Vec<String>>, prefix: &str) -> String {
    requests
        .lock()
        .unwrap()
        .iter()
        .find(|raw| raw.starts_with(prefix))
        .cloned()
        .unwrap_or_else(|| panic!("no request starting with {:?}", prefix))
}

fn json_body(raw: &str) -> serde_json::Value {
    let (_, body) = raw.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_location_mode_builds_location_playlist() {
    let (base_url, requests) = serve_routes(vec![
        (
            "/json/",
            r#"{"status": "success", "country": "Ireland", "countryCode": "IE", "city": "Dublin"}"#,
        ),
        ("/api/analyze_text/", r#"{"emotion": "joy", "mood": "positive"}"#),
        (
            "/api/get_mood_recommendations/",
            r#"{"songs": [{"name": "Song", "artist": "Band", "spotify_url": "https://open.spotify.com/x", "image_url": "https://img.example/x.jpg"}]}"#,
        ),
        (
            "/api/auth/create-playlist/",
            r#"{"playlist_id": "p1", "playlist_url": "https://open.spotify.com/playlist/p1"}"#,
        ),
    ])
    .await;

    let session = session(true).await;
    let config = ClientConfig {
        backend_url: base_url.clone(),
        ..ClientConfig::default()
    };
    let backend = Arc::new(BackendClient::new(&config, session.clone()).unwrap());
    let geoip = GeoIpClient::with_url(backend.http().clone(), format!("{}/json/", base_url));
    let orchestrator = AnalysisOrchestrator::new(backend.clone(), session.clone()).with_geoip(geoip);
    orchestrator.set_use_location(true);

    let outcome = orchestrator
        .analyze(AnalysisInput::text("sunny afternoon"))
        .await
        .unwrap();
    let AnalysisOutcome::Completed(report) = outcome else {
        panic!("expected a completed analysis, got {:?}", outcome);
    };

    let dublin = Location {
        city: Some("Dublin".to_string()),
        country: Some("Ireland".to_string()),
        country_code: Some("IE".to_string()),
    };
    assert_eq!(report.location, Some(dublin.clone()));
    assert_eq!(orchestrator.view().location, Some(dublin));

    let geoip_request = request_to(&requests, "GET /json/");
    assert!(!geoip_request.to_ascii_lowercase().contains("authorization:"));

    let recommendations = request_to(&requests, "POST /api/get_mood_recommendations/");
    assert_eq!(
        json_body(&recommendations),
        serde_json::json!({
            "emotion": "joy",
            "mood": "positive",
            "country_code": "IE",
            "city": "dublin",
            "country": "Ireland",
        })
    );

    let songs = report.recommendations.unwrap();
    let options = PlaylistOptions::from_analysis(&report.emotion, report.location.as_ref(), songs);
    let handle = PlaylistExporter::new(backend.clone(), session.clone())
        .create_playlist(options)
        .await
        .unwrap();
    assert_eq!(handle.id.as_deref(), Some("p1"));

    let created = json_body(&request_to(&requests, "POST /api/auth/create-playlist/"));
    assert_eq!(created["name"], "Ireland Joy Vibes");
    assert_eq!(created["description"], DEFAULT_LOCATION_DESCRIPTION);
    assert_eq!(created["public"], false);
    assert_eq!(created["songs"][0]["spotify_url"], "https://open.spotify.com/x");
    assert_eq!(created["songs"][0]["image_url"], "https://img.example/x.jpg");
}

#[tokio::test]
async fn test_geoip_failure_recommends_without_location() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}/json/", listener.local_addr().unwrap());
    drop(listener);

    let backend = Arc::new(FakeBackend::default());
    let orchestrator = AnalysisOrchestrator::new(backend.clone(), session(true).await)
        .with_geoip(GeoIpClient::with_url(reqwest::Client::new(), dead_url));
    orchestrator.set_use_location(true);

    let outcome = orchestrator
        .analyze(AnalysisInput::text("great"))
        .await
        .unwrap();
    let AnalysisOutcome::Completed(report) = outcome else {
        panic!("expected a completed analysis, got {:?}", outcome);
    };

    assert_eq!(report.location, None);
    assert_eq!(report.recommendations.unwrap(), vec![song("joy song")]);
    assert_eq!(orchestrator.view().location, None);
    assert_eq!(
        backend.calls(),
        vec!["analyze_text:great", "recommendations:joy:positive"]
    );

    let options = PlaylistOptions::from_analysis(&report.emotion, None, vec![song("joy song")]);
    assert_eq!(options.derived_name(), "Joy positive Vibes");
}

#[tokio::test]
async fn test_only_the_token_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let session = Arc::new(SessionContext::new(TokenStore::new(Arc::new(
        FileStorage::new(path.clone()),
    ))));
    session.initialize().await;

    let backend = Arc::new(FakeBackend::default());
    Authenticator::new(backend.clone(), session.clone())
        .login_with_code("abc")
        .await
        .unwrap();

    let orchestrator = AnalysisOrchestrator::new(backend.clone(), session.clone());
    orchestrator.set_use_location(true);
    orchestrator
        .analyze(AnalysisInput::text("great"))
        .await
        .unwrap();
    PlaylistExporter::new(backend.clone(), session.clone())
        .create_playlist(PlaylistOptions {
            is_public: true,
            songs: vec![song("joy song")],
            ..Default::default()
        })
        .await
        .unwrap();

    let stored: BTreeMap<String, String> =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored.keys().collect::<Vec<_>>(), vec!["access_token"]);
    assert_eq!(stored["access_token"], "token-abc");
}
