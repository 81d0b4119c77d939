use std::sync::Arc;

use log::{info, warn};
use riff_storage::StorageKind;

use crate::analysis::AnalysisOrchestrator;
use crate::auth::Authenticator;
use crate::clients::{BackendClient, GeoIpClient};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::playlist::PlaylistExporter;
use crate::recording::{
    capture_backend, cleanup_old_recordings, CaptureController, MediaDevices, RecorderError,
};
use crate::session::{SessionContext, SessionStatus, TokenStore};

/// Every long-lived component, wired together once at startup.
pub struct App {
    pub config: ClientConfig,
    pub storage_kind: StorageKind,
    pub session: Arc<SessionContext>,
    pub backend: Arc<BackendClient>,
    pub auth: Authenticator,
    pub analysis: AnalysisOrchestrator,
    pub playlists: PlaylistExporter,
}

impl App {
    /// Start the capture worker. `media` is the host's browser media API,
    /// when there is one.
    pub fn capture_controller(
        &self,
        media: Option<Arc<dyn MediaDevices>>,
    ) -> Result<CaptureController, RecorderError> {
        let backend = capture_backend(&self.config, media);
        info!("Capture backend: {}", backend.name());
        CaptureController::spawn(backend, self.config.capture_limits())
    }
}

pub async fn setup_app(config: ClientConfig) -> Result<App, Error> {
    info!("Riff v{}", env!("CARGO_PKG_VERSION"));

    // Storage backend is chosen once for the whole process
    let storage_kind = StorageKind::detect();
    let storage = riff_storage::open(storage_kind, &config.storage_options())?;

    let session = Arc::new(SessionContext::new(TokenStore::new(storage)));
    let status = session.initialize().await;
    if status == SessionStatus::Anonymous {
        info!("No stored login");
    }

    // Clean up recordings left over from previous runs
    cleanup_old_recordings(&config.recordings_dir);

    let backend = Arc::new(BackendClient::new(&config, session.clone())?);

    let fallback = config.analyze_text_fallback_path.is_some();
    if fallback {
        warn!("Text analysis fallback endpoint enabled");
    }
    let analysis = AnalysisOrchestrator::new(backend.clone(), session.clone())
        .with_fallback(fallback)
        .with_geoip(GeoIpClient::new(backend.http().clone()));
    analysis.set_use_location(config.geo_ip);

    let auth = Authenticator::new(backend.clone(), session.clone());
    let playlists = PlaylistExporter::new(backend.clone(), session.clone());

    Ok(App {
        config,
        storage_kind,
        session,
        backend,
        auth,
        analysis,
        playlists,
    })
}
