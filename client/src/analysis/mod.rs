pub(crate) mod models;
mod orchestrator;

pub use models::{AnalysisInput, EmotionResult, Mood, Song};
pub use orchestrator::{
    AnalysisError, AnalysisOrchestrator, AnalysisOutcome, AnalysisPhase, AnalysisReport,
    AnalysisView,
};
