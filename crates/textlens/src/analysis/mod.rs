//! Request lifecycle for the remote analysis service: validated requests,
//! mode-specific gateway dispatch, and local readability banding.

pub mod domain;
pub mod gateway;
pub mod interpreter;
pub mod orchestrator;

pub use domain::{
    AnalysisMode, AnalysisRequest, AnalysisResult, PlagiarismSummary, RawScores,
    ReadabilitySummary, Summary, ToneSummary, UnknownMode,
};
pub use gateway::{AnalysisGateway, EndpointMap, GatewayError, HttpAnalysisGateway};
pub use interpreter::{GradeBand, Interpretation, ScoreInterpreter, DEFAULT_EASE_METRIC};
pub use orchestrator::{
    AnalysisError, RequestOrchestrator, RequestState, RequestTicket, SubmitError,
};
