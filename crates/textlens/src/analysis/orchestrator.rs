use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::{debug, info, warn};

use super::domain::{AnalysisMode, AnalysisRequest, AnalysisResult};
use super::gateway::{AnalysisGateway, GatewayError};
use super::interpreter::ScoreInterpreter;
use crate::config::AnalysisProfile;

/// Rejection raised locally, before anything reaches the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("text must contain at least one non-whitespace character")]
    Validation,
    #[error("a {0} analysis is already pending")]
    Busy(AnalysisMode),
    #[error("{0} analysis is not enabled for this client")]
    ModeUnavailable(AnalysisMode),
}

/// Outcome of a submit-and-wait round trip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Lifecycle of the most recent request. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState {
    Idle,
    Pending(AnalysisMode),
    Succeeded(AnalysisResult),
    Failed {
        error: GatewayError,
        mode: AnalysisMode,
    },
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    pub fn has_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&GatewayError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pending(_) => "Pending",
            Self::Succeeded(_) => "Succeeded",
            Self::Failed { .. } => "Failed",
        }
    }
}

/// Identifies one accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

struct InFlight {
    ticket: RequestTicket,
    mode: AnalysisMode,
    receiver: oneshot::Receiver<Result<AnalysisResult, GatewayError>>,
}

/// Owns the request state machine. At most one gateway call is outstanding;
/// submitting while one is pending is rejected rather than queued.
///
/// `submit` spawns the gateway call on the ambient tokio runtime and returns
/// immediately. The outcome is applied by `settle` or `try_settle`.
pub struct RequestOrchestrator<G> {
    gateway: Arc<G>,
    interpreter: ScoreInterpreter,
    modes: Vec<AnalysisMode>,
    mode: AnalysisMode,
    state: RequestState,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

impl<G> RequestOrchestrator<G>
where
    G: AnalysisGateway + 'static,
{
    pub fn new(gateway: Arc<G>, profile: &AnalysisProfile) -> Self {
        Self::with_interpreter(gateway, profile, ScoreInterpreter::default())
    }

    pub fn with_interpreter(
        gateway: Arc<G>,
        profile: &AnalysisProfile,
        interpreter: ScoreInterpreter,
    ) -> Self {
        let modes = profile.modes.clone();
        let mode = modes.first().copied().unwrap_or(AnalysisMode::Readability);

        Self {
            gateway,
            interpreter,
            modes,
            mode,
            state: RequestState::Idle,
            in_flight: None,
            next_ticket: 1,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn has_error(&self) -> bool {
        self.state.has_error()
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.state.result()
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn modes(&self) -> &[AnalysisMode] {
        &self.modes
    }

    /// Choose the mode the next submission targets. Never touches the state.
    pub fn select_mode(&mut self, mode: AnalysisMode) -> Result<(), SubmitError> {
        if !self.modes.contains(&mode) {
            return Err(SubmitError::ModeUnavailable(mode));
        }
        self.mode = mode;
        Ok(())
    }

    /// Validate `text` and start the gateway call for the selected mode.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the call is spawned
    /// onto the current runtime.
    pub fn submit(&mut self, text: &str) -> Result<RequestTicket, SubmitError> {
        if let RequestState::Pending(mode) = self.state {
            return Err(SubmitError::Busy(mode));
        }
        let request = AnalysisRequest::new(text, self.mode)?;

        let ticket = RequestTicket(self.next_ticket);
        self.next_ticket += 1;

        let mode = request.mode();
        let (sender, receiver) = oneshot::channel();
        let gateway = Arc::clone(&self.gateway);
        tokio::spawn(async move {
            let outcome = gateway.send(&request).await;
            if sender.send(outcome).is_err() {
                debug!(%mode, "analysis completed after its orchestrator was dropped");
            }
        });

        debug!(%mode, ticket = ticket.0, "analysis request submitted");
        self.state = RequestState::Pending(mode);
        self.in_flight = Some(InFlight {
            ticket,
            mode,
            receiver,
        });
        Ok(ticket)
    }

    /// Wait for the in-flight request, if any, and apply its outcome.
    pub async fn settle(&mut self) -> &RequestState {
        if let Some(in_flight) = self.in_flight.take() {
            let outcome = in_flight
                .receiver
                .await
                .unwrap_or_else(|_| Err(abandoned()));
            self.apply(in_flight.mode, outcome);
        }
        &self.state
    }

    /// Apply the in-flight outcome only if it has already arrived.
    pub fn try_settle(&mut self) -> bool {
        let Some(in_flight) = self.in_flight.as_mut() else {
            return false;
        };

        let outcome = match in_flight.receiver.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Closed) => Err(abandoned()),
        };

        let mode = in_flight.mode;
        self.in_flight = None;
        self.apply(mode, outcome);
        true
    }

    /// Apply an outcome delivered by a caller-driven continuation. Outcomes
    /// for any ticket other than the in-flight one are dropped.
    pub fn complete(
        &mut self,
        ticket: RequestTicket,
        outcome: Result<AnalysisResult, GatewayError>,
    ) -> bool {
        match self.in_flight.take() {
            Some(in_flight) if in_flight.ticket == ticket => {
                self.apply(in_flight.mode, outcome);
                true
            }
            other => {
                self.in_flight = other;
                debug!(ticket = ticket.0, "discarding stale analysis outcome");
                false
            }
        }
    }

    /// Submit and wait for the outcome.
    pub async fn analyze(&mut self, text: &str) -> Result<&AnalysisResult, AnalysisError> {
        self.submit(text)?;
        match self.settle().await {
            RequestState::Succeeded(result) => Ok(result),
            RequestState::Failed { error, .. } => Err(error.clone().into()),
            RequestState::Idle | RequestState::Pending(_) => Err(abandoned().into()),
        }
    }

    fn apply(&mut self, mode: AnalysisMode, outcome: Result<AnalysisResult, GatewayError>) {
        self.state = match outcome {
            Ok(result) if result.mode() == mode => {
                let result = result.interpreted(&self.interpreter);
                info!(%mode, "analysis succeeded");
                RequestState::Succeeded(result)
            }
            Ok(result) => {
                let error = GatewayError::InvalidResponse(format!(
                    "expected a {mode} result, received {}",
                    result.mode()
                ));
                warn!(%mode, %error, "analysis failed");
                RequestState::Failed { error, mode }
            }
            Err(error) => {
                warn!(%mode, %error, "analysis failed");
                RequestState::Failed { error, mode }
            }
        };
    }
}

fn abandoned() -> GatewayError {
    GatewayError::Unreachable("analysis task ended without a response".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::domain::{RawScores, ReadabilitySummary, Summary, ToneSummary};
    use crate::analysis::gateway::EndpointMap;
    use crate::analysis::interpreter::GradeBand;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeGateway {
        outcome: Result<AnalysisResult, GatewayError>,
        calls: Mutex<Vec<AnalysisRequest>>,
    }

    impl FakeGateway {
        fn returning(outcome: Result<AnalysisResult, GatewayError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<AnalysisRequest> {
            self.calls.lock().expect("calls mutex").clone()
        }
    }

    #[async_trait]
    impl AnalysisGateway for FakeGateway {
        async fn send(&self, request: &AnalysisRequest) -> Result<AnalysisResult, GatewayError> {
            self.calls.lock().expect("calls mutex").push(request.clone());
            match &self.outcome {
                Ok(result) if result.mode() != request.mode() => {
                    Ok(AnalysisResult::new(Summary::empty(request.mode()), None))
                }
                other => other.clone(),
            }
        }
    }

    fn profile(modes: &[AnalysisMode]) -> AnalysisProfile {
        AnalysisProfile {
            modes: modes.to_vec(),
            endpoints: EndpointMap::per_mode(),
            ..AnalysisProfile::default()
        }
    }

    fn all_modes() -> AnalysisProfile {
        profile(&AnalysisMode::ordered())
    }

    fn readability_result(ease: f64) -> AnalysisResult {
        AnalysisResult::new(
            Summary::Readability(ReadabilitySummary {
                overall_readability: Some("Very Easy".to_string()),
                education_level: Some("Grade 3".to_string()),
                ..ReadabilitySummary::default()
            }),
            Some([("flesch_reading_ease", ease)].into_iter().collect::<RawScores>()),
        )
    }

    #[tokio::test]
    async fn blank_text_is_rejected_without_calling_the_gateway() {
        let gateway = FakeGateway::returning(Ok(readability_result(95.0)));
        let mut orchestrator = RequestOrchestrator::new(gateway.clone(), &all_modes());

        assert_eq!(orchestrator.submit("  \n\t"), Err(SubmitError::Validation));
        orchestrator.settle().await;

        assert_eq!(orchestrator.state(), &RequestState::Idle);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn blank_text_leaves_a_terminal_state_untouched() {
        let gateway = FakeGateway::returning(Err(GatewayError::ServerRejected(503)));
        let mut orchestrator = RequestOrchestrator::new(gateway.clone(), &all_modes());
        orchestrator.submit("Some text").expect("accepted");
        orchestrator.settle().await;
        let before = orchestrator.state().clone();

        assert_eq!(orchestrator.submit(""), Err(SubmitError::Validation));
        assert_eq!(orchestrator.state(), &before);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn successful_request_moves_through_pending_to_succeeded() {
        let gateway = FakeGateway::returning(Ok(readability_result(95.0)));
        let mut orchestrator = RequestOrchestrator::new(gateway.clone(), &all_modes());

        orchestrator.submit("The cat sat.").expect("accepted");
        assert_eq!(
            orchestrator.state(),
            &RequestState::Pending(AnalysisMode::Readability)
        );
        assert!(orchestrator.is_loading());

        orchestrator.settle().await;
        let result = orchestrator.result().expect("succeeded");
        assert_eq!(result.mode(), AnalysisMode::Readability);
        assert_eq!(
            result.interpretation().map(|found| found.level),
            Some(GradeBand::VeryEasy)
        );
        assert!(!orchestrator.is_loading());
        assert!(!orchestrator.has_error());

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].text(), "The cat sat.");
    }

    #[tokio::test]
    async fn submit_while_pending_is_busy_and_keeps_state() {
        let gateway = FakeGateway::returning(Ok(readability_result(50.0)));
        let mut orchestrator = RequestOrchestrator::new(gateway.clone(), &all_modes());

        orchestrator.submit("first").expect("accepted");
        assert_eq!(
            orchestrator.submit("second"),
            Err(SubmitError::Busy(AnalysisMode::Readability))
        );
        assert_eq!(
            orchestrator.state(),
            &RequestState::Pending(AnalysisMode::Readability)
        );

        orchestrator.settle().await;
        assert_eq!(gateway.calls().len(), 1);
        assert_eq!(gateway.calls()[0].text(), "first");
    }

    #[tokio::test]
    async fn failure_is_recorded_and_resubmission_is_accepted() {
        let gateway = FakeGateway::returning(Err(GatewayError::ServerRejected(500)));
        let mut orchestrator = RequestOrchestrator::new(gateway, &all_modes());

        orchestrator.submit("The cat sat.").expect("accepted");
        orchestrator.settle().await;
        assert_eq!(
            orchestrator.state(),
            &RequestState::Failed {
                error: GatewayError::ServerRejected(500),
                mode: AnalysisMode::Readability,
            }
        );
        assert!(orchestrator.has_error());

        orchestrator.submit("The cat sat again.").expect("resubmission");
        assert_eq!(
            orchestrator.state(),
            &RequestState::Pending(AnalysisMode::Readability)
        );
    }

    #[tokio::test]
    async fn mode_switch_changes_target_but_not_state() {
        let tone = AnalysisResult::new(
            Summary::Tone(ToneSummary {
                dominant_tone: Some("Formal".to_string()),
                ..ToneSummary::default()
            }),
            None,
        );
        let gateway = FakeGateway::returning(Ok(tone));
        let mut orchestrator = RequestOrchestrator::new(gateway.clone(), &all_modes());

        orchestrator
            .select_mode(AnalysisMode::Tone)
            .expect("tone enabled");
        assert_eq!(orchestrator.state(), &RequestState::Idle);

        orchestrator.submit("Dear Sir or Madam").expect("accepted");
        orchestrator
            .select_mode(AnalysisMode::Plagiarism)
            .expect("switch while pending");
        assert_eq!(
            orchestrator.state(),
            &RequestState::Pending(AnalysisMode::Tone)
        );

        orchestrator.settle().await;
        let result = orchestrator.result().expect("succeeded");
        assert_eq!(result.mode(), AnalysisMode::Tone);
        assert!(result.interpretation().is_none());
        assert_eq!(orchestrator.mode(), AnalysisMode::Plagiarism);
        assert_eq!(gateway.calls()[0].mode(), AnalysisMode::Tone);
    }

    #[tokio::test]
    async fn disabled_modes_cannot_be_selected() {
        let gateway = FakeGateway::returning(Ok(readability_result(70.0)));
        let mut orchestrator =
            RequestOrchestrator::new(gateway, &profile(&[AnalysisMode::Readability]));

        assert_eq!(
            orchestrator.select_mode(AnalysisMode::Plagiarism),
            Err(SubmitError::ModeUnavailable(AnalysisMode::Plagiarism))
        );
        assert_eq!(orchestrator.mode(), AnalysisMode::Readability);
    }

    #[tokio::test]
    async fn stale_completions_are_discarded() {
        let gateway = FakeGateway::returning(Ok(readability_result(30.0)));
        let mut orchestrator = RequestOrchestrator::new(gateway, &all_modes());

        let ticket = orchestrator.submit("current").expect("accepted");
        let stale = RequestTicket(ticket.0 + 41);

        assert!(!orchestrator.complete(stale, Err(GatewayError::ServerRejected(502))));
        assert_eq!(
            orchestrator.state(),
            &RequestState::Pending(AnalysisMode::Readability)
        );

        assert!(orchestrator.complete(ticket, Ok(readability_result(30.0))));
        assert!(orchestrator.result().is_some());
        assert!(!orchestrator.complete(ticket, Err(GatewayError::ServerRejected(502))));
        assert!(orchestrator.result().is_some());
    }

    struct PanickingGateway;

    #[async_trait]
    impl AnalysisGateway for PanickingGateway {
        async fn send(&self, _request: &AnalysisRequest) -> Result<AnalysisResult, GatewayError> {
            panic!("gateway task crashed");
        }
    }

    fn ended_without_response() -> RequestState {
        RequestState::Failed {
            error: abandoned(),
            mode: AnalysisMode::Readability,
        }
    }

    #[tokio::test]
    async fn settle_fails_as_unreachable_when_the_task_dies() {
        let mut orchestrator = RequestOrchestrator::new(Arc::new(PanickingGateway), &all_modes());

        orchestrator.submit("The cat sat.").expect("accepted");
        let state = orchestrator.settle().await.clone();

        assert_eq!(state, ended_without_response());
        assert!(matches!(
            orchestrator.state().error(),
            Some(GatewayError::Unreachable(_))
        ));
        orchestrator.submit("again").expect("resubmission accepted");
    }

    #[tokio::test]
    async fn try_settle_fails_as_unreachable_when_the_task_dies() {
        let mut orchestrator = RequestOrchestrator::new(Arc::new(PanickingGateway), &all_modes());
        orchestrator.submit("The cat sat.").expect("accepted");

        let mut settled = false;
        for _ in 0..200 {
            if orchestrator.try_settle() {
                settled = true;
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        assert!(settled, "outcome never arrived");
        assert_eq!(orchestrator.state(), &ended_without_response());
    }

    #[tokio::test]
    async fn try_settle_applies_once_the_outcome_arrives() {
        let gateway = FakeGateway::returning(Ok(readability_result(10.0)));
        let mut orchestrator = RequestOrchestrator::new(gateway, &all_modes());

        assert!(!orchestrator.try_settle());
        orchestrator.submit("poll me").expect("accepted");
        assert!(!orchestrator.try_settle());

        while !orchestrator.try_settle() {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            orchestrator
                .result()
                .and_then(|result| result.interpretation())
                .map(|found| found.level),
            Some(GradeBand::VeryDifficult)
        );
    }

    #[tokio::test]
    async fn analyze_surfaces_gateway_errors() {
        let gateway = FakeGateway::returning(Err(GatewayError::Unreachable("refused".into())));
        let mut orchestrator = RequestOrchestrator::new(gateway, &all_modes());

        match orchestrator.analyze("hello").await {
            Err(AnalysisError::Gateway(GatewayError::Unreachable(reason))) => {
                assert_eq!(reason, "refused")
            }
            other => panic!("expected unreachable error, got {other:?}"),
        }
    }
}
