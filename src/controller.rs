use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::error;
use crate::client::{AnswerService, AskError, AskResponse};
use crate::conversation::{ConversationState, ConversationView, RESULT_COUNT};

type RequestTask = JoinHandle<Result<AskResponse, AskError>>;

/// Owns the conversation and the one request that may be in flight.
///
/// All mutation happens through `&mut self` on the event loop; the request
/// itself runs on a spawned task and is folded back in by [`poll`](Self::poll).
pub struct ConversationController<S> {
    state: ConversationState,
    service: Arc<S>,
    in_flight: Option<RequestTask>,
}

impl<S: AnswerService + 'static> ConversationController<S> {
    pub fn new(service: S) -> Self {
        Self::with_shared(Arc::new(service))
    }

    pub fn with_shared(service: Arc<S>) -> Self {
        Self {
            state: ConversationState::new(),
            service,
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn view(&self) -> ConversationView<'_> {
        self.state.view()
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.state.update_input(text);
    }

    pub fn apply_suggestion(&mut self, text: &str) {
        self.state.apply_suggestion(text);
    }

    /// Submit `raw`, or the pending input when `None`. Returns whether a
    /// request was issued; blank input and submissions during loading are
    /// silently dropped.
    pub fn submit(&mut self, raw: Option<&str>) -> bool {
        let Some(query) = self.state.begin_submit(raw) else {
            return false;
        };

        let service = Arc::clone(&self.service);
        self.in_flight = Some(tokio::spawn(async move {
            service.ask(&query, RESULT_COUNT).await
        }));
        true
    }

    /// Fold a finished request into the conversation. Does nothing while the
    /// request is still running.
    pub async fn poll(&mut self) {
        let finished = self
            .in_flight
            .as_ref()
            .map(|task| task.is_finished())
            .unwrap_or(false);

        if finished {
            self.wait_settled().await;
        }
    }

    /// Wait for the in-flight request, if any, and settle it.
    pub async fn wait_settled(&mut self) {
        let Some(task) = self.in_flight.take() else {
            return;
        };

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(error = %join_err, "request task did not complete");
                Err(AskError::Task(join_err.to_string()))
            }
        };
        self.state.settle(outcome);
    }
}

impl<S> Drop for ConversationController<S> {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}
