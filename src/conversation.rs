use tracing::{debug, info, warn};
use crate::client::{AskError, AskResponse, Source};

/// Number of passages the service is asked to retrieve for every question.
pub const RESULT_COUNT: usize = 10;

/// Content of the assistant message appended when a request fails.
pub const ERROR_APOLOGY: &str = "Sorry, I encountered an error while processing your request. \
Please make sure the server is running and try again.";

/// Topic shortcuts offered on the welcome screen.
pub const SUGGESTION_TOPICS: [&str; 5] = [
    "Asymptotic Notations",
    "Merge Sort",
    "Linked Lists",
    "Recursion",
    "Dynamic Programming",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub sources: Vec<Source>,
    pub is_error: bool,
    /// The user message this one answers (assistant messages only)
    pub replies_to: Option<u64>,
}

impl Message {
    fn user(id: u64, content: String) -> Self {
        Self {
            id,
            role: Role::User,
            content,
            sources: Vec::new(),
            is_error: false,
            replies_to: None,
        }
    }

    fn answer(id: u64, replies_to: Option<u64>, content: String, sources: Vec<Source>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content,
            sources,
            is_error: false,
            replies_to,
        }
    }

    fn apology(id: u64, replies_to: Option<u64>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: ERROR_APOLOGY.to_string(),
            sources: Vec::new(),
            is_error: true,
            replies_to,
        }
    }
}

/// Read-only projection of [`ConversationState`], recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversationView<'a> {
    pub is_empty_welcome_view: bool,
    pub messages: &'a [Message],
    pub is_awaiting_response: bool,
}

/// History, input buffer and request flags for one session.
#[derive(Debug)]
pub struct ConversationState {
    history: Vec<Message>,
    pending_input: String,
    is_loading: bool,
    show_welcome: bool,
    next_id: u64,
    awaiting: Option<u64>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            history: Vec::new(),
            pending_input: String::new(),
            is_loading: false,
            show_welcome: true,
            next_id: 0,
            awaiting: None,
        }
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn show_welcome(&self) -> bool {
        self.show_welcome
    }

    pub fn view(&self) -> ConversationView<'_> {
        ConversationView {
            is_empty_welcome_view: self.show_welcome && self.history.is_empty(),
            messages: &self.history,
            is_awaiting_response: self.is_loading,
        }
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub fn apply_suggestion(&mut self, text: &str) {
        self.pending_input = text.to_string();
    }

    /// Start a submission. Returns the trimmed question to send, or `None`
    /// when the text is blank or a request is already in flight; in that
    /// case nothing changes.
    pub fn begin_submit(&mut self, raw: Option<&str>) -> Option<String> {
        if self.is_loading {
            debug!("submission dropped: request already in flight");
            return None;
        }

        let query = raw.unwrap_or(self.pending_input.as_str()).trim().to_string();
        if query.is_empty() {
            debug!("submission dropped: empty input");
            return None;
        }

        self.show_welcome = false;
        let id = self.allocate_id();
        self.history.push(Message::user(id, query.clone()));
        self.pending_input.clear();
        self.is_loading = true;
        self.awaiting = Some(id);

        info!(query_len = query.len(), k = RESULT_COUNT, "question submitted");
        Some(query)
    }

    /// Apply the outcome of the in-flight request: exactly one assistant
    /// message is appended and loading ends. Outcomes arriving while no
    /// request is in flight are discarded.
    pub fn settle(&mut self, outcome: Result<AskResponse, AskError>) {
        if !self.is_loading {
            warn!("discarding request outcome: no request in flight");
            return;
        }

        let replies_to = self.awaiting.take();
        let id = self.allocate_id();
        let message = match outcome {
            Ok(response) => {
                let (answer, sources) = response.into_parts();
                info!(sources = sources.len(), "answer received");
                Message::answer(id, replies_to, answer, sources)
            }
            Err(err) => {
                warn!(kind = err.kind(), error = %err, "request failed");
                Message::apology(id, replies_to)
            }
        };

        self.history.push(message);
        self.is_loading = false;
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
