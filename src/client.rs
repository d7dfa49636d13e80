use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL used when neither the CLI, the environment nor the config file set one.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AskRequest {
    pub query: String,
    pub k: usize,
}

/// A page citation attached to an answer. Extra fields sent by the service are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    sources: Option<Vec<Source>>,
}

impl AskResponse {
    pub fn new(answer: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            answer: answer.into(),
            sources: Some(sources),
        }
    }

    /// Sources in the order the service returned them; absent or `null` is empty.
    pub fn into_parts(self) -> (String, Vec<Source>) {
        (self.answer, self.sources.unwrap_or_default())
    }
}

/// Why a request to the answering service did not produce an answer.
///
/// The user only ever sees one apology message; the variants exist for the log.
#[derive(Debug, Error)]
pub enum AskError {
    /// The request could not be sent or the connection failed
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status
    #[error("service returned status {status}")]
    Service { status: StatusCode },

    /// The body was received but is not an answer
    #[error("could not decode answer: {0}")]
    Decode(#[from] serde_json::Error),

    /// The background request task ended without a result
    #[error("request task failed: {0}")]
    Task(String),
}

impl AskError {
    pub fn kind(&self) -> &'static str {
        match self {
            AskError::Transport(_) => "transport",
            AskError::Service { .. } => "service",
            AskError::Decode(_) => "decode",
            AskError::Task(_) => "task",
        }
    }
}

/// Anything that can turn a question into an answer.
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn ask(&self, query: &str, k: usize) -> Result<AskResponse, AskError>;
}

#[derive(Clone)]
pub struct AskClient {
    client: Client,
    base_url: String,
}

impl AskClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn ask_url(&self) -> String {
        format!("{}/ask", self.base_url)
    }
}

#[async_trait]
impl AnswerService for AskClient {
    async fn ask(&self, query: &str, k: usize) -> Result<AskResponse, AskError> {
        let request = AskRequest {
            query: query.to_string(),
            k,
        };

        let response = self
            .client
            .post(self.ask_url())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AskError::Service { status });
        }

        let body = response.text().await?;
        let answer: AskResponse = serde_json::from_str(&body)?;
        Ok(answer)
    }
}
