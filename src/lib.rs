//! Terminal chat client for a question-answering service.
//!
//! [`controller::ConversationController`] owns the conversation and the
//! single in-flight request; everything under `app`, `handler`, `tui` and
//! `ui` is the terminal surface around it.

pub mod app;
pub mod client;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod handler;
pub mod logging;
pub mod render;
pub mod tui;
pub mod ui;

pub use client::{AnswerService, AskClient, AskError, AskResponse, Source};
pub use config::Config;
pub use controller::ConversationController;
pub use conversation::{ConversationState, ConversationView, Message, Role};
pub use render::{AnswerRenderer, MarkdownRenderer};
