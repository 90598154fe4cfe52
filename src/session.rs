//! Chat session controller.
//!
//! Holds the transcript, the pending input and the awaiting-reply flag, and
//! is the only thing allowed to mutate them. A session relays one question
//! at a time to an [`AnswerService`] and appends exactly one bot message per
//! accepted submission, whatever the outcome.

use tracing::{debug, info, warn};

use crate::answer::AnswerService;
use crate::error::AnswerError;

pub const GREETING: &str = "Welcome to Nova! I'm an AI assistant built to answer your questions about Chetanya Rathi's resume. How can I help?";

pub const NO_ANSWER: &str = "No answer found.";

pub const CONNECTION_TROUBLE: &str = "Sorry, I'm having trouble connecting. Please check if the local server is running and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }
}

/// Reacts to transcript or awaiting-state changes. Runs after every mutation.
pub trait SessionObserver {
    fn on_change(&mut self, transcript: &[Message], awaiting_reply: bool);
}

impl SessionObserver for () {
    fn on_change(&mut self, _transcript: &[Message], _awaiting_reply: bool) {}
}

#[derive(Debug)]
pub struct ChatSession<O = ()> {
    transcript: Vec<Message>,
    pending_input: String,
    awaiting_reply: bool,
    observer: O,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::with_observer(())
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: SessionObserver> ChatSession<O> {
    /// Start a session seeded with the greeting.
    pub fn with_observer(observer: O) -> Self {
        let mut session = Self {
            transcript: vec![Message::bot(GREETING)],
            pending_input: String::new(),
            awaiting_reply: false,
            observer,
        };
        session.notify();
        session
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn update_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// First half of a submission: gate check, user message, awaiting flag.
    ///
    /// Returns the raw text to send, or `None` if the submission is rejected
    /// because the text is blank or a reply is still outstanding.
    pub fn begin_submit(&mut self, text: &str) -> Option<String> {
        if self.awaiting_reply {
            debug!("Submission ignored: a reply is still pending");
            return None;
        }
        if text.trim().is_empty() {
            debug!("Submission ignored: input is blank");
            return None;
        }

        self.transcript.push(Message::user(text));
        self.awaiting_reply = true;
        self.notify();

        Some(text.to_string())
    }

    /// Second half of a submission: record the outcome and release the session.
    pub fn settle(&mut self, outcome: Result<Option<String>, AnswerError>) {
        if !self.awaiting_reply {
            warn!("Discarding reply outcome: no request is outstanding");
            return;
        }

        let reply = match outcome {
            Ok(Some(text)) if !text.is_empty() => {
                info!(outcome = "answered", chars = text.chars().count(), "Reply settled");
                text
            }
            Ok(_) => {
                info!(outcome = "empty", "Reply settled");
                NO_ANSWER.to_string()
            }
            Err(e) => {
                warn!(outcome = "failed", kind = e.kind(), error = %e, "Reply retrieval failed");
                CONNECTION_TROUBLE.to_string()
            }
        };

        self.transcript.push(Message::bot(reply));
        self.awaiting_reply = false;
        self.pending_input.clear();
        self.notify();
    }

    /// Submit `text` and wait for the service to settle.
    ///
    /// Returns `false` if the submission was rejected.
    pub async fn submit<S>(&mut self, service: &S, text: &str) -> bool
    where
        S: AnswerService + ?Sized,
    {
        let Some(input) = self.begin_submit(text) else {
            return false;
        };

        let outcome = service.ask(&input).await;
        self.settle(outcome);
        true
    }

    fn notify(&mut self) {
        self.observer.on_change(&self.transcript, self.awaiting_reply);
    }
}
