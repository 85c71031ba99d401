//! Device sessions.
//!
//! A session is a single stateful channel: one command in flight at a time,
//! output read only after a settle delay. There is no prompt matching; device
//! banners and pagers are not reliably regex-matchable.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::Target;

/// Timing for one `send`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Wait after writing the command before reading.
    pub settle: Duration,
    /// Upper bound on the whole send/read cycle.
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("failed to connect to {target}: {message}")]
    Connect { target: String, message: String },

    #[error("command failed: {0}")]
    Command(String),

    #[error("command did not settle within {0:?}")]
    Timeout(Duration),

    #[error("session lost: {0}")]
    Disconnected(String),
}

impl SessionError {
    /// Fatal errors end the run; the rest are recorded against one attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::Connect { .. } | SessionError::Disconnected(_)
        )
    }
}

pub trait Session {
    /// Send one command and return everything the device printed.
    fn send(&mut self, command: &str, options: &SendOptions) -> Result<Vec<u8>, SessionError>;

    /// Discard any output that arrived since the last read.
    fn flush(&mut self) -> Result<(), SessionError>;

    fn disconnect(&mut self) -> Result<(), SessionError>;
}

pub trait Connector {
    fn connect(&self, target: &Target) -> Result<Box<dyn Session>, SessionError>;
}

// ============================================================================
// Scripted session (deterministic double for tests and dry runs)
// ============================================================================

/// A canned reply for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    Output(Vec<u8>),
    Fail(String),
    Timeout,
    Disconnect,
}

impl ScriptedReply {
    pub fn text(s: &str) -> Self {
        ScriptedReply::Output(s.as_bytes().to_vec())
    }
}

/// Observable channel operations, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Flush,
    Send(String),
    Disconnect,
}

/// Session that answers from a script keyed by exact command text.
///
/// Queued replies for a command are consumed in order; the last one repeats.
/// Unscripted commands return empty output. Clones share one event log.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSession {
    replies: HashMap<String, VecDeque<ScriptedReply>>,
    events: Arc<Mutex<Vec<SessionEvent>>>,
    connect_error: Option<String>,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, command: &str, reply: ScriptedReply) -> Self {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_text(self, command: &str, output: &str) -> Self {
        self.on(command, ScriptedReply::text(output))
    }

    /// Make `connect` fail, as an unreachable device would.
    pub fn refuse_connections(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    /// Commands sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Send(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    fn next_reply(&mut self, command: &str) -> ScriptedReply {
        match self.replies.get_mut(command) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or(ScriptedReply::Output(Vec::new())),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(ScriptedReply::Output(Vec::new())),
            None => ScriptedReply::Output(Vec::new()),
        }
    }
}

impl Session for ScriptedSession {
    fn send(&mut self, command: &str, options: &SendOptions) -> Result<Vec<u8>, SessionError> {
        self.events.lock().push(SessionEvent::Send(command.to_string()));
        match self.next_reply(command) {
            ScriptedReply::Output(bytes) => Ok(bytes),
            ScriptedReply::Fail(message) => Err(SessionError::Command(message)),
            ScriptedReply::Timeout => Err(SessionError::Timeout(options.timeout)),
            ScriptedReply::Disconnect => {
                Err(SessionError::Disconnected("connection reset by peer".to_string()))
            }
        }
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        self.events.lock().push(SessionEvent::Flush);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SessionError> {
        self.events.lock().push(SessionEvent::Disconnect);
        Ok(())
    }
}

impl Connector for ScriptedSession {
    fn connect(&self, target: &Target) -> Result<Box<dyn Session>, SessionError> {
        if let Some(message) = &self.connect_error {
            return Err(SessionError::Connect {
                target: format!("{}:{}", target.host, target.port),
                message: message.clone(),
            });
        }
        Ok(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> SendOptions {
        SendOptions {
            settle: Duration::ZERO,
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn queued_replies_are_consumed_then_last_repeats() {
        let mut s = ScriptedSession::new()
            .on_text("show vlan", "first")
            .on_text("show vlan", "second");
        assert_eq!(s.send("show vlan", &opts()).unwrap(), b"first");
        assert_eq!(s.send("show vlan", &opts()).unwrap(), b"second");
        assert_eq!(s.send("show vlan", &opts()).unwrap(), b"second");
    }

    #[test]
    fn unscripted_command_is_empty() {
        let mut s = ScriptedSession::new();
        assert!(s.send("show clock", &opts()).unwrap().is_empty());
    }

    #[test]
    fn only_connect_and_disconnect_are_fatal() {
        assert!(SessionError::Disconnected("x".into()).is_fatal());
        assert!(SessionError::Connect {
            target: "h".into(),
            message: "m".into()
        }
        .is_fatal());
        assert!(!SessionError::Command("x".into()).is_fatal());
        assert!(!SessionError::Timeout(Duration::from_secs(1)).is_fatal());
    }

    #[test]
    fn clones_share_the_event_log() {
        let script = ScriptedSession::new();
        let mut session = script.connect(&Target::ssh("10.0.0.1")).unwrap();
        session.flush().unwrap();
        session.send("show version", &opts()).unwrap();
        session.disconnect().unwrap();
        assert_eq!(
            script.events(),
            vec![
                SessionEvent::Flush,
                SessionEvent::Send("show version".into()),
                SessionEvent::Disconnect
            ]
        );
    }
}
