//! Replay session: answers commands from recorded output files.
//!
//! Each file is named after the sanitized command (`show vlan 10` reads
//! `show_vlan_10.txt`). Useful for dry runs of a command set and for
//! re-capturing evidence from a bench recording.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Target;
use crate::session::{Connector, SendOptions, Session, SessionError};

/// File name a recorded command is looked up under.
///
/// Runs of characters other than ASCII alphanumerics, `-` and `.` collapse to
/// one `_`; the result is lowercased and trimmed of `_`.
pub fn file_name_for(command: &str) -> String {
    let mut out = String::with_capacity(command.len() + 4);
    let mut pending_sep = false;
    for ch in command.trim().chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out.push_str(".txt");
    out
}

#[derive(Debug, Clone)]
pub struct ReplayConnector {
    dir: PathBuf,
}

impl ReplayConnector {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Connector for ReplayConnector {
    fn connect(&self, target: &Target) -> Result<Box<dyn Session>, SessionError> {
        if !self.dir.is_dir() {
            return Err(SessionError::Connect {
                target: format!("{}:{}", target.host, target.port),
                message: format!("replay directory {} not found", self.dir.display()),
            });
        }
        debug!(dir = %self.dir.display(), "replay session opened");
        Ok(Box::new(ReplaySession {
            dir: self.dir.clone(),
            closed: false,
        }))
    }
}

#[derive(Debug)]
pub struct ReplaySession {
    dir: PathBuf,
    closed: bool,
}

impl ReplaySession {
    fn recording(&self, command: &str) -> PathBuf {
        self.dir.join(file_name_for(command))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Session for ReplaySession {
    fn send(&mut self, command: &str, _options: &SendOptions) -> Result<Vec<u8>, SessionError> {
        if self.closed {
            return Err(SessionError::Disconnected("replay session closed".to_string()));
        }
        let path = self.recording(command);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                SessionError::Command(format!("no recording for '{command}'"))
            }
            _ => SessionError::Command(format!("{}: {e}", path.display())),
        })
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), SessionError> {
        self.closed = true;
        Ok(())
    }
}
