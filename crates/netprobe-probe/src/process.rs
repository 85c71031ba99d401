//! Subprocess-backed session (`ssh -tt user@host` by default).
//!
//! The child's stdout and stderr are pumped by reader threads into a channel.
//! A send writes one line, waits the settle delay, then keeps reading until the
//! channel has been quiet for one settle interval. The per-command timeout
//! bounds the whole cycle.

use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::Target;
use crate::session::{Connector, SendOptions, Session, SessionError};

/// Minimum quiet interval used when the settle delay is zero.
const MIN_QUIET: Duration = Duration::from_millis(50);

/// Launches a program per connection. Arguments may contain `{host}`,
/// `{port}` and `{user}` tokens.
#[derive(Debug, Clone)]
pub struct ProcessConnector {
    pub program: String,
    pub args: Vec<String>,
    pub username: Option<String>,
}

impl ProcessConnector {
    pub fn ssh(username: Option<String>) -> Self {
        let destination = if username.is_some() {
            "{user}@{host}"
        } else {
            "{host}"
        };
        Self {
            program: "ssh".to_string(),
            args: vec![
                "-tt".to_string(),
                "-p".to_string(),
                "{port}".to_string(),
                destination.to_string(),
            ],
            username,
        }
    }

    fn render_args(&self, target: &Target) -> Vec<String> {
        self.args
            .iter()
            .map(|a| {
                a.replace("{host}", &target.host)
                    .replace("{port}", &target.port.to_string())
                    .replace("{user}", self.username.as_deref().unwrap_or(""))
            })
            .collect()
    }
}

impl Connector for ProcessConnector {
    fn connect(&self, target: &Target) -> Result<Box<dyn Session>, SessionError> {
        Ok(Box::new(self.spawn(target)?))
    }
}

impl ProcessConnector {
    fn spawn(&self, target: &Target) -> Result<ProcessSession, SessionError> {
        let args = self.render_args(target);
        let connect_err = |message: String| SessionError::Connect {
            target: format!("{}:{}", target.host, target.port),
            message,
        };

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| connect_err(format!("failed to spawn {}: {e}", self.program)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| connect_err("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| connect_err("child stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| connect_err("child stderr unavailable".to_string()))?;

        let (tx, rx) = mpsc::channel();
        let readers = vec![pump(stdout, tx.clone()), pump(stderr, tx)];
        debug!(program = %self.program, ?args, "session process spawned");

        Ok(ProcessSession {
            child,
            stdin: Some(stdin),
            rx,
            readers,
        })
    }
}

fn pump<R: Read + Send + 'static>(mut reader: R, tx: mpsc::Sender<Vec<u8>>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    if tx.send(buf[..n].to_vec()).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

pub struct ProcessSession {
    child: Child,
    stdin: Option<ChildStdin>,
    rx: Receiver<Vec<u8>>,
    readers: Vec<JoinHandle<()>>,
}

impl ProcessSession {
    fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| SessionError::Disconnected("session already closed".to_string()))?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush())
            .map_err(|e| SessionError::Disconnected(e.to_string()))
    }

    /// Append every chunk already buffered; returns how many there were.
    fn drain_into(&mut self, output: &mut Vec<u8>) -> usize {
        let mut chunks = 0;
        while let Ok(chunk) = self.rx.try_recv() {
            output.extend_from_slice(&chunk);
            chunks += 1;
        }
        chunks
    }
}

impl Session for ProcessSession {
    fn send(&mut self, command: &str, options: &SendOptions) -> Result<Vec<u8>, SessionError> {
        let started = Instant::now();
        self.write_line(command)?;
        let settle = options.settle.min(options.timeout / 2);
        std::thread::sleep(settle);

        let quiet = settle.max(MIN_QUIET);
        let mut output = Vec::new();
        loop {
            let remaining = options.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                // Output that stopped before the deadline is kept; output
                // still arriving at the deadline is not.
                if self.drain_into(&mut output) == 0 && !output.is_empty() {
                    return Ok(output);
                }
                return Err(SessionError::Timeout(options.timeout));
            }
            match self.rx.recv_timeout(quiet.min(remaining)) {
                Ok(chunk) => output.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) if quiet <= remaining => return Ok(output),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) if output.is_empty() => {
                    return Err(SessionError::Disconnected("session output closed".to_string()))
                }
                Err(RecvTimeoutError::Disconnected) => return Ok(output),
            }
        }
    }

    fn flush(&mut self) -> Result<(), SessionError> {
        loop {
            match self.rx.try_recv() {
                Ok(_) => continue,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => {
                    return Err(SessionError::Disconnected("session output closed".to_string()))
                }
            }
        }
    }

    fn disconnect(&mut self) -> Result<(), SessionError> {
        let _ = self.write_line("exit");
        self.stdin = None;

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(50))
                }
                Ok(None) => {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    break;
                }
                Err(e) => return Err(SessionError::Disconnected(e.to_string())),
            }
        }
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        Ok(())
    }
}

/// A session dropped without `disconnect` (e.g. after a lost transport)
/// still kills and reaps its child.
impl Drop for ProcessSession {
    fn drop(&mut self) {
        self.stdin = None;
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cat_session() -> Box<dyn Session> {
        let connector = ProcessConnector {
            program: "cat".to_string(),
            args: vec![],
            username: None,
        };
        connector.connect(&Target::ssh("localhost")).unwrap()
    }

    #[test]
    fn echoes_through_a_real_pipe() {
        let mut session = cat_session();
        let options = SendOptions {
            settle: Duration::from_millis(100),
            timeout: Duration::from_secs(5),
        };
        session.flush().unwrap();
        let out = session.send("show version", &options).unwrap();
        assert_eq!(out, b"show version\n");
        session.disconnect().unwrap();
    }

    #[test]
    fn settle_equal_to_timeout_still_reads_output() {
        let mut session = cat_session();
        let options = SendOptions {
            settle: Duration::from_millis(300),
            timeout: Duration::from_millis(300),
        };
        let out = session.send("show version", &options).unwrap();
        assert_eq!(out, b"show version\n");
        session.disconnect().unwrap();
    }

    #[test]
    fn dropped_session_reaps_its_child() {
        let connector = ProcessConnector {
            program: "cat".to_string(),
            args: vec![],
            username: None,
        };
        let session = connector.spawn(&Target::ssh("localhost")).unwrap();
        let pid = session.child.id().to_string();
        drop(session);

        let alive = Command::new("kill")
            .args(["-0", &pid])
            .stderr(Stdio::null())
            .status()
            .unwrap()
            .success();
        assert!(!alive);
    }

    #[test]
    fn spawn_failure_is_a_connect_error() {
        let connector = ProcessConnector {
            program: "/nonexistent/netprobe-ssh".to_string(),
            args: vec![],
            username: None,
        };
        let err = connector.connect(&Target::ssh("localhost")).err().unwrap();
        assert!(matches!(err, SessionError::Connect { .. }));
    }

    #[test]
    fn ssh_args_are_rendered() {
        let connector = ProcessConnector::ssh(Some("audit".to_string()));
        let args = connector.render_args(&Target::ssh("10.0.0.2").with_port(2222));
        assert_eq!(args, vec!["-tt", "-p", "2222", "audit@10.0.0.2"]);
    }
}
