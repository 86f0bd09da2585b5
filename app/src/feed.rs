//! Session events read as JSON lines.
//!
//! The window host cannot block on a socket or stdin, so [`EventFeed`] reads
//! on a background thread and hands parsed events over a channel. The render
//! tick drains whatever has arrived into the [`SessionView`] once per frame.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use circuit_court_core::{SessionEvent, SessionView};

use crate::error::AppError;

/// Parse one line. Blank lines and `#` comments yield `None`; so do malformed
/// lines, which are logged and skipped.
pub fn parse_line(line: &str) -> Option<SessionEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    match SessionEvent::from_json(line) {
        Ok(event) => Some(event),
        Err(err) => {
            log::warn!("Skipping malformed session event: {err}");
            None
        }
    }
}

/// Read every event from `reader`, skipping lines that do not parse.
pub fn read_events(reader: impl BufRead) -> io::Result<Vec<SessionEvent>> {
    let mut events = Vec::new();
    for line in reader.lines() {
        if let Some(event) = parse_line(&line?) {
            events.push(event);
        }
    }
    Ok(events)
}

/// Background reader of session events.
pub struct EventFeed {
    receiver: Receiver<SessionEvent>,
    closed: bool,
}

impl EventFeed {
    /// Start reading from `source`: a file path, or `-` for stdin.
    pub fn open(source: &str) -> Result<Self, AppError> {
        if source == "-" {
            log::info!("Reading session events from stdin");
            return Ok(Self::spawn(BufReader::new(io::stdin())));
        }
        let file = File::open(source).map_err(|source_err| AppError::Events {
            path: source.to_owned(),
            source: source_err,
        })?;
        log::info!("Reading session events from {source}");
        Ok(Self::spawn(BufReader::new(file)))
    }

    /// Feed events from any line reader.
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (sender, receiver) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("session-events".into())
            .spawn(move || {
                for line in reader.lines() {
                    let line = match line {
                        Ok(line) => line,
                        Err(err) => {
                            log::error!("Session event stream failed: {err}");
                            break;
                        }
                    };
                    let Some(event) = parse_line(&line) else {
                        continue;
                    };
                    if sender.send(event).is_err() {
                        break;
                    }
                }
                log::debug!("session event stream ended");
            });
        if let Err(err) = spawned {
            log::error!("Failed to start event reader: {err}");
        }

        Self {
            receiver,
            closed: false,
        }
    }

    /// Apply every event received since the last call. Returns how many were applied.
    pub fn drain(&mut self, view: &mut SessionView) -> usize {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    log::debug!("session event {}", event.name());
                    view.apply(event);
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        log::info!("Session event feed closed");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        applied
    }

    /// Whether the reader has finished and everything was drained.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
