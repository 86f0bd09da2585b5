//! Courtroom proceedings in the log.
//!
//! The window only renders the scene, so the text side of a session (join
//! code, case, transcript, the judge's interim opinion, the verdict) is
//! written to the log as it arrives.

use circuit_court_core::SessionView;

/// Remembers what has been logged so each line appears once.
#[derive(Debug, Default)]
pub struct ProceedingsLog {
    join_code: Option<String>,
    scenario: Option<String>,
    lines: usize,
    opinion: Option<String>,
    verdict: Option<String>,
}

impl ProceedingsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log whatever in `view` changed since the last call and return the
    /// messages in order.
    pub fn update(&mut self, view: &SessionView) -> Vec<String> {
        let mut messages = Vec::new();

        if view.join_code() != self.join_code.as_deref() {
            *self = Self {
                join_code: view.join_code().map(str::to_owned),
                ..Self::default()
            };
            if let Some(code) = view.join_code() {
                messages.push(format!("Session {code} is open"));
            }
        }

        if view.scenario() != self.scenario.as_deref() {
            self.scenario = view.scenario().map(str::to_owned);
            self.lines = 0;
            if let Some(scenario) = view.scenario() {
                messages.push(format!("Case: {scenario}"));
            }
        }

        let transcript = view.courtroom_transcript();
        if transcript.len() < self.lines {
            // The server replaced the transcript; start over.
            self.lines = 0;
        }
        for entry in &transcript[self.lines..] {
            messages.push(format!("[round {}] {}: {}", entry.round, entry.role, entry.text));
        }
        self.lines = transcript.len();

        if view.interim_opinion() != self.opinion.as_deref() {
            self.opinion = view.interim_opinion().map(str::to_owned);
            if self.opinion.is_some() {
                messages.push(format!("Interim opinion after round {}", view.round()));
            }
        }

        if view.verdict() != self.verdict.as_deref() {
            self.verdict = view.verdict().map(str::to_owned);
            if self.verdict.is_some() {
                messages.push(match view.winner() {
                    Some(winner) => format!("Verdict delivered: {winner} prevails"),
                    None => "Verdict delivered".to_owned(),
                });
            }
        }

        for message in &messages {
            log::info!("{message}");
        }
        messages
    }
}
