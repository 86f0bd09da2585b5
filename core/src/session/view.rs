//! View state reduced from session events.

use std::collections::BTreeMap;

use super::events::{Role, SessionEvent, Speaker, TranscriptEntry};
use crate::Phase;

/// Everything the courtroom UI shows, rebuilt from the latest session events.
///
/// The server sends the full litigant transcript with every update. The view
/// additionally remembers the judge's remark for each round and the final
/// verdict, and merges them into [`courtroom_transcript`](Self::courtroom_transcript).
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    join_code: Option<String>,
    own_role: Option<Role>,
    players: Vec<Role>,
    scenario: Option<String>,
    turn_order: Vec<Role>,
    active_role: Option<Role>,
    round: u32,
    transcript: Vec<TranscriptEntry>,
    remarks: BTreeMap<u32, String>,
    verdict: Option<String>,
    winner: Option<Role>,
    last_error: Option<String>,
    game_over: bool,
}

impl SessionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the view.
    pub fn apply(&mut self, event: SessionEvent) {
        log::debug!("session event: {}", event.name());

        match event {
            SessionEvent::SessionCreated(created) => {
                *self = Self {
                    join_code: Some(created.join_code),
                    ..Self::default()
                };
            }
            SessionEvent::RoleAssigned(assigned) => {
                self.own_role = Some(assigned.role);
            }
            SessionEvent::PlayerJoined(players) => {
                self.players = players;
            }
            SessionEvent::GameStarted(started) => {
                self.scenario = Some(started.scenario);
                self.players = started.players;
                self.turn_order = started.turn_order;
                self.active_role = None;
                self.round = 0;
                self.transcript.clear();
                self.remarks.clear();
                self.verdict = None;
                self.winner = None;
                self.game_over = false;
            }
            SessionEvent::TurnUpdate(update) => {
                if self.ignore_after_verdict("turnUpdate") {
                    return;
                }
                self.active_role = Some(update.active_role);
                self.transcript = update.transcript;
                self.round = update.round;
            }
            SessionEvent::RoundUpdate(update) => {
                if self.ignore_after_verdict("roundUpdate") {
                    return;
                }
                self.round = update.round;
                self.transcript = update.transcript;
                self.remarks.insert(update.round, update.llm_thoughts);
            }
            SessionEvent::FinalVerdict(verdict) => {
                self.transcript = verdict.transcript;
                self.verdict = Some(verdict.verdict);
                self.winner = verdict.winner;
                self.active_role = None;
                self.game_over = true;
                log::info!("final verdict delivered");
            }
            SessionEvent::Error(error) => {
                log::warn!("session server error: {}", error.message);
                self.last_error = Some(error.message);
            }
        }
    }

    fn ignore_after_verdict(&self, event: &str) -> bool {
        if self.game_over {
            log::warn!("ignoring {event} after the final verdict");
        }
        self.game_over
    }

    pub fn join_code(&self) -> Option<&str> {
        self.join_code.as_deref()
    }

    /// Role assigned to this client, when it is a player.
    pub fn own_role(&self) -> Option<Role> {
        self.own_role
    }

    pub fn players(&self) -> &[Role] {
        &self.players
    }

    pub fn scenario(&self) -> Option<&str> {
        self.scenario.as_deref()
    }

    pub fn turn_order(&self) -> &[Role] {
        &self.turn_order
    }

    pub fn active_role(&self) -> Option<Role> {
        self.active_role
    }

    /// Whether it is this client's turn to submit.
    pub fn is_own_turn(&self) -> bool {
        self.own_role.is_some() && self.own_role == self.active_role
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// The litigants' submissions as last sent by the server.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// The judge's most recent interim commentary.
    pub fn interim_opinion(&self) -> Option<&str> {
        self.remarks.values().next_back().map(String::as_str)
    }

    pub fn verdict(&self) -> Option<&str> {
        self.verdict.as_deref()
    }

    pub fn winner(&self) -> Option<Role> {
        self.winner
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_game_started(&self) -> bool {
        self.scenario.is_some()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Litigant submissions interleaved with the judge's lines.
    ///
    /// Each round's remark follows that round's last submission; the verdict,
    /// if any, comes last.
    pub fn courtroom_transcript(&self) -> Vec<TranscriptEntry> {
        let mut lines = Vec::with_capacity(self.transcript.len() + self.remarks.len() + 1);
        let mut remarks = self.remarks.iter().peekable();

        for entry in &self.transcript {
            while let Some((&round, text)) = remarks.next_if(|(round, _)| **round < entry.round) {
                lines.push(judge_line(text, round));
            }
            lines.push(entry.clone());
        }
        for (&round, text) in remarks {
            lines.push(judge_line(text, round));
        }
        if let Some(verdict) = &self.verdict {
            lines.push(judge_line(verdict, self.round));
        }
        lines
    }

    /// Speaker of the last line of [`courtroom_transcript`](Self::courtroom_transcript).
    pub fn latest_speaker(&self) -> Option<Speaker> {
        if self.verdict.is_some() {
            return Some(Speaker::Judge);
        }
        let last_remark = self.remarks.keys().next_back().copied();
        match (self.transcript.last(), last_remark) {
            (Some(entry), Some(round)) if round >= entry.round => Some(Speaker::Judge),
            (Some(entry), _) => Some(entry.role),
            (None, Some(_)) => Some(Speaker::Judge),
            (None, None) => None,
        }
    }

    /// Camera phase for the latest speaker; [`Phase::Lobby`] before anyone speaks.
    pub fn phase(&self) -> Phase {
        match self.latest_speaker() {
            None => Phase::Lobby,
            Some(Speaker::Judge) => Phase::JudgeTalking,
            Some(Speaker::Prosecutor) => Phase::ProsecutorTalking,
            Some(Speaker::Defense) => Phase::DefenseTalking,
        }
    }
}

fn judge_line(text: &str, round: u32) -> TranscriptEntry {
    TranscriptEntry {
        role: Speaker::Judge,
        text: text.to_owned(),
        round,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::events::*;

    fn entry(role: Speaker, text: &str, round: u32) -> TranscriptEntry {
        TranscriptEntry {
            role,
            text: text.into(),
            round,
        }
    }

    fn started() -> SessionView {
        let mut view = SessionView::new();
        view.apply(SessionEvent::SessionCreated(SessionCreated {
            join_code: "QX7T2M".into(),
        }));
        view.apply(SessionEvent::GameStarted(GameStarted {
            scenario: "Someone ate the last slice.".into(),
            players: vec![Role::Prosecutor, Role::Defense],
            turn_order: vec![Role::Defense, Role::Prosecutor],
        }));
        view
    }

    #[test]
    fn empty_view_is_lobby() {
        let view = SessionView::new();
        assert_eq!(view.phase(), Phase::Lobby);
        assert!(view.courtroom_transcript().is_empty());
    }

    #[test]
    fn latest_submission_picks_litigant_camera() {
        let mut view = started();
        view.apply(SessionEvent::TurnUpdate(TurnUpdate {
            active_role: Role::Prosecutor,
            transcript: vec![entry(Speaker::Defense, "I was framed.", 1)],
            round: 1,
        }));
        assert_eq!(view.phase(), Phase::DefenseTalking);
        assert_eq!(view.active_role(), Some(Role::Prosecutor));
    }

    #[test]
    fn judge_remark_holds_until_next_submission() {
        let mut view = started();
        let round_one = vec![
            entry(Speaker::Defense, "I was framed.", 1),
            entry(Speaker::Prosecutor, "Crumbs on your shirt.", 1),
        ];
        view.apply(SessionEvent::RoundUpdate(RoundUpdate {
            round: 1,
            llm_thoughts: "The crumbs are compelling.".into(),
            transcript: round_one.clone(),
        }));
        assert_eq!(view.phase(), Phase::JudgeTalking);

        view.apply(SessionEvent::TurnUpdate(TurnUpdate {
            active_role: Role::Defense,
            transcript: round_one.clone(),
            round: 2,
        }));
        assert_eq!(view.phase(), Phase::JudgeTalking);

        let mut round_two = round_one;
        round_two.push(entry(Speaker::Defense, "Those are my crumbs.", 2));
        view.apply(SessionEvent::TurnUpdate(TurnUpdate {
            active_role: Role::Prosecutor,
            transcript: round_two,
            round: 2,
        }));
        assert_eq!(view.phase(), Phase::DefenseTalking);
    }

    #[test]
    fn interim_opinion_is_the_latest_round_remark() {
        let mut view = started();
        assert_eq!(view.interim_opinion(), None);

        for (round, thoughts) in [(1, "Crumbs everywhere."), (2, "The alibi holds up.")] {
            view.apply(SessionEvent::RoundUpdate(RoundUpdate {
                round,
                llm_thoughts: thoughts.into(),
                transcript: vec![entry(Speaker::Defense, "I was framed.", round)],
            }));
        }
        assert_eq!(view.interim_opinion(), Some("The alibi holds up."));

        view.apply(SessionEvent::FinalVerdict(FinalVerdict {
            verdict: "Not guilty.".into(),
            transcript: Vec::new(),
            winner: Some(Role::Defense),
        }));
        assert_eq!(view.interim_opinion(), Some("The alibi holds up."));

        view.apply(SessionEvent::SessionCreated(SessionCreated {
            join_code: "NEXT01".into(),
        }));
        assert_eq!(view.interim_opinion(), None);
    }

    #[test]
    fn merged_transcript_interleaves_remarks() {
        let mut view = started();
        let transcript = vec![
            entry(Speaker::Defense, "a", 1),
            entry(Speaker::Prosecutor, "b", 1),
            entry(Speaker::Defense, "c", 2),
        ];
        view.apply(SessionEvent::RoundUpdate(RoundUpdate {
            round: 1,
            llm_thoughts: "hmm".into(),
            transcript: transcript[..2].to_vec(),
        }));
        view.apply(SessionEvent::TurnUpdate(TurnUpdate {
            active_role: Role::Prosecutor,
            transcript,
            round: 2,
        }));

        let speakers: Vec<Speaker> = view
            .courtroom_transcript()
            .iter()
            .map(|line| line.role)
            .collect();
        assert_eq!(
            speakers,
            vec![
                Speaker::Defense,
                Speaker::Prosecutor,
                Speaker::Judge,
                Speaker::Defense
            ]
        );
        assert_eq!(
            view.latest_speaker(),
            view.courtroom_transcript().last().map(|line| line.role)
        );
    }

    #[test]
    fn verdict_ends_the_game() {
        let mut view = started();
        view.apply(SessionEvent::FinalVerdict(FinalVerdict {
            verdict: "The defense wins.".into(),
            transcript: vec![entry(Speaker::Prosecutor, "last word", 2)],
            winner: Some(Role::Defense),
        }));
        assert!(view.is_game_over());
        assert_eq!(view.phase(), Phase::JudgeTalking);
        assert_eq!(view.winner(), Some(Role::Defense));
        assert_eq!(
            view.courtroom_transcript().last().map(|l| l.text.as_str()),
            Some("The defense wins.")
        );

        view.apply(SessionEvent::TurnUpdate(TurnUpdate {
            active_role: Role::Defense,
            transcript: vec![],
            round: 3,
        }));
        assert_eq!(view.transcript().len(), 1, "late updates are ignored");
    }

    #[test]
    fn new_session_resets_view() {
        let mut view = started();
        view.apply(SessionEvent::RoleAssigned(RoleAssigned {
            role: Role::Defense,
        }));
        view.apply(SessionEvent::SessionCreated(SessionCreated {
            join_code: "NEW123".into(),
        }));
        assert_eq!(view.join_code(), Some("NEW123"));
        assert_eq!(view.scenario(), None);
        assert_eq!(view.own_role(), None);
    }

    #[test]
    fn own_turn_tracks_active_role() {
        let mut view = started();
        view.apply(SessionEvent::RoleAssigned(RoleAssigned {
            role: Role::Defense,
        }));
        view.apply(SessionEvent::TurnUpdate(TurnUpdate {
            active_role: Role::Defense,
            transcript: vec![],
            round: 1,
        }));
        assert!(view.is_own_turn());
    }

    #[test]
    fn server_error_is_recorded() {
        let mut view = SessionView::new();
        view.apply(SessionEvent::Error(ServerError {
            message: "Not your turn.".into(),
        }));
        assert_eq!(view.last_error(), Some("Not your turn."));
    }
}
