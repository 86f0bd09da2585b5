//! Wire model of the events broadcast by the realtime session server.
//!
//! Every event arrives as `{"event": "<name>", "data": <payload>}`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A litigant seat at the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Prosecutor,
    Defense,
}

impl Role {
    pub const fn name(self) -> &'static str {
        match self {
            Role::Prosecutor => "Prosecutor",
            Role::Defense => "Defense",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whoever is speaking in a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    Judge,
    Prosecutor,
    Defense,
}

impl From<Role> for Speaker {
    fn from(role: Role) -> Self {
        match role {
            Role::Prosecutor => Speaker::Prosecutor,
            Role::Defense => Speaker::Defense,
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Speaker::Judge => "Judge",
            Speaker::Prosecutor => "Prosecutor",
            Speaker::Defense => "Defense",
        })
    }
}

/// One submission in the server's transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Speaker,
    pub text: String,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub join_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssigned {
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStarted {
    pub scenario: String,
    pub players: Vec<Role>,
    pub turn_order: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnUpdate {
    pub active_role: Role,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
    pub round: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundUpdate {
    pub round: u32,
    /// The judge's interim commentary on the round.
    pub llm_thoughts: String,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalVerdict {
    pub verdict: String,
    #[serde(default)]
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerError {
    pub message: String,
}

/// A named event from the session server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum SessionEvent {
    SessionCreated(SessionCreated),
    RoleAssigned(RoleAssigned),
    /// Roles seated so far.
    PlayerJoined(Vec<Role>),
    GameStarted(GameStarted),
    TurnUpdate(TurnUpdate),
    RoundUpdate(RoundUpdate),
    FinalVerdict(FinalVerdict),
    Error(ServerError),
}

impl SessionEvent {
    /// Parse one event from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionCreated(_) => "sessionCreated",
            SessionEvent::RoleAssigned(_) => "roleAssigned",
            SessionEvent::PlayerJoined(_) => "playerJoined",
            SessionEvent::GameStarted(_) => "gameStarted",
            SessionEvent::TurnUpdate(_) => "turnUpdate",
            SessionEvent::RoundUpdate(_) => "roundUpdate",
            SessionEvent::FinalVerdict(_) => "finalVerdict",
            SessionEvent::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_turn_update() {
        let event = SessionEvent::from_json(
            r#"{"event":"turnUpdate","data":{"activeRole":"Defense","round":1,
                "transcript":[{"role":"Prosecutor","text":"They took my couch.","round":1}]}}"#,
        )
        .unwrap();

        let SessionEvent::TurnUpdate(update) = event else {
            panic!("expected turnUpdate, got {event:?}");
        };
        assert_eq!(update.active_role, Role::Defense);
        assert_eq!(update.round, 1);
        assert_eq!(update.transcript[0].role, Speaker::Prosecutor);
    }

    #[test]
    fn parses_player_joined_list() {
        let event =
            SessionEvent::from_json(r#"{"event":"playerJoined","data":["Prosecutor"]}"#).unwrap();
        assert_eq!(event, SessionEvent::PlayerJoined(vec![Role::Prosecutor]));
        assert_eq!(event.name(), "playerJoined");
    }

    #[test]
    fn final_verdict_winner_is_optional() {
        let event = SessionEvent::from_json(
            r#"{"event":"finalVerdict","data":{"verdict":"Defense wins.","transcript":[]}}"#,
        )
        .unwrap();
        let SessionEvent::FinalVerdict(verdict) = event else {
            panic!("expected finalVerdict");
        };
        assert_eq!(verdict.winner, None);
    }

    #[test]
    fn unknown_role_is_rejected() {
        let result = SessionEvent::from_json(r#"{"event":"roleAssigned","data":{"role":"Jury"}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(SessionEvent::from_json(r#"{"event":"objection","data":{}}"#).is_err());
    }

    #[test]
    fn serializes_with_wire_names() {
        let event = SessionEvent::SessionCreated(SessionCreated {
            join_code: "AB12CD".into(),
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "sessionCreated");
        assert_eq!(json["data"]["joinCode"], "AB12CD");
    }
}
