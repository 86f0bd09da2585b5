//! Game phase: whose speech the courtroom camera is framing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discrete label for whose turn or speech is currently active.
///
/// The phase is owned by the UI layer (derived from session events) and handed
/// to the scene as a plain per-frame input. Matching on it is always exhaustive,
/// so adding a phase is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting for players; wide shot of the courtroom.
    #[default]
    Lobby,
    /// The judge is speaking.
    JudgeTalking,
    /// The prosecutor's argument is on screen.
    ProsecutorTalking,
    /// The defense's argument is on screen.
    DefenseTalking,
}

impl Phase {
    /// Number of phases.
    pub const COUNT: usize = 4;

    /// Every phase, in table order.
    pub const ALL: [Phase; Self::COUNT] = [
        Phase::Lobby,
        Phase::JudgeTalking,
        Phase::ProsecutorTalking,
        Phase::DefenseTalking,
    ];

    /// Dense index used by fixed-size per-phase tables.
    pub const fn index(self) -> usize {
        match self {
            Phase::Lobby => 0,
            Phase::JudgeTalking => 1,
            Phase::ProsecutorTalking => 2,
            Phase::DefenseTalking => 3,
        }
    }

    /// Stable snake_case name (matches the serde and config spelling).
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Lobby => "lobby",
            Phase::JudgeTalking => "judge_talking",
            Phase::ProsecutorTalking => "prosecutor_talking",
            Phase::DefenseTalking => "defense_talking",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A phase name that does not correspond to any [`Phase`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized phase: {0:?}")]
pub struct UnrecognizedPhase(pub String);

impl FromStr for Phase {
    type Err = UnrecognizedPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.name() == s)
            .ok_or_else(|| UnrecognizedPhase(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_ordered() {
        for (i, phase) in Phase::ALL.iter().enumerate() {
            assert_eq!(phase.index(), i);
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for phase in Phase::ALL {
            assert_eq!(phase.name().parse::<Phase>(), Ok(phase));
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "jury_talking".parse::<Phase>().unwrap_err();
        assert_eq!(err, UnrecognizedPhase("jury_talking".into()));
        assert!(err.to_string().contains("jury_talking"));
    }

    #[test]
    fn default_is_lobby() {
        assert_eq!(Phase::default(), Phase::Lobby);
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&Phase::ProsecutorTalking).unwrap();
        assert_eq!(json, "\"prosecutor_talking\"");
    }
}
