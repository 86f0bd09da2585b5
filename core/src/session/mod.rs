//! Realtime session state: server events, the reduced view and music cues.

mod events;
mod music;
mod view;

pub use events::{
    FinalVerdict, GameStarted, Role, RoleAssigned, RoundUpdate, ServerError, SessionCreated,
    SessionEvent, Speaker, TranscriptEntry, TurnUpdate,
};
pub use music::{MusicCue, MusicDirector};
pub use view::SessionView;
