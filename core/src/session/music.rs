use super::SessionView;

/// Background track for the current stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicCue {
    Lobby,
    Trial,
    Verdict,
}

impl MusicCue {
    pub fn for_view(view: &SessionView) -> Self {
        if view.is_game_over() {
            MusicCue::Verdict
        } else if view.is_game_started() {
            MusicCue::Trial
        } else {
            MusicCue::Lobby
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            MusicCue::Lobby => "lobby",
            MusicCue::Trial => "trial",
            MusicCue::Verdict => "verdict",
        }
    }
}

/// Tracks the playing cue and reports transitions.
#[derive(Debug, Default)]
pub struct MusicDirector {
    current: Option<MusicCue>,
}

impl MusicDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cue to switch to, or `None` when the current one should keep playing.
    pub fn update(&mut self, view: &SessionView) -> Option<MusicCue> {
        let cue = MusicCue::for_view(view);
        if self.current == Some(cue) {
            return None;
        }
        log::debug!("music cue: {}", cue.name());
        self.current = Some(cue);
        Some(cue)
    }

    pub fn current(&self) -> Option<MusicCue> {
        self.current
    }
}
