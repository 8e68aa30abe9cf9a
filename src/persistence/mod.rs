//! Session persistence
//!
//! State that survives a table restart but lives only for the process
//! session. Nothing is written to disk.

use serde::{Deserialize, Serialize};

/// Session-wide flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    player_has_won: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once the player reached the win state this session
    pub fn player_has_won(&self) -> bool {
        self.player_has_won
    }

    /// Mark the game as won for the current session
    pub fn record_win(&mut self) {
        if !self.player_has_won {
            log::info!("Session win recorded");
        }
        self.player_has_won = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win_flag_is_sticky() {
        let mut session = SessionState::new();
        assert!(!session.player_has_won());
        session.record_win();
        session.record_win();
        assert!(session.player_has_won());
    }
}
