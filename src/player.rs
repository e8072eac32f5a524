use std::error::Error;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug)]
pub enum PlayerError {
    NegativeAmount(i64),
}

impl Error for PlayerError {}

impl fmt::Display for PlayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerError::NegativeAmount(points) => {
                write!(f, "Cannot add negative points ({})", points)
            }
        }
    }
}

/// Per-player score state: the points at risk in the current turn and the
/// banked total, plus the configured win threshold.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    turn_score: u32,
    total_score: u32,
    max_score: u32,
}

impl Player {
    pub fn new(name: &str, max_score: u32) -> Self {
        Self {
            name: name.to_string(),
            turn_score: 0,
            total_score: 0,
            max_score,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn turn_score(&self) -> u32 {
        self.turn_score
    }

    pub fn total_score(&self) -> u32 {
        self.total_score
    }

    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Add points to the turn in progress. Returns the new turn score.
    pub fn add_to_turn(&mut self, points: i64) -> Result<u32, PlayerError> {
        if points < 0 {
            return Err(PlayerError::NegativeAmount(points));
        }
        self.turn_score += points as u32;
        debug!(
            "Player '{}' added {} points to turn (now {})",
            self.name, points, self.turn_score
        );
        Ok(self.turn_score)
    }

    /// Move the turn score into the banked total and reset the turn.
    /// Returns the new total.
    pub fn bank_points(&mut self) -> u32 {
        self.total_score += self.turn_score;
        info!(
            "Player '{}' banked {} points (total now {})",
            self.name, self.turn_score, self.total_score
        );
        self.turn_score = 0;
        self.total_score
    }

    /// Throw away the turn score. Busting calls this.
    pub fn reset_turn(&mut self) {
        debug!("Player '{}' lost {} points", self.name, self.turn_score);
        self.turn_score = 0;
    }

    pub fn has_won(&self) -> bool {
        self.total_score >= self.max_score
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "Player<{} turn={} total={}>",
            self.name, self.turn_score, self.total_score
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Player, PlayerError};

    #[test]
    fn new_player_is_zeroed() {
        let p = Player::new("alice", 5000);
        assert_eq!(p.name(), "alice");
        assert_eq!(p.turn_score(), 0);
        assert_eq!(p.total_score(), 0);
        assert_eq!(p.max_score(), 5000);
        assert!(!p.has_won());
    }

    #[test]
    fn add_to_turn_accumulates() {
        let mut p = Player::new("alice", 5000);
        assert_eq!(p.add_to_turn(100).unwrap(), 100);
        assert_eq!(p.add_to_turn(50).unwrap(), 150);
        assert_eq!(p.add_to_turn(0).unwrap(), 150);
        assert_eq!(p.turn_score(), 150);
        assert_eq!(p.total_score(), 0);
    }

    #[test]
    fn add_negative_fails() {
        let mut p = Player::new("alice", 5000);
        p.add_to_turn(100).unwrap();
        let res = p.add_to_turn(-1);
        assert!(res.is_err());
        match res.unwrap_err() {
            PlayerError::NegativeAmount(points) => assert_eq!(points, -1),
        }
        // turn score untouched
        assert_eq!(p.turn_score(), 100);
    }

    #[test]
    fn bank_moves_turn_to_total() {
        let mut p = Player::new("alice", 5000);
        p.add_to_turn(300).unwrap();
        assert_eq!(p.bank_points(), 300);
        assert_eq!(p.turn_score(), 0);
        assert_eq!(p.total_score(), 300);
        p.add_to_turn(450).unwrap();
        assert_eq!(p.bank_points(), 750);
    }

    #[test]
    fn reset_turn_discards() {
        let mut p = Player::new("alice", 5000);
        p.add_to_turn(1500).unwrap();
        p.reset_turn();
        assert_eq!(p.turn_score(), 0);
        assert_eq!(p.total_score(), 0);
    }

    #[test]
    fn wins_at_threshold() {
        let mut p = Player::new("alice", 1000);
        p.add_to_turn(999).unwrap();
        p.bank_points();
        assert!(!p.has_won());
        p.add_to_turn(1).unwrap();
        p.bank_points();
        assert!(p.has_won());
    }

    #[test]
    fn unbanked_points_do_not_win() {
        let mut p = Player::new("alice", 1000);
        p.add_to_turn(5000).unwrap();
        assert!(!p.has_won());
    }
}
