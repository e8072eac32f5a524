use crate::config::GameConfig;
use crate::dice::{DiceSet, DiceSetError};
use crate::die::Die;
use crate::player::{Player, PlayerError};
use crate::randroll::RollGen;
use crate::score::ScoreCalculator;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug)]
pub enum GameError {
    /// Operation invalid in the current lifecycle phase.
    GameState(&'static str),
    /// Operation violates a turn rule despite being lifecycle-valid.
    GameRule(&'static str),
    /// Operation references dice it must not.
    InvalidMove(String),
    DuplicateName(String),
    InvalidName(String),
}

impl Error for GameError {}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameError::GameState(msg) => write!(f, "{}", msg),
            GameError::GameRule(msg) => write!(f, "{}", msg),
            GameError::InvalidMove(msg) => write!(f, "{}", msg),
            GameError::DuplicateName(name) => {
                write!(f, "A player named '{}' already exists", name)
            }
            GameError::InvalidName(name) => write!(f, "Invalid player name '{}'", name),
        }
    }
}

impl From<DiceSetError> for GameError {
    fn from(e: DiceSetError) -> Self {
        GameError::InvalidMove(e.to_string())
    }
}

impl From<PlayerError> for GameError {
    fn from(e: PlayerError) -> Self {
        GameError::InvalidMove(e.to_string())
    }
}

/// Everything a front end may legally do right now.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    AddPlayer,
    StartTurn,
    KeepDice,
    RollAgain,
    Bank,
    NewGame,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let name = match self {
            Action::AddPlayer => "add_player",
            Action::StartTurn => "start_turn",
            Action::KeepDice => "keep_dice",
            Action::RollAgain => "roll_again",
            Action::Bank => "bank",
            Action::NewGame => "new_game",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Debug)]
pub struct PlayerSnapshot {
    pub name: String,
    pub turn_score: u32,
    pub total_score: u32,
}

/// Read-only view of the whole game for rendering.
#[derive(Serialize, Debug)]
pub struct GameSnapshot {
    pub players: Vec<PlayerSnapshot>,
    pub current_player: Option<String>,
    pub dice: Vec<Die>,
    pub turn_started: bool,
    pub game_over: bool,
}

/// The turn state machine: player roster and rotation, the dice set, the
/// calculator, and the single source of truth for which actions are legal
/// at any moment.
pub struct Game {
    players: Vec<Player>,
    current_player_idx: usize,
    dice_set: DiceSet,
    score_calculator: ScoreCalculator,
    max_score: u32,
    late_join: bool,
    turn_started: bool,
    /// Whether any turn has ever begun; freezes the roster unless late_join
    /// is configured.
    any_turn_started: bool,
    /// Whether the current player has kept anything this turn. Banking
    /// requires it. Distinct from the dice's own kept flags, which a full
    /// clear resets mid-turn.
    kept_this_turn: bool,
    game_over: bool,
}

impl Game {
    pub fn new(config: &GameConfig, roll_gen: Box<dyn RollGen>) -> Self {
        Self {
            players: vec![],
            current_player_idx: 0,
            dice_set: DiceSet::new(config.dice_count, roll_gen),
            score_calculator: ScoreCalculator::new(config),
            max_score: config.max_score,
            late_join: config.late_join,
            turn_started: false,
            any_turn_started: false,
            kept_this_turn: false,
            game_over: false,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_idx)
    }

    pub fn dice_set(&self) -> &DiceSet {
        &self.dice_set
    }

    pub fn is_turn_started(&self) -> bool {
        self.turn_started
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    fn current_name(&self) -> &str {
        self.players[self.current_player_idx].name()
    }

    fn check_turn_actionable(&self) -> Result<(), GameError> {
        if !self.turn_started {
            return Err(GameError::GameState("Turn has not started"));
        }
        if self.game_over {
            return Err(GameError::GameState("Game is already over"));
        }
        Ok(())
    }

    /// Add a player to the roster. Only legal before the first turn begins,
    /// unless the late_join policy is on, in which case players may still
    /// join between turns (never mid-turn).
    pub fn add_player(&mut self, name: &str) -> Result<&Player, GameError> {
        if self.game_over {
            return Err(GameError::GameState("Game is already over"));
        }
        if self.turn_started {
            return Err(GameError::GameState(
                "Cannot add players while a turn is in progress",
            ));
        }
        if self.any_turn_started && !self.late_join {
            return Err(GameError::GameState(
                "Cannot add players after the game has started",
            ));
        }
        if name.is_empty() {
            return Err(GameError::InvalidName(name.to_string()));
        }
        if self.players.iter().any(|p| p.name() == name) {
            return Err(GameError::DuplicateName(name.to_string()));
        }
        self.players.push(Player::new(name, self.max_score));
        info!("Added player '{}' to the game", name);
        // unwrap ok: we just pushed
        Ok(self.players.last().unwrap())
    }

    /// Start the current player's turn with a fresh roll of every die. An
    /// opening roll with nothing scoring busts immediately; the rolled
    /// values are still returned so the front end can show them.
    pub fn start_turn(&mut self) -> Result<Vec<u8>, GameError> {
        if self.players.is_empty() {
            return Err(GameError::GameState("Cannot start a turn with no players"));
        }
        if self.game_over {
            return Err(GameError::GameState("Game is already over"));
        }
        if self.turn_started {
            return Err(GameError::GameRule("Turn has already started"));
        }
        self.turn_started = true;
        self.any_turn_started = true;
        self.kept_this_turn = false;
        let values = self.dice_set.roll_all();
        info!(
            "Started turn for player '{}' with roll {:?}",
            self.current_name(),
            values
        );
        if !self.score_calculator.has_scoring_dice(&values) {
            info!("Player '{}' busted on the opening roll", self.current_name());
            self.bust();
        }
        Ok(values)
    }

    /// Die positions among the currently-available dice whose values the
    /// calculator considers scorable. The calculator addresses positions
    /// within the available-values list; this translates them back to die
    /// positions for callers.
    pub fn scorable_dice(&self) -> Vec<usize> {
        let avail_indices = self.dice_set.available_indices();
        let avail_values = self.dice_set.available_values();
        let scorable = self.score_calculator.scorable_indices(&avail_values);
        avail_indices
            .into_iter()
            .enumerate()
            .filter(|(pos, _)| scorable.contains(pos))
            .map(|(_, die_idx)| die_idx)
            .collect()
    }

    /// Set aside the dice at the given positions and add their score to the
    /// current player's turn. Returns the score increment. Keeping every
    /// remaining die is a full clear: all dice are released again and play
    /// continues with the whole set on the next roll.
    pub fn keep_dice(&mut self, indices: &[usize]) -> Result<u32, GameError> {
        self.check_turn_actionable()?;
        if indices.is_empty() {
            return Err(GameError::InvalidMove("No dice selected".to_string()));
        }
        // range and kept checks first so a used die is reported as such
        // rather than as a non-scoring selection
        for idx in indices {
            if *idx >= self.dice_set.len() {
                return Err(GameError::InvalidMove(format!(
                    "Die index {} out of range",
                    idx
                )));
            }
            if self.dice_set.dice()[*idx].kept() {
                return Err(GameError::InvalidMove(format!(
                    "Die at index {} is already kept",
                    idx
                )));
            }
        }
        // every chosen die must lie in the scorable subset of what is
        // available right now
        let scorable = self.scorable_dice();
        for idx in indices {
            if !scorable.contains(idx) {
                return Err(GameError::InvalidMove(format!(
                    "Die at index {} does not score",
                    idx
                )));
            }
        }
        // and the chosen values must score as a set: two dice out of a
        // triple are individually scorable but worth nothing on their own
        let values: Vec<u8> = indices
            .iter()
            .map(|idx| self.dice_set.dice()[*idx].value())
            .collect();
        let score = self.score_calculator.calculate_score(&values);
        if score == 0 {
            return Err(GameError::InvalidMove(format!(
                "Selection {:?} does not score",
                values
            )));
        }
        self.dice_set.keep_dice(indices)?;
        self.kept_this_turn = true;
        self.players[self.current_player_idx].add_to_turn(i64::from(score))?;
        info!(
            "Player '{}' kept dice at {:?} for {} points",
            self.current_name(),
            indices,
            score
        );
        if self.dice_set.is_all_kept() {
            info!("Player '{}' cleared all dice", self.current_name());
            self.dice_set.release_all();
        }
        Ok(score)
    }

    /// Reroll the dice that are not set aside. Rolling nothing scorable
    /// busts: the turn score is lost and the turn passes on. The rolled
    /// values are returned either way.
    pub fn roll_again(&mut self) -> Result<Vec<u8>, GameError> {
        self.check_turn_actionable()?;
        // after a full clear every die is kept; the player gets the whole
        // set back
        if self.dice_set.is_all_kept() {
            self.dice_set.release_all();
        }
        let values = self.dice_set.roll_available();
        info!(
            "Player '{}' rolled again: {:?}",
            self.current_name(),
            values
        );
        if !self
            .score_calculator
            .has_scoring_dice(&self.dice_set.available_values())
        {
            info!("Player '{}' busted", self.current_name());
            self.bust();
        }
        Ok(values)
    }

    /// Bank the turn score into the current player's total. Reaching the
    /// win threshold ends the game with no rotation, so the winner stays
    /// current for reporting; otherwise the turn passes on normally.
    pub fn bank(&mut self) -> Result<u32, GameError> {
        self.check_turn_actionable()?;
        if !self.kept_this_turn {
            return Err(GameError::GameRule("Cannot bank without keeping any dice"));
        }
        let total = self.players[self.current_player_idx].bank_points();
        if self.players[self.current_player_idx].has_won() {
            self.game_over = true;
            self.turn_started = false;
            self.kept_this_turn = false;
            info!(
                "Game over, player '{}' won with {} points",
                self.current_name(),
                total
            );
        } else {
            self.end_turn();
        }
        Ok(total)
    }

    /// No scoring dice: the turn score is forfeit and the turn passes on.
    fn bust(&mut self) {
        self.players[self.current_player_idx].reset_turn();
        info!("Player '{}' busted and lost their turn score", self.current_name());
        self.end_turn();
    }

    fn end_turn(&mut self) {
        self.turn_started = false;
        self.kept_this_turn = false;
        self.dice_set.release_all();
        self.current_player_idx = (self.current_player_idx + 1) % self.players.len();
        debug!("Turn ended, next player is '{}'", self.current_name());
    }

    pub fn state(&self) -> GameSnapshot {
        GameSnapshot {
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    name: p.name().to_string(),
                    turn_score: p.turn_score(),
                    total_score: p.total_score(),
                })
                .collect(),
            current_player: self.current_player().map(|p| p.name().to_string()),
            dice: self.dice_set.dice().to_vec(),
            turn_started: self.turn_started,
            game_over: self.game_over,
        }
    }

    /// Which actions are legal right now, purely a function of state.
    pub fn available_actions(&self) -> Vec<Action> {
        if self.players.is_empty() {
            return vec![Action::AddPlayer];
        }
        if self.game_over {
            return vec![Action::NewGame];
        }
        if !self.turn_started {
            return vec![Action::StartTurn];
        }
        let mut actions = vec![];
        let avail = self.dice_set.available_values();
        if !avail.is_empty() && self.score_calculator.has_scoring_dice(&avail) {
            actions.push(Action::KeepDice);
        }
        if self.kept_this_turn {
            actions.push(Action::Bank);
            actions.push(Action::RollAgain);
        }
        actions
    }
}
