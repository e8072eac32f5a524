use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::io::Read;
use tracing::debug;

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
}

impl Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Error reading config: {}", e),
            ConfigError::Parse(e) => write!(f, "Error parsing config: {}", e),
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Point values for every scoring combination. Any key missing from the
/// config file falls back to the standard KCD values.
#[derive(Deserialize, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct ScoringRules {
    pub single_1: u32,
    pub single_5: u32,
    pub three_1: u32,
    pub three_2: u32,
    pub three_3: u32,
    pub three_4: u32,
    pub three_5: u32,
    pub three_6: u32,
    pub straight: u32,
    pub three_pairs: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            single_1: 100,
            single_5: 50,
            three_1: 1000,
            three_2: 200,
            three_3: 300,
            three_4: 400,
            three_5: 500,
            three_6: 600,
            straight: 1500,
            three_pairs: 1000,
        }
    }
}

impl ScoringRules {
    /// Base score for three of a kind of the given face.
    pub fn three_of_a_kind(&self, face: u8) -> u32 {
        match face {
            1 => self.three_1,
            2 => self.three_2,
            3 => self.three_3,
            4 => self.three_4,
            5 => self.three_5,
            6 => self.three_6,
            _ => panic!("Impossible die face {}", face),
        }
    }
}

/// Score multipliers for more than three of a kind.
#[derive(Deserialize, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct Multipliers {
    pub four_of_kind: u32,
    pub five_of_kind: u32,
    pub six_of_kind: u32,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            four_of_kind: 2,
            five_of_kind: 3,
            six_of_kind: 4,
        }
    }
}

impl Multipliers {
    /// Multiplier for an of-a-kind group of the given size. Counts above six
    /// are treated as six; there are only six dice on the table.
    pub fn for_count(&self, count: usize) -> u32 {
        match std::cmp::min(count, 6) {
            6 => self.six_of_kind,
            5 => self.five_of_kind,
            4 => self.four_of_kind,
            _ => 1,
        }
    }
}

#[derive(Deserialize, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct GameConfig {
    pub dice_count: usize,
    pub max_score: u32,
    /// Whether players may join between completed turns. They can never join
    /// mid-turn. Off by default: the roster freezes once the first turn
    /// begins.
    pub late_join: bool,
    pub scoring_rules: ScoringRules,
    pub multipliers: Multipliers,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            dice_count: 6,
            max_score: 5000,
            late_join: false,
            scoring_rules: ScoringRules::default(),
            multipliers: Multipliers::default(),
        }
    }
}

impl GameConfig {
    pub fn from_reader<R: Read>(r: R) -> Result<Self, ConfigError> {
        Ok(serde_json::from_reader(r)?)
    }

    /// Load config from the given JSON file. A missing file is not an error:
    /// every parameter has a default. Malformed JSON is.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let fd = match OpenOptions::new().read(true).open(path) {
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    debug!("No config file at {}, using defaults", path);
                    return Ok(Self::default());
                }
                return Err(ConfigError::Io(e));
            }
            Ok(fd) => fd,
        };
        Self::from_reader(fd)
    }
}

#[cfg(test)]
mod tests {
    use super::{GameConfig, Multipliers, ScoringRules};

    #[test]
    fn defaults() {
        let c = GameConfig::default();
        assert_eq!(c.dice_count, 6);
        assert_eq!(c.max_score, 5000);
        assert!(!c.late_join);
        assert_eq!(c.scoring_rules.single_1, 100);
        assert_eq!(c.scoring_rules.single_5, 50);
        assert_eq!(c.scoring_rules.straight, 1500);
        assert_eq!(c.scoring_rules.three_pairs, 1000);
        assert_eq!(c.multipliers.four_of_kind, 2);
    }

    #[test]
    fn empty_json_is_all_defaults() {
        let c = GameConfig::from_reader("{}".as_bytes()).unwrap();
        assert_eq!(c, GameConfig::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = GameConfig::from_reader(r#"{"max_score": 2000}"#.as_bytes()).unwrap();
        assert_eq!(c.max_score, 2000);
        assert_eq!(c.dice_count, 6);
        assert_eq!(c.scoring_rules, ScoringRules::default());
    }

    #[test]
    fn nested_partial_json() {
        let s = r#"{"scoring_rules": {"three_6": 666}, "multipliers": {"six_of_kind": 10}}"#;
        let c = GameConfig::from_reader(s.as_bytes()).unwrap();
        assert_eq!(c.scoring_rules.three_6, 666);
        assert_eq!(c.scoring_rules.three_1, 1000);
        assert_eq!(c.multipliers.six_of_kind, 10);
        assert_eq!(c.multipliers.four_of_kind, 2);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(GameConfig::from_reader("{not json".as_bytes()).is_err());
    }

    #[test]
    fn missing_file_is_defaults() {
        let c = GameConfig::load("/nonexistent/kcdice-test-config.json").unwrap();
        assert_eq!(c, GameConfig::default());
    }

    #[test]
    fn three_of_a_kind_lookup() {
        let r = ScoringRules::default();
        assert_eq!(r.three_of_a_kind(1), 1000);
        assert_eq!(r.three_of_a_kind(2), 200);
        assert_eq!(r.three_of_a_kind(3), 300);
        assert_eq!(r.three_of_a_kind(4), 400);
        assert_eq!(r.three_of_a_kind(5), 500);
        assert_eq!(r.three_of_a_kind(6), 600);
    }

    #[test]
    fn multiplier_tiers() {
        let m = Multipliers::default();
        assert_eq!(m.for_count(3), 1);
        assert_eq!(m.for_count(4), 2);
        assert_eq!(m.for_count(5), 3);
        assert_eq!(m.for_count(6), 4);
        // counts above six cannot happen with six dice, but the lookup caps
        assert_eq!(m.for_count(7), 4);
    }
}
