use crate::config::{GameConfig, Multipliers, ScoringRules};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// A single scoring combination found in a set of face values.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Combination {
    Straight,
    ThreePairs,
    OfAKind { value: u8, count: usize },
    Singles { value: u8, count: usize },
}

fn count_word(count: usize) -> &'static str {
    match count {
        3 => "three",
        4 => "four",
        5 => "five",
        6 => "six",
        _ => panic!("Impossible of-a-kind count {}", count),
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Combination::Straight => write!(f, "straight"),
            Combination::ThreePairs => write!(f, "three pairs"),
            Combination::OfAKind { value, count } => {
                write!(f, "{} {}s", count_word(*count), value)
            }
            Combination::Singles { value, count } => {
                if *count == 1 {
                    write!(f, "single {}", value)
                } else {
                    write!(f, "{} single {}s", count, value)
                }
            }
        }
    }
}

/// Finds scoring combinations in lists of face values. Pure: owns nothing
/// but the immutable rule tables, and has no idea which dice are kept —
/// callers pass in whatever values they are considering.
pub struct ScoreCalculator {
    rules: ScoringRules,
    multipliers: Multipliers,
}

impl ScoreCalculator {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            rules: config.scoring_rules.clone(),
            multipliers: config.multipliers.clone(),
        }
    }

    fn face_counts(values: &[u8]) -> [usize; 6] {
        let mut counts = [0; 6];
        for v in values {
            assert!(*v >= 1 && *v <= 6);
            counts[*v as usize - 1] += 1;
        }
        counts
    }

    /// All six faces exactly once.
    fn is_straight(counts: &[usize; 6]) -> bool {
        counts.iter().all(|c| *c == 1)
    }

    /// Exactly three distinct faces, each exactly twice.
    fn is_three_pairs(counts: &[usize; 6]) -> bool {
        counts.iter().all(|c| *c == 0 || *c == 2)
            && counts.iter().filter(|c| **c == 2).count() == 3
    }

    /// Every scoring combination in the given values with its point value.
    /// A straight or three pairs is exclusive: nothing else is reported for
    /// that value set. Otherwise the values decompose by face frequency:
    /// of-a-kind groups first, then whatever 1s and 5s are left over.
    pub fn scoring_combinations(&self, values: &[u8]) -> Vec<(Combination, u32)> {
        if values.is_empty() {
            return vec![];
        }
        let counts = Self::face_counts(values);
        if Self::is_straight(&counts) {
            return vec![(Combination::Straight, self.rules.straight)];
        }
        if Self::is_three_pairs(&counts) {
            return vec![(Combination::ThreePairs, self.rules.three_pairs)];
        }
        let mut found = vec![];
        for (i, count) in counts.iter().enumerate() {
            let face = i as u8 + 1;
            if *count >= 3 {
                let base = self.rules.three_of_a_kind(face);
                let comb = Combination::OfAKind {
                    value: face,
                    count: std::cmp::min(*count, 6),
                };
                found.push((comb, base * self.multipliers.for_count(*count)));
            }
        }
        // 1s and 5s not consumed by an of-a-kind group score one at a time.
        // Other faces below three of a kind score nothing.
        for face in [1u8, 5].iter() {
            let count = counts[*face as usize - 1];
            if count > 0 && count < 3 {
                let each = if *face == 1 {
                    self.rules.single_1
                } else {
                    self.rules.single_5
                };
                found.push((
                    Combination::Singles {
                        value: *face,
                        count,
                    },
                    count as u32 * each,
                ));
            }
        }
        found
    }

    /// Total score of all combinations in the value set. Zero for values
    /// that score nothing, including the empty set.
    pub fn calculate_score(&self, values: &[u8]) -> u32 {
        let total: u32 = self.scoring_combinations(values).iter().map(|(_, s)| s).sum();
        debug!("Calculated score {} for {:?}", total, values);
        total
    }

    pub fn has_scoring_dice(&self, values: &[u8]) -> bool {
        !self.scoring_combinations(values).is_empty()
    }

    /// Positions within the value list that belong to some scoring
    /// combination. A straight or three pairs makes every position
    /// scorable; otherwise a position is scorable iff its face shows at
    /// least three times, or is a 1 or a 5.
    pub fn scorable_indices(&self, values: &[u8]) -> HashSet<usize> {
        if values.is_empty() {
            return HashSet::new();
        }
        let counts = Self::face_counts(values);
        if Self::is_straight(&counts) || Self::is_three_pairs(&counts) {
            return (0..values.len()).collect();
        }
        values
            .iter()
            .enumerate()
            .filter(|(_, v)| counts[**v as usize - 1] >= 3 || **v == 1 || **v == 5)
            .map(|(idx, _)| idx)
            .collect()
    }
}
