use crate::global::FACES;
use rand::distributions::weighted::WeightedIndex;
use rand::distributions::Distribution;
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use tracing::warn;

/// Source of die face values. The dice set asks this for one face per die
/// rolled. Implementations must only produce values in [1, 6].
pub trait RollGen {
    fn gen(&self) -> u8;
}

/// A fair six-sided die.
#[derive(Debug, Default)]
pub struct FairDie;

impl FairDie {
    pub fn new() -> Self {
        Self
    }
}

impl RollGen for FairDie {
    fn gen(&self) -> u8 {
        thread_rng().gen_range(1, 7)
    }
}

/// A possibly-loaded die described by per-face weights.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DieWeights {
    w: [u64; 6],
}

impl DieWeights {
    pub fn new_fair() -> Self {
        DieWeights::new_weights([1; 6])
    }

    pub fn new_weights(w: [u64; 6]) -> Self {
        // fail fast on a table that can never produce a face
        WeightedIndex::new(&w).unwrap();
        DieWeights { w }
    }

    /// Whether the table can produce a face at all. Tables that arrive via
    /// deserialization bypass new_weights and must be checked before use.
    pub fn is_valid(&self) -> bool {
        WeightedIndex::new(&self.w).is_ok()
    }
}

impl RollGen for DieWeights {
    fn gen(&self) -> u8 {
        let mut rng = thread_rng();
        // unwrap ok: new_weights and is_valid reject unusable tables
        let idx = WeightedIndex::new(&self.w).unwrap().sample(&mut rng);
        FACES[idx]
    }
}

/// Replays a fixed sequence of faces, then falls back to a fair die. Lets
/// tests and the replay front end drive a game deterministically.
pub struct ScriptedRolls {
    vals: RefCell<VecDeque<u8>>,
}

impl ScriptedRolls {
    pub fn new(vals: &[u8]) -> Self {
        assert!(vals.iter().all(|v| *v >= 1 && *v <= 6));
        Self {
            vals: RefCell::new(vals.iter().copied().collect()),
        }
    }
}

impl RollGen for ScriptedRolls {
    fn gen(&self) -> u8 {
        match self.vals.borrow_mut().pop_front() {
            Some(v) => v,
            None => {
                warn!("Roll script exhausted, falling back to a fair die");
                thread_rng().gen_range(1, 7)
            }
        }
    }
}

#[cfg(test)]
mod fairdie_tests {
    use super::FairDie;
    use super::RollGen;

    #[test]
    fn always_valid() {
        let g = FairDie::new();
        for _ in 0..1000 {
            let v = g.gen();
            assert!(v >= 1 && v <= 6);
        }
    }
}

#[cfg(test)]
mod dieweights_tests {
    use super::DieWeights;
    use super::RollGen;

    #[test]
    fn always_same() {
        let w = DieWeights::new_weights([1, 0, 0, 0, 0, 0]);
        for _ in 0..1000 {
            assert_eq!(w.gen(), 1);
        }
        let w = DieWeights::new_weights([0, 0, 0, 0, 0, 1]);
        for _ in 0..1000 {
            assert_eq!(w.gen(), 6);
        }
    }

    #[test]
    fn always_valid() {
        let w = DieWeights::new_fair();
        for _ in 0..1000 {
            let v = w.gen();
            assert!(v >= 1 && v <= 6);
        }
    }

    #[test]
    fn survives_serialization() {
        let w = DieWeights::new_weights([3, 0, 0, 0, 0, 0]);
        let s = serde_json::to_string(&w).unwrap();
        let w2: DieWeights = serde_json::from_str(&s).unwrap();
        assert!(w2.is_valid());
        assert_eq!(w2.gen(), 1);
    }

    #[test]
    fn deserialized_zero_table_is_invalid() {
        let w: DieWeights = serde_json::from_str(r#"{"w":[0,0,0,0,0,0]}"#).unwrap();
        assert!(!w.is_valid());
    }
}

#[cfg(test)]
mod scripted_tests {
    use super::RollGen;
    use super::ScriptedRolls;

    #[test]
    fn plays_back_in_order() {
        let g = ScriptedRolls::new(&[1, 2, 3, 4, 5, 6, 6, 1]);
        for want in [1, 2, 3, 4, 5, 6, 6, 1].iter() {
            assert_eq!(g.gen(), *want);
        }
    }

    #[test]
    fn falls_back_when_exhausted() {
        let g = ScriptedRolls::new(&[2]);
        assert_eq!(g.gen(), 2);
        for _ in 0..100 {
            let v = g.gen();
            assert!(v >= 1 && v <= 6);
        }
    }

    #[test]
    #[should_panic]
    fn rejects_out_of_range_script() {
        ScriptedRolls::new(&[1, 7]);
    }
}
