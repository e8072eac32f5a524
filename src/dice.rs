use crate::die::Die;
use crate::randroll::RollGen;
use std::error::Error;
use std::fmt;
use tracing::debug;

#[derive(Debug)]
pub enum DiceSetError {
    IndexOutOfRange(usize),
    AlreadyKept(usize),
}

impl Error for DiceSetError {}

impl fmt::Display for DiceSetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiceSetError::IndexOutOfRange(idx) => write!(f, "Die index {} out of range", idx),
            DiceSetError::AlreadyKept(idx) => write!(f, "Die at index {} is already kept", idx),
        }
    }
}

/// A fixed-size set of dice addressed by stable position. Dice are rerolled
/// in place every turn, never recreated, and face values come from the
/// injected generator.
pub struct DiceSet {
    dice: Vec<Die>,
    roll_gen: Box<dyn RollGen>,
}

impl DiceSet {
    pub fn new(count: usize, roll_gen: Box<dyn RollGen>) -> Self {
        assert!(count > 0);
        Self {
            dice: vec![Die::default(); count],
            roll_gen,
        }
    }

    pub fn dice(&self) -> &[Die] {
        &self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn values(&self) -> Vec<u8> {
        self.dice.iter().map(|d| d.value()).collect()
    }

    pub fn kept_values(&self) -> Vec<u8> {
        self.dice.iter().filter(|d| d.kept()).map(|d| d.value()).collect()
    }

    pub fn available_values(&self) -> Vec<u8> {
        self.dice
            .iter()
            .filter(|d| !d.kept())
            .map(|d| d.value())
            .collect()
    }

    /// Positions of the dice that are not kept, in die order. Pairs up with
    /// available_values so callers can translate between the two addressings.
    pub fn available_indices(&self) -> Vec<usize> {
        self.dice
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.kept())
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn kept_count(&self) -> usize {
        self.dice.iter().filter(|d| d.kept()).count()
    }

    pub fn is_all_kept(&self) -> bool {
        self.dice.iter().all(|d| d.kept())
    }

    /// Reroll every die and clear all kept flags. Every turn starts here.
    pub fn roll_all(&mut self) -> Vec<u8> {
        for die in self.dice.iter_mut() {
            let v = self.roll_gen.gen();
            // unwrap ok: generators only produce faces in [1, 6]
            die.set_value(v).unwrap();
            die.release();
        }
        debug!("Rolled all dice: {:?}", self.values());
        self.values()
    }

    /// Reroll only the dice that are not kept. Returns the new values of
    /// those dice; empty (and nothing changes) when every die is kept.
    pub fn roll_available(&mut self) -> Vec<u8> {
        if self.is_all_kept() {
            return vec![];
        }
        for die in self.dice.iter_mut().filter(|d| !d.kept()) {
            let v = self.roll_gen.gen();
            // unwrap ok: generators only produce faces in [1, 6]
            die.set_value(v).unwrap();
        }
        debug!("Rolled available dice: {:?}", self.available_values());
        self.available_values()
    }

    /// Mark the dice at the given positions kept. The whole batch is
    /// validated before any die is touched: a bad batch keeps nothing.
    pub fn keep_dice(&mut self, indices: &[usize]) -> Result<(), DiceSetError> {
        let mut seen = vec![false; self.dice.len()];
        for idx in indices {
            if *idx >= self.dice.len() {
                return Err(DiceSetError::IndexOutOfRange(*idx));
            }
            if self.dice[*idx].kept() || seen[*idx] {
                return Err(DiceSetError::AlreadyKept(*idx));
            }
            seen[*idx] = true;
        }
        for idx in indices {
            self.dice[*idx].keep();
        }
        debug!("Kept dice at indices {:?}", indices);
        Ok(())
    }

    /// Mark every available die showing the given face kept. Returns the
    /// positions that were newly kept, which may be none.
    pub fn keep_dice_with_value(&mut self, value: u8) -> Vec<usize> {
        let mut kept = vec![];
        for (idx, die) in self.dice.iter_mut().enumerate() {
            if !die.kept() && die.value() == value {
                die.keep();
                kept.push(idx);
            }
        }
        debug!("Kept dice with value {} at indices {:?}", value, kept);
        kept
    }

    pub fn release_all(&mut self) {
        for die in self.dice.iter_mut() {
            die.release();
        }
    }
}

impl fmt::Display for DiceSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let dice: Vec<String> = self
            .dice
            .iter()
            .map(|d| {
                if d.kept() {
                    format!("{}*", d.value())
                } else {
                    format!("{}", d.value())
                }
            })
            .collect();
        write!(f, "Dice<{}>", dice.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::{DiceSet, DiceSetError};
    use crate::randroll::ScriptedRolls;

    fn scripted_set(count: usize, rolls: &[u8]) -> DiceSet {
        DiceSet::new(count, Box::new(ScriptedRolls::new(rolls)))
    }

    #[test]
    fn new_set_is_placeholders() {
        let ds = scripted_set(6, &[]);
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.values(), vec![1; 6]);
        assert_eq!(ds.kept_count(), 0);
        assert!(!ds.is_all_kept());
    }

    #[test]
    fn roll_all_assigns_in_order() {
        let mut ds = scripted_set(6, &[3, 1, 4, 1, 5, 6]);
        let vals = ds.roll_all();
        assert_eq!(vals, vec![3, 1, 4, 1, 5, 6]);
        assert_eq!(ds.values(), vals);
    }

    #[test]
    fn roll_all_releases_kept() {
        let mut ds = scripted_set(3, &[2, 2, 2, 4, 4, 4]);
        ds.roll_all();
        ds.keep_dice(&[0, 2]).unwrap();
        assert_eq!(ds.kept_count(), 2);
        let vals = ds.roll_all();
        assert_eq!(vals, vec![4, 4, 4]);
        assert_eq!(ds.kept_count(), 0);
    }

    #[test]
    fn roll_available_skips_kept() {
        let mut ds = scripted_set(4, &[1, 2, 3, 4, 6, 6]);
        ds.roll_all();
        ds.keep_dice(&[0, 3]).unwrap();
        let vals = ds.roll_available();
        assert_eq!(vals, vec![6, 6]);
        // kept dice are untouched
        assert_eq!(ds.values(), vec![1, 6, 6, 4]);
        assert_eq!(ds.kept_values(), vec![1, 4]);
    }

    #[test]
    fn roll_available_all_kept_is_noop() {
        let mut ds = scripted_set(2, &[5, 5]);
        ds.roll_all();
        ds.keep_dice(&[0, 1]).unwrap();
        assert!(ds.is_all_kept());
        assert_eq!(ds.roll_available(), Vec::<u8>::new());
        assert_eq!(ds.values(), vec![5, 5]);
        assert!(ds.is_all_kept());
    }

    #[test]
    fn available_views_line_up() {
        let mut ds = scripted_set(4, &[1, 2, 3, 4]);
        ds.roll_all();
        ds.keep_dice(&[1]).unwrap();
        assert_eq!(ds.available_indices(), vec![0, 2, 3]);
        assert_eq!(ds.available_values(), vec![1, 3, 4]);
    }

    #[test]
    fn keep_out_of_range() {
        let mut ds = scripted_set(3, &[1, 1, 1]);
        ds.roll_all();
        let res = ds.keep_dice(&[0, 3]);
        assert!(res.is_err());
        match res.unwrap_err() {
            DiceSetError::IndexOutOfRange(idx) => assert_eq!(idx, 3),
            e => panic!("wrong error {:?}", e),
        }
        // atomic: the valid index was not kept either
        assert_eq!(ds.kept_count(), 0);
    }

    #[test]
    fn keep_already_kept() {
        let mut ds = scripted_set(3, &[1, 1, 1]);
        ds.roll_all();
        ds.keep_dice(&[1]).unwrap();
        let res = ds.keep_dice(&[0, 1]);
        assert!(res.is_err());
        match res.unwrap_err() {
            DiceSetError::AlreadyKept(idx) => assert_eq!(idx, 1),
            e => panic!("wrong error {:?}", e),
        }
        assert_eq!(ds.kept_count(), 1);
    }

    #[test]
    fn keep_repeated_index_in_batch() {
        let mut ds = scripted_set(3, &[1, 1, 1]);
        ds.roll_all();
        assert!(ds.keep_dice(&[0, 0]).is_err());
        assert_eq!(ds.kept_count(), 0);
    }

    #[test]
    fn keep_with_value() {
        let mut ds = scripted_set(6, &[2, 3, 2, 3, 2, 1]);
        ds.roll_all();
        assert_eq!(ds.keep_dice_with_value(2), vec![0, 2, 4]);
        assert_eq!(ds.kept_count(), 3);
        // already-kept dice are not re-reported
        assert_eq!(ds.keep_dice_with_value(2), Vec::<usize>::new());
        // no die shows this face
        assert_eq!(ds.keep_dice_with_value(6), Vec::<usize>::new());
    }

    #[test]
    fn release_all() {
        let mut ds = scripted_set(4, &[1, 2, 3, 4]);
        ds.roll_all();
        ds.keep_dice(&[0, 1, 2, 3]).unwrap();
        assert!(ds.is_all_kept());
        ds.release_all();
        assert_eq!(ds.kept_count(), 0);
        assert_eq!(ds.values(), vec![1, 2, 3, 4]);
    }
}
