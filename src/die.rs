use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum DieError {
    OutOfRange(u8),
}

impl Error for DieError {}
impl fmt::Display for DieError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DieError::OutOfRange(v) => write!(f, "val {:?} out of range", v),
        }
    }
}

/// A single six-sided die: a face value and whether the player has set it
/// aside this turn. Owned by a DiceSet for its entire life.
#[derive(Serialize, Deserialize, PartialEq, Copy, Clone, Debug)]
pub struct Die {
    value: u8,
    kept: bool,
}

impl Die {
    pub fn new(value: u8) -> Result<Self, DieError> {
        if value < 1 || value > 6 {
            Err(DieError::OutOfRange(value))
        } else {
            Ok(Self { value, kept: false })
        }
    }

    pub fn value(self) -> u8 {
        self.value
    }

    pub fn kept(self) -> bool {
        self.kept
    }

    /// Assign a new face value, keeping the [1, 6] invariant.
    pub fn set_value(&mut self, value: u8) -> Result<(), DieError> {
        if value < 1 || value > 6 {
            return Err(DieError::OutOfRange(value));
        }
        self.value = value;
        Ok(())
    }

    pub fn keep(&mut self) {
        self.kept = true;
    }

    pub fn release(&mut self) {
        self.kept = false;
    }
}

impl Default for Die {
    /// A placeholder die showing face 1, available. Real faces come from the
    /// first roll.
    fn default() -> Self {
        Self {
            value: 1,
            kept: false,
        }
    }
}

impl fmt::Display for Die {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        if self.kept {
            write!(f, "Die<{} kept>", self.value)
        } else {
            write!(f, "Die<{}>", self.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Die;
    use super::DieError;

    #[test]
    fn new_ok() {
        for v in [1, 2, 3, 4, 5, 6].iter() {
            let d = Die::new(*v);
            assert!(d.is_ok());
            let d = d.unwrap();
            assert_eq!(d.value(), *v);
            assert!(!d.kept());
        }
    }

    #[test]
    fn new_err_oor() {
        for v in [0, 7, 10, 100, 255].iter() {
            let d = Die::new(*v);
            assert!(d.is_err());
            let d = d.unwrap_err();
            match d {
                DieError::OutOfRange(_) => {}
            }
        }
    }

    #[test]
    fn set_value_ok() {
        let mut d = Die::new(1).unwrap();
        for v in [1, 2, 3, 4, 5, 6].iter() {
            d.set_value(*v).unwrap();
            assert_eq!(d.value(), *v);
        }
    }

    #[test]
    fn set_value_err_keeps_old() {
        let mut d = Die::new(3).unwrap();
        for v in [0, 7, 42].iter() {
            assert!(d.set_value(*v).is_err());
            assert_eq!(d.value(), 3);
        }
    }

    #[test]
    fn keep_release_idempotent() {
        let mut d = Die::new(4).unwrap();
        assert!(!d.kept());
        d.keep();
        assert!(d.kept());
        d.keep();
        assert!(d.kept());
        d.release();
        assert!(!d.kept());
        d.release();
        assert!(!d.kept());
    }

    #[test]
    fn keep_does_not_touch_value() {
        let mut d = Die::new(5).unwrap();
        d.keep();
        assert_eq!(d.value(), 5);
        d.release();
        assert_eq!(d.value(), 5);
    }
}
