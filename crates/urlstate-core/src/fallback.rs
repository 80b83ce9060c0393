use crate::error::DecodeError;

/// Outcome of trying to read a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeAttempt<T> {
    /// Key not present in the store; the codec was never consulted.
    Absent,
    Decoded(T),
    Failed(DecodeError),
}

impl<T> DecodeAttempt<T> {
    pub fn from_result(r: Result<T, DecodeError>) -> Self {
        match r {
            Ok(v) => DecodeAttempt::Decoded(v),
            Err(e) => DecodeAttempt::Failed(e),
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodeAttempt::Decoded(_))
    }
}

/// Replaces a failed or missing decode with the default, whole.
///
/// There is no field-level merging: a value is either what the codec
/// produced or the default, never a mix of the two.
#[derive(Debug, Clone)]
pub struct Fallback<T> {
    default: T,
}

impl<T: Clone> Fallback<T> {
    pub fn new(default: T) -> Self {
        Self { default }
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn resolve(&self, attempt: DecodeAttempt<T>) -> T {
        match attempt {
            DecodeAttempt::Decoded(v) => v,
            DecodeAttempt::Absent | DecodeAttempt::Failed(_) => self.default.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoded_passes_through() {
        let f = Fallback::new(1);
        assert_eq!(f.resolve(DecodeAttempt::Decoded(5)), 5);
    }

    #[test]
    fn absent_and_failed_give_default() {
        let f = Fallback::new(String::from("d"));
        assert_eq!(f.resolve(DecodeAttempt::Absent), "d");
        assert_eq!(f.resolve(DecodeAttempt::Failed(DecodeError::Empty)), "d");
        assert_eq!(f.default_value(), "d");
    }
}
