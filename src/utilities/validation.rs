use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        expected: usize,
        got: usize,
        field: &'static str,
    },
    #[error("{field} cannot be empty")]
    EmptyInput { field: &'static str },
    #[error("{field} contains a negative value at index {index}")]
    NegativeValue { field: &'static str, index: usize },
    #[error("{field} contains an unordered value (NaN) at index {index}")]
    NaNValue { field: &'static str, index: usize },
    #[error("log-rank test needs at least 2 cohorts, got {got}")]
    InsufficientCohorts { got: usize },
    #[error("cohort {index} has no intervals")]
    EmptyCohort { index: usize },
}

pub fn validate_length(
    expected: usize,
    got: usize,
    field: &'static str,
) -> Result<(), ValidationError> {
    if expected != got {
        return Err(ValidationError::LengthMismatch {
            expected,
            got,
            field,
        });
    }
    Ok(())
}

pub fn validate_non_empty<T>(slice: &[T], field: &'static str) -> Result<(), ValidationError> {
    if slice.is_empty() {
        return Err(ValidationError::EmptyInput { field });
    }
    Ok(())
}

/// Rejects values that do not compare with themselves, e.g. `f64::NAN`.
pub fn validate_ordered<T, I>(values: I, field: &'static str) -> Result<(), ValidationError>
where
    T: PartialOrd,
    I: IntoIterator<Item = T>,
{
    for (index, value) in values.into_iter().enumerate() {
        if value.partial_cmp(&value).is_none() {
            return Err(ValidationError::NaNValue { field, index });
        }
    }
    Ok(())
}

/// Rejects values below `T::default()`, the origin of the time axis.
pub fn validate_non_negative<T, I>(values: I, field: &'static str) -> Result<(), ValidationError>
where
    T: PartialOrd + Default,
    I: IntoIterator<Item = T>,
{
    let origin = T::default();
    for (index, value) in values.into_iter().enumerate() {
        if value < origin {
            return Err(ValidationError::NegativeValue { field, index });
        }
    }
    Ok(())
}

pub fn validate_cohort_count(got: usize) -> Result<(), ValidationError> {
    if got < 2 {
        return Err(ValidationError::InsufficientCohorts { got });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_length() {
        assert!(validate_length(3, 3, "censored").is_ok());
        assert_eq!(
            validate_length(3, 2, "censored"),
            Err(ValidationError::LengthMismatch {
                expected: 3,
                got: 2,
                field: "censored"
            })
        );
    }

    #[test]
    fn test_validate_ordered_flags_nan_index() {
        let times = [1.0, 4.0, f64::NAN, 2.0];
        assert_eq!(
            validate_ordered(times, "time"),
            Err(ValidationError::NaNValue {
                field: "time",
                index: 2
            })
        );
        assert!(validate_ordered([3_u32, 1, 2], "time").is_ok());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative([0.0, 0.5, 10.0], "time").is_ok());
        assert_eq!(
            validate_non_negative([3_i64, -1], "time"),
            Err(ValidationError::NegativeValue {
                field: "time",
                index: 1
            })
        );
    }

    #[test]
    fn test_validate_cohort_count() {
        assert!(validate_cohort_count(2).is_ok());
        assert_eq!(
            validate_cohort_count(1),
            Err(ValidationError::InsufficientCohorts { got: 1 })
        );
    }
}
