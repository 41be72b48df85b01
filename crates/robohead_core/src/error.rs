use thiserror::Error;

/// Configuration rejected at construction time, before any tick runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must not be negative (got {value})")]
    NegativeDuration { field: &'static str, value: f64 },

    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field}: min ({min}) is greater than max ({max})")]
    InvertedInterval {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number (got {value})")]
    NotFinite { field: &'static str, value: f64 },

    #[error("unknown mood id '{0}'")]
    UnknownMood(String),
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_infinite() {
        return Err(ConfigError::NotFinite { field, value });
    }
    Ok(())
}

pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value.is_nan() || value < 0.0 {
        return Err(ConfigError::NegativeDuration { field, value });
    }
    Ok(())
}

/// Strictly positive: used for values that end up as divisors.
pub(crate) fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value.is_nan() || value <= 0.0 {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::INFINITY,
        });
    }
    Ok(())
}

pub(crate) fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value.is_nan() || value < min || value > max {
        return Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn interval(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    non_negative(field, min)?;
    non_negative(field, max)?;
    if min > max {
        return Err(ConfigError::InvertedInterval { field, min, max });
    }
    Ok(())
}
