use std::fmt::{self, Display};

use crate::Error;

/// A memory size as entered by a human or read from configuration: either text with an optional
/// unit suffix (`"40GiB"`) or a bare number.
#[derive(Clone, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "mirrors the value shapes that configuration sources can produce"
)]
pub enum SizeInput {
    /// Text such as `"40GiB"`, `"512 MiB"` or `"1024"`.
    Text(String),

    /// A number that needs no further parsing.
    Integer(u64),

    /// A number with a fractional part that needs no further parsing.
    Float(f64),
}

impl From<&str> for SizeInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SizeInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for SizeInput {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for SizeInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// The bare magnitude of a size, with any unit suffix removed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "a magnitude is either integral or it is not"
)]
pub enum SizeValue {
    /// The magnitude had no fractional part.
    Integer(u64),

    /// The magnitude had a fractional part.
    Float(f64),
}

impl Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

/// Strips the unit suffix from a size and returns the bare magnitude.
///
/// No unit conversion takes place: `"40GiB"` becomes `40` and `"512MiB"` becomes `512`, because
/// the consumer of the value expects the magnitude in the unit it was written in. Numeric input
/// is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidSizeFormat`] if the text is neither `NUMBER [UNIT]` nor a plain,
/// finite, non-negative number, or if a [`SizeInput::Float`] is negative or not finite.
///
/// # Example
///
/// ```
/// use numa_pools::{SizeValue, extract_numeric_value};
///
/// assert_eq!(extract_numeric_value("40GiB").unwrap(), SizeValue::Integer(40));
/// assert_eq!(extract_numeric_value(1024_u64).unwrap(), SizeValue::Integer(1024));
/// assert_eq!(extract_numeric_value("1.5 GiB").unwrap(), SizeValue::Float(1.5));
/// ```
pub fn extract_numeric_value(size: impl Into<SizeInput>) -> crate::Result<SizeValue> {
    match size.into() {
        SizeInput::Integer(value) => Ok(SizeValue::Integer(value)),
        SizeInput::Float(value) if value.is_finite() && value.is_sign_positive() => {
            Ok(SizeValue::Float(value))
        }
        SizeInput::Float(value) => Err(Error::InvalidSizeFormat {
            value: value.to_string(),
        }),
        SizeInput::Text(text) => parse_size_text(&text),
    }
}

fn parse_size_text(text: &str) -> crate::Result<SizeValue> {
    let trimmed = text.trim();

    let invalid = || Error::InvalidSizeFormat {
        value: trimmed.to_string(),
    };

    if let Some((number, has_fraction)) = split_number_and_unit(trimmed) {
        return if has_fraction {
            number
                .parse::<f64>()
                .map(SizeValue::Float)
                .map_err(|_parse_error| invalid())
        } else {
            number
                .parse::<u64>()
                .map(SizeValue::Integer)
                .map_err(|_parse_error| invalid())
        };
    }

    // Not NUMBER [UNIT], but it may still be a number in another notation (e.g. "4e1").
    let value = trimmed.parse::<f64>().map_err(|_parse_error| invalid())?;

    if !value.is_finite() || value.is_sign_negative() {
        return Err(invalid());
    }

    Ok(integral_value(value).map_or(SizeValue::Float(value), SizeValue::Integer))
}

/// Matches `DIGITS [. DIGITS] [WHITESPACE] [LETTERS]` and returns the numeric part plus whether
/// it has a fractional component.
fn split_number_and_unit(text: &str) -> Option<(&str, bool)> {
    let integer_len = text.bytes().take_while(u8::is_ascii_digit).count();

    if integer_len == 0 {
        return None;
    }

    let (integer, rest) = text.split_at(integer_len);

    let (number_len, has_fraction, rest) = match rest.strip_prefix('.') {
        Some(after_point) => {
            let fraction_len = after_point.bytes().take_while(u8::is_ascii_digit).count();

            if fraction_len == 0 {
                return None;
            }

            let (_, unit) = after_point.split_at(fraction_len);
            (
                integer.len().checked_add(1)?.checked_add(fraction_len)?,
                true,
                unit,
            )
        }
        None => (integer.len(), false, rest),
    };

    let unit = rest.trim_start();

    if !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    text.get(..number_len).map(|number| (number, has_fraction))
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    reason = "the value is checked to be a non-negative integer within u64 range before casting"
)]
fn integral_value(value: f64) -> Option<u64> {
    if value.fract() == 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
