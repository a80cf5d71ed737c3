//! Field tokenizer
//!
//! Splits a trace line into whitespace-delimited numeric fields. The tokenizer
//! knows nothing about record layouts; callers ask for integers or floats and
//! check the field count themselves.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// How conversion failures are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenMode {
    /// Unreadable tokens become zero and decoding continues
    #[default]
    Lenient,
    /// The first unreadable token is an error
    Strict,
}

/// A token that could not be converted to the requested type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot read field {column} ('{token}') as {expected}")]
pub struct TokenError {
    /// Zero-based field index within the line
    pub column: usize,
    /// The offending token
    pub token: String,
    /// Requested type name
    pub expected: &'static str,
}

/// Whitespace-delimited fields of a line
pub fn fields(line: &str) -> impl Iterator<Item = &str> {
    line.split_whitespace()
}

/// Parse every field of `line` as an integer
pub fn parse_ints(line: &str, mode: TokenMode) -> Result<Vec<i64>, TokenError> {
    parse_all(line, mode, "integer", |token| token.parse::<i64>().ok())
}

/// Parse every field of `line` as a float.
///
/// Fortran double-precision exponents (`1.5D+02`) are accepted.
pub fn parse_floats(line: &str, mode: TokenMode) -> Result<Vec<f64>, TokenError> {
    parse_all(line, mode, "float", |token| {
        fortran_exponent(token).parse::<f64>().ok()
    })
}

fn parse_all<T, F>(
    line: &str,
    mode: TokenMode,
    expected: &'static str,
    convert: F,
) -> Result<Vec<T>, TokenError>
where
    T: Default,
    F: Fn(&str) -> Option<T>,
{
    let mut values = Vec::new();
    for (column, token) in fields(line).enumerate() {
        match convert(token) {
            Some(value) => values.push(value),
            None => match mode {
                TokenMode::Lenient => {
                    log::debug!("Field {} ('{}') is not a valid {}, using 0", column, token, expected);
                    values.push(T::default());
                }
                TokenMode::Strict => {
                    return Err(TokenError {
                        column,
                        token: token.to_string(),
                        expected,
                    });
                }
            },
        }
    }
    Ok(values)
}

fn fortran_exponent(token: &str) -> Cow<'_, str> {
    if token.contains(['D', 'd']) {
        Cow::Owned(token.replace(['D', 'd'], "E"))
    } else {
        Cow::Borrowed(token)
    }
}
