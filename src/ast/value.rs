use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Literal values that can be stored on a slot as a default and emitted into code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Bool(bool),
    Text(String),
    Null,
}

// Manual implementation to handle f64
impl Eq for Value {}

// Manual implementation to handle f64 by hashing its bits
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Value::Number(n) => n.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Text(s) => s.hash(state),
            Value::Null => {} // Null has no data to hash
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) if n.is_nan() => f.write_str("double.NaN"),
            Value::Number(n) if n.is_infinite() => f.write_str(if *n > 0.0 {
                "double.PositiveInfinity"
            } else {
                "double.NegativeInfinity"
            }),
            Value::Number(n) if n.fract() == 0.0 => {
                // `i64::MAX as f64` rounds up to 2^63, which is itself out of range.
                if *n >= i64::MIN as f64 && *n < i64::MAX as f64 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{:e}", n)
                }
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => {
                f.write_str("\"")?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        other => write!(f, "{}", other)?,
                    }
                }
                f.write_str("\"")
            }
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_render_as_valid_literals() {
        assert_eq!(Value::from(5).to_string(), "5");
        assert_eq!(Value::from(-2.5).to_string(), "-2.5");
        assert_eq!(Value::from(1e20).to_string(), "1e20");
        assert_eq!(Value::from(-1e300).to_string(), "-1e300");
        assert_eq!(Value::from(f64::NAN).to_string(), "double.NaN");
        assert_eq!(Value::from(f64::INFINITY).to_string(), "double.PositiveInfinity");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "double.NegativeInfinity");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(Value::from("say \"hi\"\n").to_string(), "\"say \\\"hi\\\"\\n\"");
    }
}
