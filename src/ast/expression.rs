use super::Value;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier substituted for values that could not be resolved.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expression {
    Literal(Value),
    Identifier(String),
    Call {
        receiver: Option<Box<Expression>>,
        function: String,
        arguments: Vec<Expression>,
    },
    /// Code text taken verbatim from a free-form fragment.
    Raw(String),
}

impl Expression {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    pub fn unknown() -> Self {
        Expression::Identifier(UNKNOWN_IDENTIFIER.to_string())
    }

    /// Literals and identifiers can be spliced into other code without parentheses.
    pub fn is_simple(&self) -> bool {
        matches!(self, Expression::Literal(_) | Expression::Identifier(_))
    }

    /// Text suitable for splicing into surrounding code.
    pub fn to_operand(&self) -> String {
        if self.is_simple() || matches!(self, Expression::Call { .. }) {
            self.to_string()
        } else {
            format!("({})", self)
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Identifier(name) => f.write_str(name),
            Expression::Call {
                receiver,
                function,
                arguments,
            } => {
                if let Some(receiver) = receiver {
                    write!(f, "{}.", receiver.to_operand())?;
                }
                write!(f, "{}({})", function, arguments.iter().join(", "))
            }
            Expression::Raw(text) => f.write_str(text),
        }
    }
}
