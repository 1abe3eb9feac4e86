use super::Expression;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A statement of a generated function body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statement {
    Expression(Expression),
    Assign {
        target: String,
        value: Expression,
    },
    /// `var name = value;`, or `type name;` when there is no initializer.
    Declare {
        name: String,
        type_name: Option<String>,
        value: Option<Expression>,
    },
    IfGoto {
        condition: Expression,
        label: String,
    },
    Goto(String),
    Label(String),
    Return,
    Continue,
    Foreach {
        item: String,
        collection: Expression,
        body: Vec<Statement>,
    },
    /// Statements copied from a free-form fragment, possibly spanning several lines.
    Raw(String),
}

impl Statement {
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Statement::Goto(_) | Statement::Return | Statement::Continue
        )
    }
}

/// Single-line rendering; nested bodies are rendered inline between braces.
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expression(expression) => write!(f, "{};", expression),
            Statement::Assign { target, value } => write!(f, "{} = {};", target, value),
            Statement::Declare {
                name,
                type_name,
                value,
            } => match (type_name, value) {
                (Some(ty), Some(value)) => write!(f, "{} {} = {};", ty, name, value),
                (None, Some(value)) => write!(f, "var {} = {};", name, value),
                (Some(ty), None) => write!(f, "{} {};", ty, name),
                (None, None) => write!(f, "dynamic {};", name),
            },
            Statement::IfGoto { condition, label } => {
                write!(f, "if ({}) goto {};", condition, label)
            }
            Statement::Goto(label) => write!(f, "goto {};", label),
            Statement::Label(label) => write!(f, "{}:", label),
            Statement::Return => f.write_str("return;"),
            Statement::Continue => f.write_str("continue;"),
            Statement::Foreach {
                item,
                collection,
                body,
            } => {
                write!(f, "foreach (var {} in {}) {{", item, collection)?;
                for statement in body {
                    write!(f, " {}", statement)?;
                }
                f.write_str(" }")
            }
            Statement::Raw(text) => f.write_str(text.trim()),
        }
    }
}
