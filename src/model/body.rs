use serde::{Deserialize, Serialize};
use std::fmt;

/// Expression forms the pass needs to produce or recognise. Everything else
/// a host hands over stays opaque in [`Expr::Raw`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    This,
    Var { name: String },
    Field { name: String },
    Str { value: String },
    Call {
        method: String,
        args: Vec<Expr>,
    },
    Raw { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Statement {
    Expr { expr: Expr },
    Assign { target: Expr, value: Expr },
    Return { value: Expr },
    Raw { text: String },
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var { name: name.into() }
    }

    pub fn field(name: impl Into<String>) -> Self {
        Expr::Field { name: name.into() }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str {
            value: value.into(),
        }
    }

    /// Call of `method` on `this`.
    pub fn call(method: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            method: method.into(),
            args,
        }
    }
}

impl Statement {
    pub fn expr(expr: Expr) -> Self {
        Statement::Expr { expr }
    }

    pub fn assign_field(field: impl Into<String>, value: Expr) -> Self {
        Statement::Assign {
            target: Expr::field(field),
            value,
        }
    }

    pub fn returning(value: Expr) -> Self {
        Statement::Return { value }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::This => write!(f, "this"),
            Expr::Var { name } => write!(f, "{}", name),
            Expr::Field { name } => write!(f, "this.{}", name),
            Expr::Str { value } => write!(f, "\"{}\"", value.replace('"', "\\\"")),
            Expr::Call { method, args } => {
                write!(f, "this.{}(", method)?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Raw { text } => write!(f, "{}", text),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Expr { expr } => write!(f, "{}", expr),
            Statement::Assign { target, value } => write!(f, "{} = {}", target, value),
            Statement::Return { value } => write!(f, "return {}", value),
            Statement::Raw { text } => write!(f, "{}", text),
        }
    }
}
