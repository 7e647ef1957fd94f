use crate::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a variable within its [`Block`](crate::Block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VariableId(pub u32);

impl VariableId {
    /// Position of the variable in its block's variable table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal value held by a constant variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Value {
    Nil,
    Bit(bool),
    Int(i64),
    Str(String),
}

impl Value {
    /// The type a literal has before any coercion.
    pub fn natural_type(&self) -> Type {
        use crate::Scalar;

        match self {
            Value::Nil => Type::void(),
            Value::Bit(_) => Type::Scalar(Scalar::Bit),
            Value::Int(_) => Type::Scalar(Scalar::Int),
            Value::Str(_) => Type::Scalar(Scalar::Str),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bit(value) => write!(f, "{}", value),
            Value::Int(value) => write!(f, "{}", value),
            Value::Str(value) => write!(f, "{:?}", value),
        }
    }
}

/// A variable in an instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// The name used in listings and diagnostics.
    pub name: String,

    /// The current type. Variables start out as `any` unless declared.
    pub r#type: Type,

    /// Once set, the type may no longer change.
    pub fixed: bool,

    /// Constants may not be the destination of an assignment or call.
    pub constant: bool,

    /// Whether any instruction refers to the variable.
    pub used: bool,

    /// Whether the variable's value must be released by the garbage
    /// collector.
    pub cleanup: bool,

    /// The literal value of a constant.
    pub value: Option<Value>,
}

impl Variable {
    /// An untyped variable.
    pub fn new(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            r#type: Type::Any,
            fixed: false,
            constant: false,
            used: false,
            cleanup: false,
            value: None,
        }
    }

    /// A variable with a declared type, fixed from the start.
    pub fn typed(name: impl Into<String>, r#type: Type) -> Self {
        Variable {
            r#type,
            fixed: true,
            ..Variable::new(name)
        }
    }

    /// A constant holding `value`, typed as `r#type`.
    pub fn constant(name: impl Into<String>, r#type: Type, value: Value) -> Self {
        Variable {
            r#type,
            fixed: true,
            constant: true,
            value: Some(value),
            ..Variable::new(name)
        }
    }

    /// Assign the type and fix it, unless it was already fixed.
    pub fn fix(&mut self, r#type: Type) {
        if !self.fixed {
            self.r#type = r#type;
            self.fixed = true;
        }
    }
}
