//! Types and type variables.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};
use strum::EnumString;

/// The highest type variable index accepted unless configured otherwise.
pub const DEFAULT_MAX_TYPE_VARIABLES: u32 = 9;

/// A scalar base type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum Scalar {
    /// The type of `nil` literals.
    Void,
    Bit,
    Bte,
    Sht,
    Int,
    Lng,
    Oid,
    Flt,
    Dbl,
    Str,
    Date,
    Daytime,
    Timestamp,
    Blob,
    Ptr,

    /// An atom registered by an extension module (eg. `url` or `inet`).
    #[strum(default)]
    Atom(Arc<str>),
}

impl Scalar {
    /// The name used in listings.
    pub fn name(&self) -> &str {
        match self {
            Scalar::Void => "void",
            Scalar::Bit => "bit",
            Scalar::Bte => "bte",
            Scalar::Sht => "sht",
            Scalar::Int => "int",
            Scalar::Lng => "lng",
            Scalar::Oid => "oid",
            Scalar::Flt => "flt",
            Scalar::Dbl => "dbl",
            Scalar::Str => "str",
            Scalar::Date => "date",
            Scalar::Daytime => "daytime",
            Scalar::Timestamp => "timestamp",
            Scalar::Blob => "blob",
            Scalar::Ptr => "ptr",
            Scalar::Atom(name) => name,
        }
    }

    /// Whether values of this type are stored as strings.
    pub fn is_string_like(&self) -> bool {
        matches!(self, Scalar::Str)
    }

    /// Whether values of this type own storage outside the fixed-width value
    /// and must be released by the garbage collector.
    pub fn is_externally_managed(&self) -> bool {
        matches!(self, Scalar::Str | Scalar::Blob | Scalar::Atom(_))
    }
}

/// A numbered placeholder in a polymorphic signature (`any_1`, `any_2`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeVariable(pub u32);

impl TypeVariable {
    /// The table slot used by this variable.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One half of a container type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Component {
    Scalar(Scalar),
    Any,
    Variable(TypeVariable),
}

impl Component {
    /// Convert the component into a standalone type.
    pub fn to_type(&self) -> Type {
        match self {
            Component::Scalar(scalar) => Type::Scalar(scalar.clone()),
            Component::Any => Type::Any,
            Component::Variable(variable) => Type::Variable(*variable),
        }
    }

    /// Convert a type into a component. Containers cannot be nested, so they
    /// become `any`.
    pub fn from_type(r#type: &Type) -> Self {
        match r#type {
            Type::Scalar(scalar) => Component::Scalar(scalar.clone()),
            Type::Variable(variable) => Component::Variable(*variable),
            Type::Any | Type::Bat | Type::Container { .. } => Component::Any,
        }
    }

    /// The type variable referenced by this component, if any.
    pub fn variable(&self) -> Option<TypeVariable> {
        match self {
            Component::Variable(variable) => Some(*variable),
            _ => None,
        }
    }
}

/// The type of a variable or formal parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Type {
    Scalar(Scalar),

    /// The universal unknown type (`any`).
    Any,

    /// A reference to a type variable (`any_N`).
    Variable(TypeVariable),

    /// The bare container wildcard (`bat`).
    Bat,

    /// A container with independently typed key and value components.
    Container { key: Component, value: Component },
}

impl Type {
    /// Build a container type.
    pub fn container(key: Component, value: Component) -> Self {
        Type::Container { key, value }
    }

    /// The `void` type, used by `nil` literals.
    pub fn void() -> Self {
        Type::Scalar(Scalar::Void)
    }

    /// Whether this is a container with components (not the bare wildcard).
    pub fn is_container(&self) -> bool {
        matches!(self, Type::Container { .. })
    }

    /// Whether this is a container or the bare container wildcard.
    pub fn is_container_like(&self) -> bool {
        matches!(self, Type::Container { .. } | Type::Bat)
    }

    /// Whether this type is `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, Type::Scalar(Scalar::Void))
    }

    /// Whether this type references a type variable anywhere.
    pub fn is_any_expression(&self) -> bool {
        self.variables().next().is_some()
    }

    /// Whether a variable of this type cannot be laid out before run time.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Type::Any) || self.is_any_expression()
    }

    /// Whether values of this type need to be released by the garbage
    /// collector.
    pub fn needs_cleanup(&self) -> bool {
        match self {
            Type::Bat | Type::Container { .. } => true,
            Type::Scalar(scalar) => scalar.is_string_like() || scalar.is_externally_managed(),
            Type::Any | Type::Variable(_) => false,
        }
    }

    /// The type variables referenced by this type, in key-then-value order.
    pub fn variables(&self) -> impl Iterator<Item = TypeVariable> + '_ {
        let (first, second) = match self {
            Type::Variable(variable) => (Some(*variable), None),
            Type::Container { key, value } => (key.variable(), value.variable()),
            Type::Scalar(_) | Type::Any | Type::Bat => (None, None),
        };

        first.into_iter().chain(second)
    }

    /// The key component of a container, or `None` for any other type.
    pub fn key(&self) -> Option<&Component> {
        match self {
            Type::Container { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The value component of a container, or `None` for any other type.
    pub fn value(&self) -> Option<&Component> {
        match self {
            Type::Container { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The type variable in "tail" position: the variable itself for `any_N`,
    /// or the value component's variable for a container.
    pub fn tail_variable(&self) -> Option<TypeVariable> {
        match self {
            Type::Variable(variable) => Some(*variable),
            Type::Container { value, .. } => value.variable(),
            _ => None,
        }
    }

    /// The type variable in a container's key position.
    pub fn head_variable(&self) -> Option<TypeVariable> {
        self.key().and_then(Component::variable)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Scalar(scalar) => f.write_str(scalar.name()),
            Component::Any => f.write_str("any"),
            Component::Variable(variable) => write!(f, "any_{}", variable.0),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Scalar(scalar) => f.write_str(scalar.name()),
            Type::Any => f.write_str("any"),
            Type::Variable(variable) => write!(f, "any_{}", variable.0),
            Type::Bat => f.write_str("bat"),
            Type::Container { key, value } => write!(f, "bat[:{},:{}]", key, value),
        }
    }
}

/// An error produced while parsing a type from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTypeError {
    #[error("empty type")]
    Empty,

    #[error("malformed container type `{0}`")]
    MalformedContainer(String),

    #[error("malformed type variable `{0}`")]
    MalformedVariable(String),

    #[error("`{0}` is not a valid type name")]
    InvalidName(String),
}

impl FromStr for Component {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<Type>()? {
            Type::Scalar(scalar) => Ok(Component::Scalar(scalar)),
            Type::Any => Ok(Component::Any),
            Type::Variable(variable) => Ok(Component::Variable(variable)),
            Type::Bat | Type::Container { .. } => {
                Err(ParseTypeError::MalformedContainer(s.to_string()))
            }
        }
    }
}

impl FromStr for Type {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if s.is_empty() {
            return Err(ParseTypeError::Empty);
        }

        if s == "bat" {
            return Ok(Type::Bat);
        }

        if let Some(inner) = s.strip_prefix("bat[") {
            let malformed = || ParseTypeError::MalformedContainer(s.to_string());

            let (key, value) = inner
                .strip_suffix(']')
                .and_then(|inner| inner.split_once(','))
                .ok_or_else(malformed)?;

            let component = |text: &str| {
                text.trim()
                    .strip_prefix(':')
                    .ok_or_else(malformed)?
                    .parse::<Component>()
            };

            return Ok(Type::container(component(key)?, component(value)?));
        }

        if s == "any" {
            return Ok(Type::Any);
        }

        if let Some(index) = s.strip_prefix("any_") {
            let index = index
                .parse::<u32>()
                .map_err(|_| ParseTypeError::MalformedVariable(s.to_string()))?;

            // `any_0` is an alias of `any`
            return Ok(if index == 0 {
                Type::Any
            } else {
                Type::Variable(TypeVariable(index))
            });
        }

        let valid_name = s.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
            && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

        if !valid_name {
            return Err(ParseTypeError::InvalidName(s.to_string()));
        }

        s.parse::<Scalar>()
            .map(Type::Scalar)
            .map_err(|_| ParseTypeError::InvalidName(s.to_string()))
    }
}
