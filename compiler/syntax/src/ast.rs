//! The syntax tree of a listing.

use crate::Span;
use serde::Serialize;
use strata_ir::{Barrier, CallKind, Type, Value, Varargs};
use strata_util::WithInfo;

/// A parsed listing: definitions and top-level statements, in source order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Definitions of commands, patterns, factories and functions.
    pub definitions: Vec<WithInfo<Span, Definition>>,

    /// Statements outside of any definition.
    pub statements: Vec<WithInfo<Span, Statement>>,
}

/// `kind module.name(parameters):returns [address entry];` and, for
/// functions, a body closed by `end name;`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// `command`, `pattern`, `factory` or `function`.
    pub kind: CallKind,

    /// The module the definition is added to.
    pub module: String,

    /// The function name within the module.
    pub name: String,

    /// Arguments, in order.
    pub parameters: Vec<Parameter>,

    /// Returned values. A bare return type is named `result`.
    pub returns: Vec<Parameter>,

    /// Whether the last parameter or return is followed by `...`.
    pub varargs: Varargs,

    /// The native entry point after `address`.
    pub address: Option<String>,

    /// The statements of a function without an address.
    pub body: Option<Vec<WithInfo<Span, Statement>>>,
}

/// A named and typed slot in a signature.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    pub r#type: Type,
}

/// `[barrier] targets [:= source];`
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    pub barrier: Option<Barrier>,
    pub targets: Vec<Target>,
    pub source: Source,
}

/// A destination of a statement, optionally declaring its type.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    pub r#type: Option<Type>,
}

/// The right-hand side of a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Source {
    /// No right-hand side, as in `exit go;`.
    None,

    /// `(a, b)` or a single operand.
    Operands(Vec<Operand>),

    /// `module.function(arguments)`.
    #[serde(rename_all = "camelCase")]
    Call {
        /// The module to look the function up in.
        module: Callee,

        /// The function to call.
        function: Callee,

        /// The sources passed to the call.
        arguments: Vec<Operand>,
    },
}

/// A module or function name in a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Callee {
    /// Written directly.
    Name(String),

    /// `$name`: taken from a variable at run time.
    Variable(String),
}

/// An argument or assigned value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Operand {
    /// A variable, optionally declaring its type.
    Variable(Target),

    /// A literal, which becomes a constant.
    Literal(Value),
}
