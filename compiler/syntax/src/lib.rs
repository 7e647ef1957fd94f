//! Compiler pass that parses a textual listing of definitions and
//! instructions into a syntax tree.

pub mod ast;
pub mod parse;
pub mod tokenize;

pub use ast::Listing;
pub use parse::parse;

use std::ops::Range;
use strata_ir::ParseTypeError;

/// Byte offsets into the listing.
pub type Span = Range<usize>;

/// An error occurring during parsing.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("unrecognized token `{text}` at offset {offset}")]
    InvalidToken { offset: usize, text: String },

    #[error("expected {expected} at offset {offset}")]
    Expected {
        expected: &'static str,
        offset: usize,
    },

    #[error("invalid type at offset {offset}: {source}")]
    InvalidType {
        offset: usize,
        #[source]
        source: ParseTypeError,
    },

    #[error("definition at offset {offset} has no return values")]
    MissingReturns { offset: usize },

    #[error("only the last parameter may be variadic (offset {offset})")]
    VariadicNotLast { offset: usize },

    #[error("`end {found}` at offset {offset} does not close function `{expected}`")]
    MismatchedEnd {
        expected: String,
        found: String,
        offset: usize,
    },

    #[error("function `{name}` at offset {offset} is missing `end {name};`")]
    UnterminatedFunction { name: String, offset: usize },
}

impl Error {
    /// Where in the listing the error occurred.
    pub fn offset(&self) -> usize {
        match self {
            Error::InvalidToken { offset, .. }
            | Error::Expected { offset, .. }
            | Error::InvalidType { offset, .. }
            | Error::MissingReturns { offset }
            | Error::VariadicNotLast { offset }
            | Error::MismatchedEnd { offset, .. }
            | Error::UnterminatedFunction { offset, .. } => *offset,
        }
    }
}
