//! Compiler pass that binds every instruction in a block to a concrete,
//! type-correct implementation from the catalog, specializing polymorphic
//! functions along the way.

mod assign;
mod bind;
mod binder;
mod clone;
mod matcher;
mod resolve;
mod unify;

pub use bind::bind_function;
pub use binder::Binder;
pub use resolve::{prepare_signature, resolve_block, resolve_instruction};
pub use unify::unify;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strata_ir::{Symbol, Type};
use strata_util::WithInfo;

/// The recursion limit used unless the driver configures one.
pub const DEFAULT_RECURSION_LIMIT: u32 = 64;

/// Provides the typechecker with access to the catalog.
pub trait Driver: Sized {
    /// A handle to one module's symbols.
    type Module: Module;

    /// Look up a module by name.
    fn find_module(&self, name: &str) -> Option<Self::Module>;

    /// The highest type variable index a signature may use.
    fn max_type_variables(&self) -> u32 {
        strata_ir::DEFAULT_MAX_TYPE_VARIABLES
    }

    /// How many specializations may be in progress at once before cloning
    /// is treated as runaway recursion.
    fn recursion_limit(&self) -> u32 {
        DEFAULT_RECURSION_LIMIT
    }
}

/// The symbols registered in one module.
pub trait Module {
    /// The module's name.
    fn name(&self) -> &str;

    /// A snapshot of the overload chain for `function`, in lookup order.
    fn candidates(&self, function: &str) -> Vec<Arc<Symbol>>;

    /// Insert `specialization` immediately before `generic` in its chain. If
    /// an equivalent specialization of `generic` is already present, it is
    /// returned instead and `specialization` is discarded.
    fn insert_specialization(&self, generic: &Symbol, specialization: Symbol) -> Arc<Symbol>;
}

/// Where a diagnostic was raised.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    /// The name of the block containing the instruction.
    pub function: String,

    /// The index of the instruction in its block.
    pub pc: usize,
}

/// An error occurring during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum Diagnostic {
    /// No candidate in the overload chain matched the call.
    #[serde(rename_all = "camelCase")]
    UndefinedFunction {
        /// The module named by the call.
        module: String,

        /// The function named by the call.
        function: String,

        /// The types of the call's sources.
        arguments: Vec<Type>,
    },

    /// A matching candidate would assign to a constant.
    ConstantAssignment(String),

    /// A multiple assignment whose sources do not pair up with its
    /// destinations.
    #[serde(rename_all = "camelCase")]
    MultipleAssignmentMismatch {
        /// The number of destinations.
        returns: usize,

        /// The number of sources.
        sources: usize,
    },

    /// The source of an assignment does not unify with its destination.
    #[serde(rename_all = "camelCase")]
    TypeMismatch {
        /// The destination's type.
        destination: Type,

        /// The source's type.
        source: Type,
    },

    /// A native command was matched, but it has no entry point.
    #[serde(rename_all = "camelCase")]
    MissingImplementation {
        /// The command's module.
        module: String,

        /// The command's name.
        function: String,
    },

    /// The matched function's body contains errors.
    #[serde(rename_all = "camelCase")]
    ErroneousFunction {
        /// The function's module.
        module: String,

        /// The function's name.
        function: String,
    },

    /// Specializing a function required specializing it again before the
    /// first specialization finished, or exceeded the recursion limit.
    #[serde(rename_all = "camelCase")]
    RecursiveSpecialization {
        /// The generic function's module.
        module: String,

        /// The generic function's name.
        function: String,
    },
}

/// The outcome of a pass over a block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Instructions bound to a concrete implementation.
    pub resolved: usize,

    /// Instructions left for run time.
    pub deferred: usize,

    /// Instructions that failed to resolve.
    pub unresolved: usize,

    /// Errors raised during the pass. Silent probes that merely fail to find
    /// a match do not count.
    pub errors: u32,

    /// The diagnostics emitted during the pass, including those raised while
    /// resolving specializations. Empty in silent mode.
    pub diagnostics: Vec<WithInfo<Info, Diagnostic>>,
}

impl Report {
    /// Whether the pass raised any errors.
    pub fn is_erroneous(&self) -> bool {
        self.errors > 0
    }
}

#[cfg(test)]
mod tests;
