use crate::{EntryPoint, Symbol, SymbolId, VariableId};
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use strum::{Display, EnumString};

/// The name of a module or function referenced by a call. The name may only
/// be known at run time, when it is held in a variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Name(Arc<str>),
    Variable(VariableId),
}

impl Identifier {
    /// The static name, if there is one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Identifier::Name(name) => Some(name),
            Identifier::Variable(_) => None,
        }
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Name(Arc::from(name))
    }
}

/// How far resolution of an instruction has progressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    /// Not yet resolved, or resolution failed.
    #[default]
    Unresolved,

    /// Bound to a concrete implementation with all types known.
    Resolved,

    /// Left for run time, because the callee or an argument type is not
    /// statically known.
    Dynamic,
}

/// The kind of implementation behind a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum CallKind {
    /// A native implementation with a fixed calling convention.
    Command,

    /// A native implementation that receives the whole stack frame.
    Pattern,

    /// A user-defined function that keeps its state between calls.
    Factory,

    /// A user-defined function with an instruction-sequence body.
    Function,
}

/// Control-flow markers. Instructions carrying one are never resolved as
/// ordinary calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "lowercase")]
pub enum Barrier {
    Barrier,
    Catch,
    Exit,
    Leave,
    Redo,
    Raise,
}

/// Whether the trailing argument or return of a signature repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Varargs {
    pub arguments: bool,
    pub returns: bool,
}

impl Varargs {
    /// Whether either group repeats.
    pub fn any(self) -> bool {
        self.arguments || self.returns
    }
}

/// The implementation an instruction was bound to. Selected once on
/// successful resolution and replaced wholesale on re-resolution.
#[derive(Clone)]
pub enum Binding {
    NativeCommand {
        symbol: SymbolId,
        entry: EntryPoint,
    },
    NativePattern {
        symbol: SymbolId,
        entry: Option<EntryPoint>,
    },
    Factory(Arc<Symbol>),
    UserFunction(Arc<Symbol>),
    PlainAssignment,
}

impl Binding {
    /// The bound callee, or `None` for plain assignments.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Binding::NativeCommand { symbol, .. } | Binding::NativePattern { symbol, .. } => {
                Some(*symbol)
            }
            Binding::Factory(symbol) | Binding::UserFunction(symbol) => Some(symbol.id),
            Binding::PlainAssignment => None,
        }
    }

    /// The call kind of the bound callee.
    pub fn call_kind(&self) -> Option<CallKind> {
        match self {
            Binding::NativeCommand { .. } => Some(CallKind::Command),
            Binding::NativePattern { .. } => Some(CallKind::Pattern),
            Binding::Factory(_) => Some(CallKind::Factory),
            Binding::UserFunction(_) => Some(CallKind::Function),
            Binding::PlainAssignment => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::NativeCommand { symbol, entry } => f
                .debug_struct("NativeCommand")
                .field("symbol", symbol)
                .field("entry", entry)
                .finish(),
            Binding::NativePattern { symbol, entry } => f
                .debug_struct("NativePattern")
                .field("symbol", symbol)
                .field("entry", entry)
                .finish(),
            Binding::Factory(symbol) => f.debug_tuple("Factory").field(&symbol.id).finish(),
            Binding::UserFunction(symbol) => {
                f.debug_tuple("UserFunction").field(&symbol.id).finish()
            }
            Binding::PlainAssignment => f.write_str("PlainAssignment"),
        }
    }
}

/// One operation in an instruction sequence: a call or an assignment.
#[derive(Debug, Clone, Default)]
pub struct Instruction {
    /// Destinations first, then sources.
    pub arguments: Vec<VariableId>,

    /// How many of the leading [`arguments`](Instruction::arguments) are
    /// destinations.
    pub retc: usize,

    pub module: Option<Identifier>,
    pub function: Option<Identifier>,
    pub status: Status,
    pub binding: Option<Binding>,
    pub barrier: Option<Barrier>,

    /// Copied from the bound signature.
    pub polymorphic: u32,
    pub varargs: Varargs,

    /// Whether any argument needs to be released by the garbage collector.
    pub gc: bool,
}

impl Instruction {
    /// `(returns) := module.function(arguments)`.
    pub fn call(
        module: impl Into<Identifier>,
        function: impl Into<Identifier>,
        returns: impl IntoIterator<Item = VariableId>,
        arguments: impl IntoIterator<Item = VariableId>,
    ) -> Self {
        let mut instruction = Instruction::assign(returns, arguments);
        instruction.module = Some(module.into());
        instruction.function = Some(function.into());
        instruction
    }

    /// `(returns) := (arguments)`.
    pub fn assign(
        returns: impl IntoIterator<Item = VariableId>,
        arguments: impl IntoIterator<Item = VariableId>,
    ) -> Self {
        let mut all = returns.into_iter().collect::<Vec<_>>();
        let retc = all.len();
        all.extend(arguments);

        Instruction {
            arguments: all,
            retc,
            ..Default::default()
        }
    }

    /// Attach a control-flow marker.
    pub fn with_barrier(mut self, barrier: Barrier) -> Self {
        self.barrier = Some(barrier);
        self
    }

    /// The destination slots.
    pub fn returns(&self) -> &[VariableId] {
        &self.arguments[..self.retc]
    }

    /// The source slots.
    pub fn sources(&self) -> &[VariableId] {
        &self.arguments[self.retc..]
    }

    /// The total number of slots.
    pub fn argc(&self) -> usize {
        self.arguments.len()
    }

    /// Whether the instruction calls a function rather than assigning.
    pub fn is_call(&self) -> bool {
        self.function.is_some()
    }

    /// Whether the instruction has been bound to a concrete implementation.
    pub fn is_resolved(&self) -> bool {
        self.status == Status::Resolved
    }

    /// The module and function names, if both are statically known.
    pub fn static_target(&self) -> Option<(&str, &str)> {
        Some((
            self.module.as_ref()?.as_name()?,
            self.function.as_ref()?.as_name()?,
        ))
    }

    /// Forget the result of a previous resolution. Called after a rewrite
    /// changes the instruction so the next pass checks it again.
    pub fn invalidate(&mut self) {
        self.status = Status::Unresolved;
        self.binding = None;
        self.polymorphic = 0;
        self.varargs = Varargs::default();
    }
}
