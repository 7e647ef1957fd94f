use crate::{Block, CallKind, Type, TypeVariable, Varargs};
use derivative::Derivative;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use strata_util::Shared;

/// Identifies a [`Symbol`] for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u64);

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(0);

impl SymbolId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        SymbolId(NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// The name of a native implementation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryPoint(pub Arc<str>);

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The formal description of one overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    /// The module the function is defined in.
    pub module: Arc<str>,

    /// The function's name within its module.
    pub name: Arc<str>,

    /// How a call to this overload is carried out.
    pub kind: CallKind,

    /// Return types first, then argument types.
    pub formals: Vec<Type>,

    /// How many of the leading formals are returns.
    pub retc: usize,

    /// Whether the last return or argument repeats.
    pub varargs: Varargs,

    /// The native implementation, if any.
    pub entry: Option<EntryPoint>,
}

impl Signature {
    /// The formal return types.
    pub fn returns(&self) -> &[Type] {
        &self.formals[..self.retc]
    }

    /// The formal argument types.
    pub fn arguments(&self) -> &[Type] {
        &self.formals[self.retc..]
    }

    /// The total number of formals.
    pub fn argc(&self) -> usize {
        self.formals.len()
    }

    /// The formal type for return slot `index`; the last return repeats if
    /// returns are variadic.
    pub fn formal_return(&self, index: usize) -> Option<&Type> {
        let returns = self.returns();

        match returns.get(index) {
            Some(r#type) => Some(r#type),
            None if self.varargs.returns => returns.last(),
            None => None,
        }
    }

    /// The formal type for argument slot `index` (counted from the first
    /// argument); the last argument repeats if arguments are variadic.
    pub fn formal_argument(&self, index: usize) -> Option<&Type> {
        let arguments = self.arguments();

        match arguments.get(index) {
            Some(r#type) => Some(r#type),
            None if self.varargs.arguments => arguments.last(),
            None => None,
        }
    }

    /// Whether argument slot `index` falls in the repeated trailing group.
    pub fn is_variadic_argument(&self, index: usize) -> bool {
        self.varargs.arguments && index + 1 >= self.arguments().len()
    }

    /// The distinct type variables referenced by the formals.
    pub fn type_variables(&self) -> Vec<TypeVariable> {
        self.formals
            .iter()
            .flat_map(Type::variables)
            .sorted()
            .dedup()
            .collect()
    }

    /// The polymorphism degree: how many distinct type variables the
    /// signature references (0 if it is not polymorphic).
    pub fn polymorphic(&self) -> u32 {
        self.type_variables().len() as u32
    }

    /// The highest type variable index referenced, which sizes the binding
    /// table.
    pub fn max_variable(&self) -> u32 {
        self.type_variables()
            .last()
            .map_or(0, |variable| variable.0)
    }

    /// Check that every type variable is within `1..=max`.
    pub fn validate(&self, max: u32) -> Result<(), TypeVariable> {
        match self
            .type_variables()
            .into_iter()
            .find(|variable| variable.0 == 0 || variable.0 > max)
        {
            Some(variable) => Err(variable),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dots = |variadic: bool, last: bool| if variadic && last { "..." } else { "" };

        write!(
            f,
            "{} {}.{}({})",
            self.kind,
            self.module,
            self.name,
            self.arguments()
                .iter()
                .enumerate()
                .map(|(index, r#type)| format!(
                    "{}{}",
                    r#type,
                    dots(self.varargs.arguments, index + 1 == self.arguments().len())
                ))
                .join(", ")
        )?;

        match self.returns() {
            [] => Ok(()),
            [r#type] => write!(f, ":{}{}", r#type, dots(self.varargs.returns, true)),
            returns => write!(
                f,
                ":({})",
                returns
                    .iter()
                    .enumerate()
                    .map(|(index, r#type)| format!(
                        "{}{}",
                        r#type,
                        dots(self.varargs.returns, index + 1 == returns.len())
                    ))
                    .join(", ")
            ),
        }
    }
}

/// A named function definition in the catalog. Same-named overloads form a
/// chain of peers in their module.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Symbol {
    /// Unique among all symbols, including specializations.
    pub id: SymbolId,

    /// The overload this symbol implements.
    pub signature: Signature,

    /// The instruction sequence of a user-defined function or factory.
    #[derivative(Debug = "ignore")]
    pub body: Option<Shared<Block>>,

    /// The generic symbol this specialization was cloned from.
    pub specialization_of: Option<SymbolId>,

    errors: AtomicBool,
    resolving: AtomicBool,
}

impl Symbol {
    /// A native command or pattern.
    pub fn native(signature: Signature) -> Self {
        Symbol {
            id: SymbolId::next(),
            signature,
            body: None,
            specialization_of: None,
            errors: AtomicBool::new(false),
            resolving: AtomicBool::new(false),
        }
    }

    /// A user-defined function or factory.
    pub fn function(signature: Signature, body: Block) -> Self {
        Symbol {
            body: Some(Shared::new(body)),
            ..Symbol::native(signature)
        }
    }

    /// A specialization of `generic`. It is in progress until
    /// [`finish_resolving`](Symbol::finish_resolving) is called.
    pub fn specialization(generic: &Symbol, signature: Signature, body: Block) -> Self {
        Symbol {
            specialization_of: Some(generic.id),
            resolving: AtomicBool::new(true),
            ..Symbol::function(signature, body)
        }
    }

    /// Whether resolving the body produced errors. Readable while the body is
    /// locked for resolution.
    pub fn has_errors(&self) -> bool {
        self.errors.load(Ordering::Acquire)
    }

    /// Record whether resolving the body produced errors.
    pub fn set_errors(&self, errors: bool) {
        self.errors.store(errors, Ordering::Release);
    }

    /// Whether the body is still being resolved. Its error state isn't final
    /// until this returns `false`.
    pub fn is_resolving(&self) -> bool {
        self.resolving.load(Ordering::Acquire)
    }

    /// Record the final error state of a specialization's body.
    pub fn finish_resolving(&self, errors: bool) {
        self.set_errors(errors);
        self.resolving.store(false, Ordering::Release);
    }
}
