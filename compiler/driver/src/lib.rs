//! Coordinates the compiler passes: parsing a listing, defining its symbols
//! in the catalog and resolving every block.

mod lower;

pub use lower::{qualified_name, MAIN};
pub use strata_catalog as catalog;
pub use strata_ir as ir;
pub use strata_syntax as syntax;
pub use strata_typecheck as typecheck;
pub use strata_util as util;

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path, sync::Arc};
use strata_catalog::{Catalog, ModuleScope};
use strata_ir::{Symbol, Type};
use strata_syntax::Span;

/// Settings for a [`Session`]. Every field may be omitted from a
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Suppress diagnostics for calls that fail to resolve.
    pub silent: bool,

    /// The highest type variable index a signature may use.
    pub max_type_variables: u32,

    /// How deeply specializations may nest.
    pub recursion_limit: u32,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            silent: false,
            max_type_variables: ir::DEFAULT_MAX_TYPE_VARIABLES,
            recursion_limit: typecheck::DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl Options {
    /// Load options from a JSON file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: util::get_visible_path(path),
            source: Arc::new(source),
        })?;

        serde_json::from_str(&contents).map_err(|source| Error::Options {
            path: util::get_visible_path(path),
            source: Arc::new(source),
        })
    }
}

/// Errors that stop a listing from being checked at all. Problems found
/// while resolving are reported as [`typecheck::Diagnostic`]s instead.
#[allow(missing_docs)]
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("invalid options in {path}: {source}")]
    Options {
        path: String,
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error(transparent)]
    Syntax(#[from] syntax::Error),

    #[error("`{signature}` uses type variable any_{variable}, but at most {max} are allowed")]
    TooManyTypeVariables {
        signature: String,
        variable: u32,
        max: u32,
    },

    #[error("`{name}` is declared as {declared} but redeclared as {found} at offset {offset}")]
    ConflictingDeclaration {
        name: String,
        declared: Type,
        found: Type,
        offset: usize,
    },
}

impl Error {
    /// Where in the listing the error occurred, if it came from the listing.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::Syntax(error) => Some(error.offset()),
            Error::ConflictingDeclaration { offset, .. } => Some(*offset),
            Error::Io { .. } | Error::Options { .. } | Error::TooManyTypeVariables { .. } => None,
        }
    }
}

/// A catalog together with the options used to resolve against it. Several
/// sessions may share one catalog.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    options: Options,
}

/// The outcome of [`Session::check`].
#[non_exhaustive]
#[derive(Debug)]
pub struct Checked {
    /// The symbols defined by the listing, in source order, followed by
    /// `user.main`.
    pub symbols: Vec<Arc<Symbol>>,

    /// The span of the statement each instruction came from, by block name.
    pub spans: HashMap<String, Vec<Span>>,

    /// The combined result of resolving every block.
    pub report: typecheck::Report,

    /// Whether any block defined by the listing is erroneous.
    pub erroneous: bool,
}

impl Checked {
    /// The block formed by the listing's top-level statements.
    pub fn main(&self) -> Option<&Arc<Symbol>> {
        self.symbols.last()
    }

    /// Where the instruction a diagnostic refers to came from.
    pub fn span(&self, info: &typecheck::Info) -> Option<Span> {
        self.spans.get(&info.function)?.get(info.pc).cloned()
    }
}

impl Session {
    /// A session with its own, empty catalog.
    pub fn new(options: Options) -> Self {
        Session::with_catalog(Arc::new(Catalog::new()), options)
    }

    /// A session resolving against `catalog`.
    pub fn with_catalog(catalog: Arc<Catalog>, options: Options) -> Self {
        Session { catalog, options }
    }

    /// The catalog symbols are defined in.
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The options in effect.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Parse `source`, define its symbols and resolve every function body and
    /// the top-level statements.
    pub fn check(&self, source: &str) -> Result<Checked, Error> {
        let listing = syntax::parse(source)?;

        let mut symbols = Vec::with_capacity(listing.definitions.len() + 1);
        let mut spans = HashMap::new();

        // Define everything before resolving, so bodies may refer to
        // functions defined after them
        for definition in &listing.definitions {
            let definition = &definition.item;
            let signature = lower::signature(definition);
            self.validate(&signature)?;

            let symbol = match &definition.body {
                Some(statements) => {
                    let lowered = lower::function(&signature, definition, statements)?;
                    spans.insert(lowered.block.name.clone(), lowered.spans);
                    Symbol::function(signature, lowered.block)
                }
                None => Symbol::native(signature),
            };

            symbols.push(self.catalog.define(symbol));
        }

        let main = lower::main(&listing.statements)?;
        spans.insert(main.block.name.clone(), main.spans);
        symbols.push(
            self.catalog
                .define(Symbol::function(lower::main_signature(), main.block)),
        );

        let mut report = typecheck::Report::default();
        let mut erroneous = false;

        for symbol in &symbols {
            let Some(body) = &symbol.body else {
                continue;
            };

            let mut body = body.lock();
            typecheck::prepare_signature(&mut body);

            let block_report = typecheck::resolve_block(self, &mut body, self.options.silent);
            symbol.set_errors(body.is_erroneous());
            erroneous |= body.is_erroneous();

            tracing::debug!(
                "resolved {}: {} resolved, {} deferred, {} unresolved, {} errors",
                body.name,
                block_report.resolved,
                block_report.deferred,
                block_report.unresolved,
                block_report.errors
            );

            report.resolved += block_report.resolved;
            report.deferred += block_report.deferred;
            report.unresolved += block_report.unresolved;
            report.errors += block_report.errors;
            report.diagnostics.extend(block_report.diagnostics);
        }

        Ok(Checked {
            symbols,
            spans,
            report,
            erroneous,
        })
    }

    /// Define a native command or pattern directly, without a listing.
    pub fn define_native(&self, signature: ir::Signature) -> Result<Arc<Symbol>, Error> {
        self.validate(&signature)?;
        Ok(self.catalog.define(Symbol::native(signature)))
    }

    fn validate(&self, signature: &ir::Signature) -> Result<(), Error> {
        use typecheck::Driver as _;

        let max = self.max_type_variables();

        signature
            .validate(max)
            .map_err(|variable| Error::TooManyTypeVariables {
                signature: signature.to_string(),
                variable: variable.0,
                max,
            })
    }
}

impl typecheck::Driver for Session {
    type Module = ModuleScope;

    fn find_module(&self, name: &str) -> Option<Self::Module> {
        self.catalog.find_module(name)
    }

    fn max_type_variables(&self) -> u32 {
        self.options.max_type_variables
    }

    fn recursion_limit(&self) -> u32 {
        self.options.recursion_limit
    }
}
