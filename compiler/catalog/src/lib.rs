//! The registry of symbols available to the resolver. Symbols are grouped by
//! module, then by function name into overload chains.

use derivative::Derivative;
use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc};
use strata_ir::{Symbol, SymbolId};

/// All modules known to the resolver. Lookups take a read lock; definitions
/// and specializations lock only the module they change.
#[derive(Debug, Default)]
pub struct Catalog {
    modules: RwLock<HashMap<Arc<str>, ModuleScope>>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Catalog::default()
    }

    /// The module called `name`, created if it doesn't exist yet.
    pub fn module(&self, name: &str) -> ModuleScope {
        if let Some(module) = self.modules.read().get(name) {
            return module.clone();
        }

        self.modules
            .write()
            .entry(Arc::from(name))
            .or_insert_with(|| ModuleScope::new(name))
            .clone()
    }

    /// The module called `name`, if any symbol was defined in it.
    pub fn find_module(&self, name: &str) -> Option<ModuleScope> {
        self.modules.read().get(name).cloned()
    }

    /// The names of all modules, sorted.
    pub fn module_names(&self) -> Vec<Arc<str>> {
        let mut names = self.modules.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Register `symbol` in its module. New definitions are looked up before
    /// older ones with the same name.
    pub fn define(&self, symbol: Symbol) -> Arc<Symbol> {
        self.module(&symbol.signature.module).define(symbol)
    }

    /// Find a symbol by its identifier.
    pub fn symbol(&self, id: SymbolId) -> Option<Arc<Symbol>> {
        self.modules
            .read()
            .values()
            .find_map(|module| module.symbol(id))
    }
}

impl strata_typecheck::Driver for Catalog {
    type Module = ModuleScope;

    fn find_module(&self, name: &str) -> Option<Self::Module> {
        Catalog::find_module(self, name)
    }
}

/// A handle to one module's overload chains. Cloning the handle shares the
/// module.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ModuleScope {
    name: Arc<str>,

    #[derivative(Debug = "ignore")]
    chains: Arc<RwLock<HashMap<String, Vec<Arc<Symbol>>>>>,
}

impl ModuleScope {
    fn new(name: &str) -> Self {
        ModuleScope {
            name: Arc::from(name),
            chains: Default::default(),
        }
    }

    /// Prepend `symbol` to the chain for its name.
    pub fn define(&self, symbol: Symbol) -> Arc<Symbol> {
        let symbol = Arc::new(symbol);

        self.chains
            .write()
            .entry(symbol.signature.name.to_string())
            .or_default()
            .insert(0, symbol.clone());

        tracing::trace!("defined {}", symbol.signature);

        symbol
    }

    /// The names of all functions in the module, sorted.
    pub fn function_names(&self) -> Vec<String> {
        let mut names = self.chains.read().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    /// Find a symbol in this module by its identifier.
    pub fn symbol(&self, id: SymbolId) -> Option<Arc<Symbol>> {
        self.chains
            .read()
            .values()
            .flatten()
            .find(|symbol| symbol.id == id)
            .cloned()
    }
}

impl strata_typecheck::Module for ModuleScope {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidates(&self, function: &str) -> Vec<Arc<Symbol>> {
        self.chains
            .read()
            .get(function)
            .cloned()
            .unwrap_or_default()
    }

    fn insert_specialization(&self, generic: &Symbol, specialization: Symbol) -> Arc<Symbol> {
        let mut chains = self.chains.write();
        let chain = chains
            .entry(generic.signature.name.to_string())
            .or_default();

        if let Some(existing) = chain.iter().find(|symbol| {
            symbol.specialization_of == Some(generic.id)
                && symbol.signature.formals == specialization.signature.formals
                && symbol.signature.retc == specialization.signature.retc
        }) {
            return existing.clone();
        }

        let position = chain
            .iter()
            .position(|symbol| symbol.id == generic.id)
            .unwrap_or(0);

        let specialization = Arc::new(specialization);
        chain.insert(position, specialization.clone());

        tracing::debug!(
            "inserted {} in {} ahead of its generic",
            specialization.signature,
            self.name
        );

        specialization
    }
}
