use crate::{
    assign, clone,
    matcher::{self, Candidate},
    Diagnostic, Driver, Info, Module, Report,
};
use derivative::Derivative;
use std::sync::Arc;
use strata_ir::{Binding, Block, CallKind, Identifier, Signature, Status, Symbol, SymbolId, Type};
use strata_util::WithInfo;

/// Resolve every instruction in `block` that isn't resolved yet. In silent
/// mode no diagnostics are emitted, and failing to find a match is not
/// counted as an error.
pub fn resolve_block<D: Driver>(driver: &D, block: &mut Block, silent: bool) -> Report {
    let mut diagnostics = Vec::new();
    let mut specializing = Vec::new();

    let mut report = ResolveContext {
        driver,
        silent,
        diagnostics: &mut diagnostics,
        specializing: &mut specializing,
    }
    .resolve_block(block);

    report.diagnostics = diagnostics;
    report
}

/// Resolve the instruction at `pc` again, even if it is already resolved.
pub fn resolve_instruction<D: Driver>(
    driver: &D,
    block: &mut Block,
    pc: usize,
    silent: bool,
) -> Report {
    let mut diagnostics = Vec::new();
    let mut specializing = Vec::new();
    let errors = block.errors;

    ResolveContext {
        driver,
        silent,
        diagnostics: &mut diagnostics,
        specializing: &mut specializing,
    }
    .check_instruction(block, pc);

    let mut report = Report::default();
    report.record(block.instructions[pc].status);
    report.errors = block.errors.saturating_sub(errors);
    report.diagnostics = diagnostics;
    report
}

/// Fix the types of a function's formal parameters before its body is
/// resolved, and mark the arguments the garbage collector must release.
pub fn prepare_signature(block: &mut Block) {
    for parameter in block.parameters.clone() {
        block.variable_mut(parameter).fixed = true;
    }

    for argument in block.arguments().to_vec() {
        if block.type_of(argument).needs_cleanup() {
            block.variable_mut(argument).cleanup = true;
            block.gc = true;
        }
    }
}

impl Report {
    pub(crate) fn record(&mut self, status: Status) {
        match status {
            Status::Resolved => self.resolved += 1,
            Status::Dynamic => self.deferred += 1,
            Status::Unresolved => self.unresolved += 1,
        }
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct ResolveContext<'a, D: Driver> {
    #[derivative(Debug = "ignore")]
    pub driver: &'a D,
    pub silent: bool,
    pub diagnostics: &'a mut Vec<WithInfo<Info, Diagnostic>>,

    /// The specializations in progress, innermost last.
    pub specializing: &'a mut Vec<(SymbolId, Vec<Type>)>,
}

impl<D: Driver> ResolveContext<'_, D> {
    pub fn resolve_block(&mut self, block: &mut Block) -> Report {
        let errors = block.errors;
        let mut report = Report::default();

        for pc in 0..block.instructions.len() {
            let instruction = &block.instructions[pc];

            // Control flow is checked separately
            if instruction.barrier.is_some() {
                continue;
            }

            if !instruction.is_resolved() {
                self.check_instruction(block, pc);
            }

            report.record(block.instructions[pc].status);
        }

        report.errors = block.errors.saturating_sub(errors);

        tracing::debug!(
            "resolved {}: {} resolved, {} deferred, {} unresolved, {} errors",
            block.name,
            report.resolved,
            report.deferred,
            report.unresolved,
            report.errors,
        );

        report
    }

    pub fn check_instruction(&mut self, block: &mut Block, pc: usize) {
        block.instructions[pc].invalidate();

        if block.instructions[pc].is_call() {
            self.resolve_call(block, pc);
        } else {
            assign::propagate(self, block, pc);
        }
    }

    pub fn error(&mut self, block: &mut Block, pc: usize, diagnostic: Diagnostic) {
        block.errors += 1;
        block.instructions[pc].status = Status::Unresolved;

        if !self.silent {
            self.diagnostics.push(WithInfo::new(
                Info {
                    function: block.name.clone(),
                    pc,
                },
                diagnostic,
            ));
        }
    }

    fn resolve_call(&mut self, block: &mut Block, pc: usize) {
        let instruction = &block.instructions[pc];

        // Names held in variables are only known at run time
        let dynamic = [&instruction.module, &instruction.function]
            .into_iter()
            .any(|identifier| matches!(identifier, Some(Identifier::Variable(_))));

        if dynamic {
            block.instructions[pc].status = Status::Dynamic;
            return;
        }

        let Some((module, function)) = instruction
            .static_target()
            .map(|(module, function)| (module.to_string(), function.to_string()))
        else {
            return;
        };

        let Some(scope) = self.driver.find_module(&module) else {
            self.undefined(block, pc, module, function);
            return;
        };

        for symbol in scope.candidates(&function) {
            let (returns, binder) =
                match matcher::match_candidate(&symbol.signature, block, &block.instructions[pc]) {
                    Candidate::Mismatch => continue,
                    Candidate::ConstantAssignment(variable) => {
                        let name = block.variable(variable).name.clone();
                        self.error(block, pc, Diagnostic::ConstantAssignment(name));
                        return;
                    }
                    Candidate::Match { returns, binder } => (returns, binder),
                };

            tracing::trace!("{}.{} matched {}", module, function, symbol.signature);

            self.commit(block, pc, &returns);

            let specialize = symbol.signature.polymorphic() > 0
                && symbol.signature.kind == CallKind::Function
                && !block.instructions[pc]
                    .sources()
                    .iter()
                    .any(|&source| block.type_of(source).is_any_expression());

            let target = if specialize {
                // Calls in a generic body are checked again in each
                // specialization
                if block.polymorphic > 0 {
                    block.instructions[pc].status = Status::Dynamic;
                    return;
                }

                match clone::specialize(self, &scope, &symbol, &binder) {
                    Ok(specialization) => specialization,
                    Err(diagnostic) => {
                        self.error(block, pc, diagnostic);
                        return;
                    }
                }
            } else {
                symbol
            };

            self.bind_symbol(block, pc, &target);
            return;
        }

        self.undefined(block, pc, module, function);
    }

    fn undefined(&mut self, block: &mut Block, pc: usize, module: String, function: String) {
        // Failures in a generic body are reported by its specializations
        if block.polymorphic > 0 {
            block.instructions[pc].status = Status::Dynamic;
            return;
        }

        // A silent probe leaves the error count as it found it
        if self.silent {
            block.instructions[pc].status = Status::Unresolved;
            return;
        }

        let arguments = block.instructions[pc]
            .sources()
            .iter()
            .map(|&source| block.type_of(source).clone())
            .collect();

        self.error(
            block,
            pc,
            Diagnostic::UndefinedFunction {
                module,
                function,
                arguments,
            },
        );
    }

    /// Give the destinations their resolved types and record which variables
    /// the garbage collector must release.
    fn commit(&mut self, block: &mut Block, pc: usize, returns: &[Type]) {
        let arguments = block.instructions[pc].arguments.clone();
        let retc = block.instructions[pc].retc;
        let mut gc = false;

        for (&destination, r#type) in arguments[..retc].iter().zip(returns) {
            let variable = block.variable_mut(destination);
            variable.fix(r#type.clone());

            if r#type.needs_cleanup() {
                variable.cleanup = true;
                gc = true;
            }
        }

        gc |= arguments[retc..]
            .iter()
            .any(|&source| block.type_of(source).needs_cleanup());

        if gc {
            block.instructions[pc].gc = true;
            block.gc = true;
        }
    }

    /// Whether `symbol` is a specialization this context is resolving.
    fn is_specializing(&self, symbol: &Symbol) -> bool {
        symbol.specialization_of.is_some_and(|generic| {
            self.specializing
                .iter()
                .any(|(id, formals)| *id == generic && *formals == symbol.signature.formals)
        })
    }

    /// Bind the instruction at `pc` to `symbol`, without checking types.
    pub fn bind_symbol(&mut self, block: &mut Block, pc: usize, symbol: &Arc<Symbol>) {
        let signature = &symbol.signature;

        // A specialization another thread is still resolving has no final
        // error state yet; its body stays locked until it does
        if symbol.is_resolving() && !self.is_specializing(symbol) {
            if let Some(body) = &symbol.body {
                drop(body.lock());
            }
        }

        if symbol.has_errors() {
            let diagnostic = Diagnostic::ErroneousFunction {
                module: signature.module.to_string(),
                function: signature.name.to_string(),
            };

            self.error(block, pc, diagnostic);
            return;
        }

        let binding = match signature.kind {
            CallKind::Command => match &signature.entry {
                Some(entry) => Binding::NativeCommand {
                    symbol: symbol.id,
                    entry: entry.clone(),
                },
                None => {
                    let diagnostic = Diagnostic::MissingImplementation {
                        module: signature.module.to_string(),
                        function: signature.name.to_string(),
                    };

                    self.error(block, pc, diagnostic);
                    return;
                }
            },
            CallKind::Pattern => Binding::NativePattern {
                symbol: symbol.id,
                entry: signature.entry.clone(),
            },
            CallKind::Factory => Binding::Factory(symbol.clone()),
            CallKind::Function => Binding::UserFunction(symbol.clone()),
        };

        let instruction = &mut block.instructions[pc];
        instruction.binding = Some(binding);
        instruction.status = Status::Resolved;
        instruction.polymorphic = signature.polymorphic();
        instruction.varargs = signature.varargs;
    }
}

/// The diagnostic for a specialization of `signature` that cannot proceed.
pub(crate) fn recursive_specialization(signature: &Signature) -> Diagnostic {
    Diagnostic::RecursiveSpecialization {
        module: signature.module.to_string(),
        function: signature.name.to_string(),
    }
}
