use crate::{resolve::ResolveContext, Driver, Module, Report};
use strata_ir::Block;

/// Bind each unbound call in `block` to the first candidate with the same
/// number of slots, without checking types. Only for blocks whose producer
/// already guarantees type correctness.
pub fn bind_function<D: Driver>(driver: &D, block: &mut Block) -> Report {
    let mut diagnostics = Vec::new();
    let mut specializing = Vec::new();
    let mut context = ResolveContext {
        driver,
        silent: false,
        diagnostics: &mut diagnostics,
        specializing: &mut specializing,
    };

    let errors = block.errors;
    let mut report = Report::default();

    for pc in 0..block.instructions.len() {
        let instruction = &block.instructions[pc];

        if instruction.binding.is_none() && instruction.barrier.is_none() {
            let candidate = instruction.static_target().and_then(|(module, function)| {
                driver
                    .find_module(module)?
                    .candidates(function)
                    .into_iter()
                    .find(|symbol| symbol.signature.argc() == instruction.argc())
            });

            if let Some(symbol) = candidate {
                context.bind_symbol(block, pc, &symbol);
            }
        }

        report.record(block.instructions[pc].status);
    }

    report.errors = block.errors.saturating_sub(errors);
    report.diagnostics = diagnostics;
    report
}
