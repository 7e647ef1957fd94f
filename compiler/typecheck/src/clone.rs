use crate::{
    resolve::{recursive_specialization, ResolveContext},
    Binder, Diagnostic, Driver, Module,
};
use std::sync::Arc;
use strata_ir::{Signature, Symbol, Type};

/// Specialize the polymorphic function `generic` for the types in `binder`,
/// insert the specialization ahead of it in its chain and resolve its body.
pub(crate) fn specialize<D: Driver>(
    context: &mut ResolveContext<'_, D>,
    scope: &D::Module,
    generic: &Arc<Symbol>,
    binder: &Binder,
) -> Result<Arc<Symbol>, Diagnostic> {
    let signature = Signature {
        formals: generic
            .signature
            .formals
            .iter()
            .map(|formal| binder.substitute(formal))
            .collect(),
        ..generic.signature.clone()
    };

    let key = (generic.id, signature.formals.clone());

    if context.specializing.contains(&key)
        || context.specializing.len() as u32 >= context.driver.recursion_limit()
    {
        return Err(recursive_specialization(&generic.signature));
    }

    let Some(body) = &generic.body else {
        return Err(Diagnostic::ErroneousFunction {
            module: generic.signature.module.to_string(),
            function: generic.signature.name.to_string(),
        });
    };

    let mut block = body.lock().clone();

    for (index, variable) in block.variables.iter_mut().enumerate() {
        variable.r#type = binder.substitute(&variable.r#type);

        // Let inference run again where the generic body couldn't decide
        let parameter = block
            .parameters
            .iter()
            .any(|parameter| parameter.index() == index);

        if variable.r#type == Type::Any && !parameter && !variable.constant {
            variable.fixed = false;
        }
    }

    for instruction in &mut block.instructions {
        if instruction.barrier.is_none() {
            instruction.invalidate();
        }

        instruction.gc = false;
    }

    block.polymorphic = 0;
    block.errors = 0;
    block.gc = false;

    let candidate = Symbol::specialization(generic, signature, block);
    let id = candidate.id;

    // Held until the body is resolved, so other threads that find the clone
    // wait for its error state
    let body = candidate.body.clone();
    let mut guard = body.as_ref().map(|body| body.lock());

    let specialization = scope.insert_specialization(generic, candidate);

    // An identical specialization already exists
    if specialization.id != id {
        drop(guard);
        tracing::debug!("reusing specialization {}", specialization.signature);
        return Ok(specialization);
    }

    context.specializing.push(key);

    let mut errors = false;
    if let Some(body) = guard.as_deref_mut() {
        crate::prepare_signature(body);

        let report = context.resolve_block(body);
        errors = body.is_erroneous();

        tracing::debug!(
            "specialized {} ({} errors)",
            specialization.signature,
            report.errors
        );
    }

    specialization.finish_resolving(errors);
    drop(guard);

    context.specializing.pop();

    Ok(specialization)
}
