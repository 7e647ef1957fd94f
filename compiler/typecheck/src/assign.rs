use crate::{resolve::ResolveContext, unify, Diagnostic, Driver};
use strata_ir::{Binding, Block, Status, Type, Value, VariableId};

/// Propagate the types of an assignment's sources to its destinations.
/// `nil` takes on the type of its destination.
pub(crate) fn propagate<D: Driver>(context: &mut ResolveContext<'_, D>, block: &mut Block, pc: usize) {
    let instruction = &block.instructions[pc];
    let retc = instruction.retc;
    let argc = instruction.argc();

    // `(a, b) := (c, d)` pairs up; `(a, b) := (c, d, e)` doesn't
    if retc >= 1 && argc > retc && argc != 2 * retc {
        context.error(
            block,
            pc,
            Diagnostic::MultipleAssignmentMismatch {
                returns: retc,
                sources: argc - retc,
            },
        );

        return;
    }

    for (destination_index, source_index) in (0..retc).zip(retc..argc) {
        let destination = block.instructions[pc].arguments[destination_index];
        let source = block.instructions[pc].arguments[source_index];

        let destination_type = block.type_of(destination).clone();
        let source_type = block.type_of(source).clone();

        let resolved = if !source_type.is_void() {
            match unify(&destination_type, &source_type) {
                Some(resolved) => resolved,
                None => {
                    context.error(
                        block,
                        pc,
                        Diagnostic::TypeMismatch {
                            destination: destination_type,
                            source: source_type,
                        },
                    );

                    return;
                }
            }
        } else if coerces_nil(block, destination, &destination_type) {
            let nil_type = if destination_type.is_container_like() {
                Type::Bat
            } else {
                destination_type.clone()
            };

            let nil = block.add_typed_constant(Value::Nil, nil_type);
            block.variable_mut(nil).used = true;
            block.instructions[pc].arguments[source_index] = nil;

            tracing::trace!("coerced nil to {} in {}", destination_type, block.name);

            destination_type
        } else {
            source_type
        };

        block.variable_mut(destination).fix(resolved.clone());

        if resolved.needs_cleanup() {
            block.variable_mut(destination).cleanup = true;
            block.variable_mut(block.instructions[pc].arguments[source_index]).cleanup = true;
            block.instructions[pc].gc = true;
            block.gc = true;
        }
    }

    let instruction = &mut block.instructions[pc];
    instruction.binding = Some(Binding::PlainAssignment);
    instruction.status = Status::Resolved;
}

/// Whether assigning `nil` to `destination` should produce a constant of the
/// destination's type.
fn coerces_nil(block: &Block, destination: VariableId, r#type: &Type) -> bool {
    block.variable(destination).fixed && !r#type.is_void() && !r#type.is_dynamic()
}
