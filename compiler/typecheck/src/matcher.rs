use crate::{unify, Binder};
use strata_ir::{Block, CallKind, Instruction, Signature, Type, VariableId};

/// The result of testing one candidate signature against a call.
#[derive(Debug)]
pub enum Candidate {
    /// The candidate doesn't apply; try the next peer.
    Mismatch,

    /// The arguments match, but a destination is a constant.
    ConstantAssignment(VariableId),

    /// The candidate applies.
    Match {
        /// The resolved type of each destination.
        returns: Vec<Type>,

        /// The variable bindings that made the candidate apply.
        binder: Binder,
    },
}

/// Test `signature` against the call at `instruction`.
pub fn match_candidate(signature: &Signature, block: &Block, instruction: &Instruction) -> Candidate {
    if !arity_matches(signature, instruction) {
        tracing::trace!("{signature}: arity mismatch");
        return Candidate::Mismatch;
    }

    let binder = if signature.polymorphic() > 0 {
        match match_polymorphic_arguments(signature, block, instruction) {
            Some(binder) => binder,
            None => return Candidate::Mismatch,
        }
    } else {
        if !match_arguments(signature, block, instruction) {
            return Candidate::Mismatch;
        }

        Binder::new(0)
    };

    if let Some(&constant) = instruction
        .returns()
        .iter()
        .find(|&&destination| block.variable(destination).constant)
    {
        return Candidate::ConstantAssignment(constant);
    }

    let mut returns = Vec::with_capacity(instruction.retc);
    for (index, &destination) in instruction.returns().iter().enumerate() {
        let Some(formal) = signature.formal_return(index) else {
            return Candidate::Mismatch;
        };

        let formal = binder.substitute(formal);
        let actual = block.type_of(destination);

        match unify(&formal, actual) {
            Some(r#type) => returns.push(r#type),
            None => {
                tracing::trace!("{signature}: return {index} ({formal}) does not accept {actual}");
                return Candidate::Mismatch;
            }
        }
    }

    Candidate::Match { returns, binder }
}

fn arity_matches(signature: &Signature, instruction: &Instruction) -> bool {
    let count_matches = |actual: usize, formal: usize, variadic: bool| {
        if variadic {
            actual >= formal
        } else {
            actual == formal
        }
    };

    count_matches(
        instruction.sources().len(),
        signature.arguments().len(),
        signature.varargs.arguments,
    ) && count_matches(
        instruction.retc,
        signature.returns().len(),
        signature.varargs.returns,
    )
}

fn match_arguments(signature: &Signature, block: &Block, instruction: &Instruction) -> bool {
    instruction
        .sources()
        .iter()
        .enumerate()
        .all(|(index, &source)| {
            let actual = block.type_of(source);

            let matched = signature
                .formal_argument(index)
                .is_some_and(|formal| unify(formal, actual).is_some());

            if !matched {
                tracing::trace!("{signature}: argument {index} does not accept {actual}");
            }

            matched
        })
}

fn match_polymorphic_arguments(
    signature: &Signature,
    block: &Block,
    instruction: &Instruction,
) -> Option<Binder> {
    let mut binder = Binder::new(signature.max_variable());

    for (index, &source) in instruction.sources().iter().enumerate() {
        let formal = signature.formal_argument(index)?;
        let actual = block.type_of(source);

        if formal == actual {
            continue;
        }

        // A pattern taking `any...` checks the remaining arguments itself
        if signature.kind == CallKind::Pattern
            && signature.is_variadic_argument(index)
            && *formal == Type::Any
        {
            continue;
        }

        if !binder.bind(formal, actual) {
            tracing::trace!("{signature}: argument {index} ({actual}) conflicts with bindings");
            return None;
        }

        if unify(&binder.substitute(formal), actual).is_none() {
            tracing::trace!("{signature}: argument {index} does not accept {actual}");
            return None;
        }
    }

    Some(binder)
}
