use crate::Error;
use std::sync::Arc;
use strata_ir::{
    Block, EntryPoint, Identifier, Instruction, Signature, Type, Variable, VariableId,
};
use strata_syntax::{
    ast::{Callee, Definition, Operand, Source, Statement, Target},
    Span,
};
use strata_util::WithInfo;

/// The module and name of the block formed by top-level statements.
pub const MAIN: (&str, &str) = ("user", "main");

pub(crate) fn signature(definition: &Definition) -> Signature {
    Signature {
        module: Arc::from(definition.module.as_str()),
        name: Arc::from(definition.name.as_str()),
        kind: definition.kind,
        formals: definition
            .returns
            .iter()
            .chain(&definition.parameters)
            .map(|parameter| parameter.r#type.clone())
            .collect(),
        retc: definition.returns.len(),
        varargs: definition.varargs,
        entry: definition
            .address
            .as_deref()
            .map(|address| EntryPoint(Arc::from(address))),
    }
}

pub(crate) fn main_signature() -> Signature {
    let (module, name) = MAIN;

    Signature {
        module: Arc::from(module),
        name: Arc::from(name),
        kind: strata_ir::CallKind::Function,
        formals: vec![Type::void()],
        retc: 1,
        varargs: Default::default(),
        entry: None,
    }
}

/// A lowered block, with the span of the statement each instruction came
/// from.
#[derive(Debug)]
pub(crate) struct Lowered {
    pub block: Block,
    pub spans: Vec<Span>,
}

pub(crate) fn function(
    signature: &Signature,
    definition: &Definition,
    statements: &[WithInfo<Span, Statement>],
) -> Result<Lowered, Error> {
    let mut lowerer = Lowerer::new(qualified_name(signature));

    for parameter in definition.returns.iter().chain(&definition.parameters) {
        let id = lowerer
            .block
            .add_variable(Variable::typed(&parameter.name, parameter.r#type.clone()));

        lowerer.block.parameters.push(id);
    }

    lowerer.block.retc = signature.retc;
    lowerer.block.polymorphic = signature.polymorphic();

    for statement in statements {
        lowerer.statement(statement)?;
    }

    Ok(lowerer.finish())
}

pub(crate) fn main(statements: &[WithInfo<Span, Statement>]) -> Result<Lowered, Error> {
    let mut lowerer = Lowerer::new(qualified_name(&main_signature()));

    for statement in statements {
        lowerer.statement(statement)?;
    }

    Ok(lowerer.finish())
}

/// Blocks are named `module.function` so diagnostics are unambiguous.
pub fn qualified_name(signature: &Signature) -> String {
    format!("{}.{}", signature.module, signature.name)
}

struct Lowerer {
    block: Block,
    spans: Vec<Span>,
}

impl Lowerer {
    fn new(name: String) -> Self {
        Lowerer {
            block: Block::new(name),
            spans: Vec::new(),
        }
    }

    fn finish(self) -> Lowered {
        Lowered {
            block: self.block,
            spans: self.spans,
        }
    }

    fn statement(&mut self, statement: &WithInfo<Span, Statement>) -> Result<(), Error> {
        let offset = statement.info.start;

        let mut returns = statement
            .item
            .targets
            .iter()
            .map(|target| self.target(target, offset))
            .collect::<Result<Vec<_>, _>>()?;

        let mut instruction = match &statement.item.source {
            Source::None => Instruction::assign(returns, []),
            Source::Operands(operands) => {
                let sources = self.operands(operands, offset)?;
                Instruction::assign(returns, sources)
            }
            Source::Call {
                module,
                function,
                arguments,
            } => {
                // Calls always return something, even when it's discarded
                if returns.is_empty() {
                    let name = format!("X_{}", self.block.variables.len());
                    returns.push(self.block.add_variable(Variable::new(name)));
                }

                let module = self.callee(module);
                let function = self.callee(function);
                let arguments = self.operands(arguments, offset)?;

                Instruction::call(module, function, returns, arguments)
            }
        };

        instruction.barrier = statement.item.barrier;

        self.block.push(instruction);
        self.spans.push(statement.info.clone());

        Ok(())
    }

    fn target(&mut self, target: &Target, offset: usize) -> Result<VariableId, Error> {
        let Some(id) = self.block.find_variable(&target.name) else {
            let variable = match &target.r#type {
                Some(r#type) => Variable::typed(&target.name, r#type.clone()),
                None => Variable::new(&target.name),
            };

            return Ok(self.block.add_variable(variable));
        };

        if let Some(r#type) = &target.r#type {
            let variable = self.block.variable_mut(id);

            if !variable.fixed {
                variable.r#type = r#type.clone();
                variable.fixed = true;
            } else if variable.r#type != *r#type {
                return Err(Error::ConflictingDeclaration {
                    name: target.name.clone(),
                    declared: variable.r#type.clone(),
                    found: r#type.clone(),
                    offset,
                });
            }
        }

        Ok(id)
    }

    fn operands(&mut self, operands: &[Operand], offset: usize) -> Result<Vec<VariableId>, Error> {
        operands
            .iter()
            .map(|operand| match operand {
                Operand::Variable(target) => self.target(target, offset),
                Operand::Literal(value) => Ok(self.block.add_constant(value.clone())),
            })
            .collect()
    }

    fn callee(&mut self, callee: &Callee) -> Identifier {
        match callee {
            Callee::Name(name) => Identifier::Name(Arc::from(name.as_str())),
            Callee::Variable(name) => {
                let id = match self.block.find_variable(name) {
                    Some(id) => id,
                    None => self.block.add_variable(Variable::new(name)),
                };

                self.block.variable_mut(id).used = true;
                Identifier::Variable(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ir::{Barrier, Scalar, Value};

    fn lower_main(source: &str) -> Result<Lowered, Error> {
        let listing = strata_syntax::parse(source)?;
        main(&listing.statements)
    }

    #[test]
    fn declared_types_are_fixed() {
        let lowered = lower_main("x:int := 1;\nz := calc.plus(x, 2);").unwrap();
        let block = &lowered.block;

        assert_eq!(block.name, "user.main");

        let x = block.find_variable("x").unwrap();
        assert!(block.variable(x).fixed);
        assert_eq!(*block.type_of(x), Type::Scalar(Scalar::Int));

        let z = block.find_variable("z").unwrap();
        assert!(!block.variable(z).fixed);

        let call = &block.instructions[1];
        assert_eq!(call.static_target(), Some(("calc", "plus")));
        assert_eq!(call.returns(), [z]);
        assert_eq!(call.sources()[0], x);
        assert_eq!(
            block.variable(call.sources()[1]).value,
            Some(Value::Int(2))
        );

        assert_eq!(lowered.spans, [0..11, 12..33]);
    }

    #[test]
    fn discarded_results_get_a_temporary() {
        let lowered = lower_main("io.print(1);").unwrap();
        let call = &lowered.block.instructions[0];

        assert_eq!(call.retc, 1);
        assert_eq!(lowered.block.variable(call.returns()[0]).name, "X_0");
    }

    #[test]
    fn dynamic_callees_and_barriers() {
        let lowered = lower_main("m := \"calc\";\nw := $m.plus(1);\nbarrier go := true;").unwrap();
        let block = &lowered.block;

        let m = block.find_variable("m").unwrap();
        assert_eq!(
            block.instructions[1].module,
            Some(Identifier::Variable(m))
        );
        assert_eq!(block.instructions[2].barrier, Some(Barrier::Barrier));
    }

    #[test]
    fn conflicting_declarations_are_rejected() {
        let error = lower_main("x:int := 1;\nx:str := \"a\";").unwrap_err();

        assert!(matches!(
            error,
            Error::ConflictingDeclaration { ref name, offset: 12, .. } if name == "x"
        ));
    }

    #[test]
    fn function_parameters_come_first() {
        let listing = strata_syntax::parse(
            "function user.identity(v:any_1):any_1;\n    result := v;\nend identity;",
        )
        .unwrap();

        let definition = &listing.definitions[0].item;
        let signature = signature(definition);
        let lowered = function(&signature, definition, definition.body.as_deref().unwrap()).unwrap();

        assert_eq!(signature.to_string(), "function user.identity(any_1):any_1");
        assert_eq!(lowered.block.name, "user.identity");
        assert_eq!(lowered.block.retc, 1);
        assert_eq!(lowered.block.polymorphic, 1);
        assert_eq!(
            lowered
                .block
                .parameters
                .iter()
                .map(|&parameter| lowered.block.variable(parameter).name.as_str())
                .collect::<Vec<_>>(),
            ["result", "v"]
        );
    }
}
