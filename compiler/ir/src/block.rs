use crate::{Instruction, Type, Value, Variable, VariableId};

/// An instruction sequence with its variable table: the body of a
/// user-defined function or factory, or a top-level program.
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// The name of the function this block implements.
    pub name: String,

    /// The formal-parameter variables, returns first.
    pub parameters: Vec<VariableId>,

    /// How many of the leading [`parameters`](Block::parameters) are returns.
    pub retc: usize,

    /// Copied from the signature; 0 once the block has been specialized.
    pub polymorphic: u32,

    pub variables: Vec<Variable>,
    pub instructions: Vec<Instruction>,

    /// The number of errors raised while resolving the block.
    pub errors: u32,

    /// Whether any variable needs to be released by the garbage collector.
    pub gc: bool,
}

impl Block {
    /// An empty block.
    pub fn new(name: impl Into<String>) -> Self {
        Block {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a variable and return its slot.
    pub fn add_variable(&mut self, variable: Variable) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(variable);
        id
    }

    /// Add a constant holding `value`, typed by the literal.
    pub fn add_constant(&mut self, value: Value) -> VariableId {
        let r#type = value.natural_type();
        self.add_typed_constant(value, r#type)
    }

    /// Add a constant holding `value` with an explicit type.
    pub fn add_typed_constant(&mut self, value: Value, r#type: Type) -> VariableId {
        let name = format!("C_{}", self.variables.len());
        self.add_variable(Variable::constant(name, r#type, value))
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn variable_mut(&mut self, id: VariableId) -> &mut Variable {
        &mut self.variables[id.index()]
    }

    /// The current type of a variable.
    pub fn type_of(&self, id: VariableId) -> &Type {
        &self.variable(id).r#type
    }

    /// Look up a variable by name.
    pub fn find_variable(&self, name: &str) -> Option<VariableId> {
        self.variables
            .iter()
            .position(|variable| variable.name == name)
            .map(|index| VariableId(index as u32))
    }

    /// Append an instruction, marking its variables as used.
    pub fn push(&mut self, instruction: Instruction) {
        for &argument in &instruction.arguments {
            self.variable_mut(argument).used = true;
        }

        self.instructions.push(instruction);
    }

    /// The return parameters.
    pub fn returns(&self) -> &[VariableId] {
        &self.parameters[..self.retc]
    }

    /// The argument parameters.
    pub fn arguments(&self) -> &[VariableId] {
        &self.parameters[self.retc..]
    }

    /// Whether resolving the block raised any errors.
    pub fn is_erroneous(&self) -> bool {
        self.errors > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scalar;

    #[test]
    fn constants_are_fixed_and_protected() {
        let mut block = Block::new("main");
        let one = block.add_constant(Value::Int(1));
        let nil = block.add_typed_constant(Value::Nil, Type::Scalar(Scalar::Str));

        assert_eq!(block.type_of(one), &Type::Scalar(Scalar::Int));
        assert_eq!(block.type_of(nil), &Type::Scalar(Scalar::Str));
        assert!(block.variable(one).constant && block.variable(one).fixed);
    }

    #[test]
    fn push_marks_arguments_used() {
        let mut block = Block::new("main");
        let x = block.add_variable(Variable::new("x"));
        let y = block.add_variable(Variable::new("y"));
        let z = block.add_variable(Variable::new("z"));

        block.push(Instruction::assign([x], [y]));

        assert!(block.variable(x).used);
        assert!(block.variable(y).used);
        assert!(!block.variable(z).used);
        assert_eq!(block.find_variable("y"), Some(y));
    }
}
