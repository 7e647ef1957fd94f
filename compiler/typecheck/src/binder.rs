use strata_ir::{Component, Type, TypeVariable};

/// The bindings of type variables made while matching one candidate
/// signature. Every variable starts out as `any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binder {
    bindings: Vec<Type>,
}

impl Binder {
    /// A table with room for variables `1..=max`.
    pub fn new(max: u32) -> Self {
        Binder {
            bindings: vec![Type::Any; max as usize + 1],
        }
    }

    /// The current binding of `variable`.
    pub fn get(&self, variable: TypeVariable) -> &Type {
        static ANY: Type = Type::Any;
        self.bindings.get(variable.index()).unwrap_or(&ANY)
    }

    fn set(&mut self, variable: TypeVariable, r#type: Type) {
        if variable.index() >= self.bindings.len() {
            self.bindings.resize(variable.index() + 1, Type::Any);
        }

        tracing::trace!("bind any_{} to {}", variable.0, r#type);
        self.bindings[variable.index()] = r#type;
    }

    /// Bind the variables in `formal` against `actual`. Returns `false` if
    /// `actual` conflicts with an existing binding or cannot fill `formal`.
    #[must_use]
    pub fn bind(&mut self, formal: &Type, actual: &Type) -> bool {
        // A bare container formal accepts any container without binding
        if *formal == Type::Bat && actual.is_container() {
            return true;
        }

        // A container formal requires a container actual
        if formal.is_container() && !actual.is_container_like() {
            return false;
        }

        if let Some(variable) = formal.tail_variable() {
            let current = self.get(variable);

            // A variable in scalar position binds to a whole container
            if actual.is_container()
                && !formal.is_container()
                && (*current == Type::Any || current == actual)
            {
                self.set(variable, actual.clone());
                return true;
            }

            let tail = tail_constraint(formal, actual);

            if tail != *current {
                if *current == Type::Bat && actual.is_container_like() {
                    // Bare-container leniency: a variable bound to `bat`
                    // accepts any container, whatever its components
                } else if *current == Type::Any {
                    self.set(variable, tail);
                } else {
                    return false;
                }
            }
        }

        if let Some(variable) = formal.head_variable() {
            let head = actual.key().map_or(Type::Any, Component::to_type);
            let current = self.get(variable);

            if head != *current {
                if *current == Type::Any {
                    self.set(variable, head);
                } else {
                    return false;
                }
            }
        }

        true
    }

    /// Replace the variables in `formal` with their bindings. A container
    /// bound to a variable in component position becomes `any`.
    pub fn substitute(&self, formal: &Type) -> Type {
        let component = |component: &Component| match component {
            Component::Variable(variable) => Component::from_type(self.get(*variable)),
            other => other.clone(),
        };

        match formal {
            Type::Variable(variable) => self.get(*variable).clone(),
            Type::Container { key, value } => Type::container(component(key), component(value)),
            other => other.clone(),
        }
    }
}

/// The type a formal's tail variable must take on for `actual`. `any` means
/// the actual says nothing about the variable.
fn tail_constraint(formal: &Type, actual: &Type) -> Type {
    match actual {
        Type::Bat if formal.is_container() => Type::Any,
        Type::Container { value, .. } => value.to_type(),
        other => other.clone(),
    }
}
