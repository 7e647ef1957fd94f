use strata_ir::{Component, Type};

/// Unify a formal (or destination) type with an actual (or source) type,
/// returning the resolved type, or `None` if the types are incompatible.
#[must_use]
pub fn unify(formal: &Type, actual: &Type) -> Option<Type> {
    if formal == actual {
        return Some(formal.clone());
    }

    match (formal, actual) {
        // `any` resolves to the other side
        (Type::Any, other) | (other, Type::Any) => Some(other.clone()),

        // The bare container wildcard accepts any container
        (Type::Bat, container @ Type::Container { .. })
        | (container @ Type::Container { .. }, Type::Bat) => Some(container.clone()),

        // Containers unify key and value independently
        (
            Type::Container { key, value },
            Type::Container {
                key: actual_key,
                value: actual_value,
            },
        ) => Some(Type::container(
            unify_component(key, actual_key)?,
            unify_component(value, actual_value)?,
        )),

        // Any other combination of types is an error
        _ => None,
    }
}

fn unify_component(formal: &Component, actual: &Component) -> Option<Component> {
    match (formal, actual) {
        _ if formal == actual => Some(formal.clone()),
        (Component::Any, other) | (other, Component::Any) => Some(other.clone()),
        _ => None,
    }
}
