use std::cell::{Cell, RefCell};

use crate::Value;

/// Reserving the upper bit for the root variable. Every other variable is allocated by [`Names`].
const ROOT_ID: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableKind {
    /// Bound to a node in a pattern, rendered as `this<n>`.
    Node,
    /// Bound to a relationship in a pattern, rendered as `this<n>`.
    Relationship,
    /// Any other binding (aggregation results, collected lists...), rendered as `var<n>`.
    Plain,
}

/// A binding in the generated statement. Variables only carry an identity, their textual name is
/// decided by the renderer in order of first appearance, which keeps the output stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable {
    id: u32,
    kind: VariableKind,
}

impl Variable {
    /// The root variable of a statement, always rendered as `this`.
    pub const fn root() -> Self {
        Self {
            id: ROOT_ID,
            kind: VariableKind::Node,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }

    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    pub(crate) fn id(&self) -> u32 {
        self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Param {
    id: u32,
}

impl Param {
    pub(crate) fn index(self) -> usize {
        self.id as usize
    }
}

/// The naming authority of a translation. Every variable and every parameter of a statement is
/// allocated here, so that no two bindings can ever clash, including across `UNION` branches.
#[derive(Debug, Default)]
pub struct Names {
    next_variable: Cell<u32>,
    params: RefCell<Vec<Value>>,
}

impl Names {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self) -> Variable {
        self.variable(VariableKind::Node)
    }

    pub fn relationship(&self) -> Variable {
        self.variable(VariableKind::Relationship)
    }

    pub fn plain(&self) -> Variable {
        self.variable(VariableKind::Plain)
    }

    pub fn variable(&self, kind: VariableKind) -> Variable {
        let id = self.next_variable.get();
        assert!(id < ROOT_ID, "Too many variables");
        self.next_variable.set(id + 1);

        Variable { id, kind }
    }

    /// Registers a literal value. The same `Param` may be rendered several times, it will
    /// always be bound to a single entry of the parameter map.
    pub fn param(&self, value: impl Into<Value>) -> Param {
        let mut params = self.params.borrow_mut();
        let id = params.len() as u32;
        params.push(value.into());

        Param { id }
    }

    pub(crate) fn param_value(&self, param: Param) -> Value {
        self.params.borrow()[param.index()].clone()
    }

    pub fn params_len(&self) -> usize {
        self.params.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_distinct() {
        let names = Names::new();
        let a = names.node();
        let b = names.node();
        let c = names.plain();

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert!(!a.is_root());
        assert!(Variable::root().is_root());
    }

    #[test]
    fn params_keep_their_values() {
        let names = Names::new();
        let p = names.param("X");
        let q = names.param(3);

        assert_eq!(names.param_value(p), Value::from("X"));
        assert_eq!(names.param_value(q), Value::Integer(3));
        assert_eq!(names.params_len(), 2);
    }
}
