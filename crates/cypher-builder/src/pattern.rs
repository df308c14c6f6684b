use crate::{Expr, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `(a)-[]->(b)`
    Outgoing,
    /// `(a)<-[]-(b)`
    Incoming,
    /// `(a)-[]-(b)`
    Undirected,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    pub variable: Option<Variable>,
    pub labels: Vec<String>,
    pub properties: Vec<(String, Expr)>,
}

impl NodePattern {
    pub fn new(variable: Variable) -> Self {
        Self {
            variable: Some(variable),
            ..Default::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.labels.extend(labels.into_iter().map(Into::into));
        self
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<Expr>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub variable: Option<Variable>,
    pub types: Vec<String>,
    pub direction: Direction,
}

impl RelationshipPattern {
    pub fn new(variable: Option<Variable>, ty: impl Into<String>, direction: Direction) -> Self {
        Self {
            variable,
            types: vec![ty.into()],
            direction,
        }
    }
}

/// A path pattern, `(this)<-[this0:ACTED_IN]-(this1:Actor)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub start: NodePattern,
    pub chain: Vec<(RelationshipPattern, NodePattern)>,
}

impl Pattern {
    pub fn node(start: NodePattern) -> Self {
        Self {
            start,
            chain: Vec::new(),
        }
    }

    pub fn related(mut self, relationship: RelationshipPattern, node: NodePattern) -> Self {
        self.chain.push((relationship, node));
        self
    }
}

impl From<NodePattern> for Pattern {
    fn from(node: NodePattern) -> Self {
        Pattern::node(node)
    }
}
