//! The intermediate representation of a root field. Variables and parameters are already
//! allocated, labels resolved and authorization rules spliced in as filters and guards, so code
//! generation only decides the layout of the statement.

use cypher_builder::{Direction, Order, Param, Variable};
use graphql_cypher_schema::{AggregationFunction, ComparisonOperator, Quantifier};

/// `(parent)-[:TYPE]->(node)`, seen from the parent.
#[derive(Debug, Clone)]
pub(crate) struct Traversal {
    pub parent: Variable,
    pub relationship_type: String,
    pub direction: Direction,
}

/// How the nodes of a selection are reached.
#[derive(Debug)]
pub(crate) enum Source {
    /// `MATCH (node:Label)`
    Labels,
    Traversal(Traversal),
    /// `CALL db.index.fulltext.queryNodes(...) YIELD node, score`
    Fulltext {
        index_name: String,
        phrase: Param,
        score: Variable,
    },
    /// `CALL db.index.vector.queryNodes(...) YIELD node, score`
    Vector {
        index_name: String,
        neighbours: Param,
        vector: Param,
        score: Variable,
    },
}

impl Source {
    pub fn score(&self) -> Option<Variable> {
        match self {
            Source::Fulltext { score, .. } | Source::Vector { score, .. } => Some(*score),
            _ => None,
        }
    }
}

/// One concrete type of a selection. Node types have a single branch, interfaces and unions one
/// per possible type.
#[derive(Debug)]
pub(crate) struct Branch {
    pub node: Variable,
    pub relationship: Variable,
    pub labels: Vec<String>,
    pub predicate: Option<Filter>,
    /// Validation every matched node must pass, or the branch contributes no node. Only
    /// branches of interfaces and unions have one.
    pub gate: Option<Filter>,
    pub projection: Projection,
    /// Relationship properties of a connection edge.
    pub edge_projection: Option<Projection>,
}

#[derive(Debug)]
pub(crate) struct Selection {
    pub source: Source,
    pub branches: Vec<Branch>,
    /// Branches are merged with `UNION` and sorted on their projections.
    pub is_abstract: bool,
    pub sort: Vec<SortItem>,
    pub offset: Option<Param>,
    pub limit: Option<Param>,
    /// To-one relationships.
    pub single: bool,
}

#[derive(Debug)]
pub(crate) struct SortItem {
    pub key: SortKey,
    pub order: Order,
}

#[derive(Debug)]
pub(crate) enum SortKey {
    Property(String),
    EdgeProperty(String),
    /// A custom statement field, materialized before sorting.
    Computed(Box<CustomField>),
    Score(Variable),
    /// A hidden entry of the projection, for the selections sorted after their projection.
    Projected(String),
    /// A hidden entry of the edge projection.
    EdgeProjected(String),
}

#[derive(Debug, Default)]
pub(crate) struct Projection {
    pub fields: Vec<(String, FieldValue)>,
}

impl Projection {
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(existing, _)| existing == key)
    }
}

#[derive(Debug)]
pub(crate) enum FieldValue {
    Property { name: String, format: PropertyFormat },
    /// A string constant, `__typename` or `__resolveType`.
    Constant(String),
    Selection(Box<Selection>),
    Connection(Box<Connection>),
    Aggregate(Box<Aggregation>),
    Custom(Box<CustomField>),
    /// The type of a node whose type is only known to be abstract, resolved from its labels.
    Typename(Vec<(String, Vec<String>)>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PropertyFormat {
    Plain,
    /// Projected as ISO strings.
    Temporal { list: bool },
    /// Requested subfields, `longitude`, `srid`...
    Point { subfields: Vec<(String, PointField)>, list: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PointField {
    Coordinate(String),
    Typename(String),
}

/// A relay connection over a selection. The statement returns `{ edges, totalCount }` with
/// edges as `{ node, properties, score }`, cursors and page info are computed when shaping.
#[derive(Debug)]
pub(crate) struct Connection {
    pub selection: Selection,
}

/// Aggregations over the nodes of a pattern, each value computed in its own subquery.
#[derive(Debug)]
pub(crate) struct Aggregation {
    pub traversal: Option<Traversal>,
    pub node: Variable,
    pub relationship: Variable,
    pub labels: Vec<String>,
    pub predicate: Option<Filter>,
    pub fields: Vec<(String, AggregateValue)>,
}

#[derive(Debug)]
pub(crate) enum AggregateValue {
    Count,
    Constant(String),
    Field(FieldAggregate),
    /// `node { ... }` and `edge { ... }`
    Map(Vec<(String, AggregateValue)>),
}

#[derive(Debug)]
pub(crate) struct FieldAggregate {
    pub property: String,
    pub on_relationship: bool,
    pub kind: AggregateKind,
    pub functions: Vec<(String, AggregateFunction)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AggregateKind {
    /// `shortest` and `longest`
    String,
    /// `min`, `max`, `average` and `sum`
    Number,
    /// `min` and `max`, projected as ISO strings.
    Temporal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AggregateFunction {
    Min,
    Max,
    Average,
    Sum,
    Shortest,
    Longest,
    Constant(String),
}

/// A `@cypher` field: the statement runs in a subquery with `this` bound to the parent.
#[derive(Debug)]
pub(crate) struct CustomField {
    pub statement: String,
    pub column: String,
    pub parent: Option<Variable>,
    pub substitutions: Vec<(String, Param)>,
    /// The column, once renamed.
    pub value: Variable,
    pub result: Variable,
    pub list: bool,
    pub output: CustomOutput,
}

#[derive(Debug)]
pub(crate) enum CustomOutput {
    Scalar(PropertyFormat),
    Nodes {
        predicate: Option<Filter>,
        projection: Projection,
        sort: Vec<SortItem>,
        offset: Option<Param>,
        limit: Option<Param>,
    },
}

#[derive(Debug)]
pub(crate) enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Constant(bool),
    /// `$isAuthenticated = true`
    Authenticated,
    Compare {
        left: Operand,
        operator: ComparisonOperator,
        right: Operand,
    },
    IsNull(Operand),
    Labels {
        node: Variable,
        labels: Vec<String>,
    },
    Related(Box<RelatedFilter>),
    Aggregate(Box<AggregateFilter>),
    /// A validation rule: the statement fails when the predicate does not hold.
    Guard {
        predicate: Box<Filter>,
        kind: GuardKind,
    },
}

impl Filter {
    /// Conjunction of the given filters, `None` when there are none.
    pub fn all(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
        let mut flat = Vec::new();

        for filter in filters {
            match filter {
                Filter::And(inner) => flat.extend(inner),
                Filter::Constant(true) => {}
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Filter::And(flat)),
        }
    }

    /// Disjunction of the given filters, `None` when there are none.
    pub fn any(filters: impl IntoIterator<Item = Filter>) -> Option<Filter> {
        let mut flat: Vec<Filter> = filters.into_iter().collect();

        if flat.iter().any(|filter| matches!(filter, Filter::Constant(true))) {
            return Some(Filter::Constant(true));
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Filter::Or(flat)),
        }
    }

    pub fn negate(self) -> Filter {
        match self {
            Filter::Not(inner) => *inner,
            Filter::Constant(value) => Filter::Constant(!value),
            other => Filter::Not(Box::new(other)),
        }
    }

    pub fn guard(predicate: Filter, kind: GuardKind) -> Filter {
        Filter::Guard {
            predicate: Box::new(predicate),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GuardKind {
    Forbidden,
    Unauthenticated,
}

impl GuardKind {
    pub fn message(self) -> &'static str {
        match self {
            GuardKind::Forbidden => "@graphql-cypher/FORBIDDEN",
            GuardKind::Unauthenticated => "@graphql-cypher/UNAUTHENTICATED",
        }
    }
}

#[derive(Debug)]
pub(crate) enum Operand {
    Property(Variable, String),
    Param(Param),
    /// `$jwt.<path>`
    Claim(Vec<String>),
    Computed(Box<CustomField>),
    Variable(Variable),
}

/// The nodes related to a parent, `(parent)-[relationship:TYPE]->(node:Label)`.
#[derive(Debug)]
pub(crate) struct RelatedPattern {
    pub traversal: Traversal,
    pub relationship: Option<Variable>,
    pub node: Variable,
    pub labels: Vec<String>,
    /// Label sets of the possible types of an abstract target, one must match.
    pub alternatives: Vec<Vec<String>>,
}

#[derive(Debug)]
pub(crate) struct RelatedFilter {
    pub pattern: RelatedPattern,
    pub quantifier: Quantifier,
    pub predicate: Option<Filter>,
}

#[derive(Debug)]
pub(crate) struct AggregateFilter {
    pub pattern: RelatedPattern,
    pub condition: AggregateCondition,
}

#[derive(Debug)]
pub(crate) enum AggregateCondition {
    And(Vec<AggregateCondition>),
    Or(Vec<AggregateCondition>),
    Not(Box<AggregateCondition>),
    Count {
        operator: ComparisonOperator,
        value: Param,
    },
    Property {
        on_relationship: bool,
        property: String,
        function: AggregationFunction,
        operator: ComparisonOperator,
        value: Param,
    },
}

#[derive(Debug)]
pub(crate) struct CreateNode {
    pub node: Variable,
    pub labels: Vec<String>,
    pub properties: Vec<(String, PropertyValue)>,
    pub nested: Vec<NestedOperation>,
    /// Validations of the created node, checked once everything nested is written.
    pub after: Option<Filter>,
}

#[derive(Debug)]
pub(crate) struct UpdateNode {
    pub node: Variable,
    pub predicate: Option<Filter>,
    pub properties: Vec<(String, PropertyValue)>,
    pub nested: Vec<NestedOperation>,
    pub after: Option<Filter>,
}

#[derive(Debug)]
pub(crate) struct DeleteNode {
    pub node: Variable,
    pub predicate: Option<Filter>,
    pub nested: Vec<NestedOperation>,
}

#[derive(Debug)]
pub(crate) enum PropertyValue {
    Param(Param),
    RandomUuid,
    /// `datetime()`, `date()`...
    Now(&'static str),
    Increment(Param),
    Decrement(Param),
    Push(Param),
}

#[derive(Debug)]
pub(crate) enum NestedOperation {
    Create {
        traversal: Traversal,
        relationship: Variable,
        edge_properties: Vec<(String, PropertyValue)>,
        node: CreateNode,
    },
    Connect {
        pattern: RelatedPattern,
        predicate: Option<Filter>,
        edge_properties: Vec<(String, PropertyValue)>,
        nested: Vec<NestedOperation>,
    },
    Disconnect {
        pattern: RelatedPattern,
        predicate: Option<Filter>,
    },
    Update {
        pattern: RelatedPattern,
        edge_properties: Vec<(String, PropertyValue)>,
        update: UpdateNode,
    },
    Delete {
        pattern: RelatedPattern,
        delete: DeleteNode,
    },
}

#[derive(Debug)]
pub(crate) enum FulltextEntry {
    Score,
    Node,
    Constant(String),
}

/// What a root field compiles to.
#[derive(Debug)]
pub(crate) enum Root {
    Read(Selection),
    /// Each row is a map of the requested entries, the score and the node projection.
    Fulltext {
        selection: Selection,
        entries: Vec<(String, FulltextEntry)>,
    },
    Connection(Connection),
    Aggregate(Aggregation),
    Custom(CustomField),
    Create {
        nodes: Vec<CreateNode>,
        /// Read authorization and field guards of the returned nodes.
        predicate: Option<Filter>,
        projection: Projection,
    },
    Update {
        labels: Vec<String>,
        update: UpdateNode,
        predicate: Option<Filter>,
        projection: Projection,
    },
    Delete {
        labels: Vec<String>,
        delete: DeleteNode,
    },
}
