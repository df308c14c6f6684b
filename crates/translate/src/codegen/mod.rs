//! Code generation: lays out the clauses of a statement from the tree of a root field.
//!
//! Nested selections, aggregations and custom fields become `CALL` subqueries importing their
//! parent explicitly and returning one row per parent. Predicates reading subqueries of their own
//! (aggregation filters, custom fields) are checked in a `WITH * WHERE` following those
//! subqueries.

mod aggregate;
mod connection;
mod custom;
mod filter;
mod mutation;
mod read;

use cypher_builder::{Clause, Expr, Names, NodePattern, Pattern, Projection, RelationshipPattern, Variable};

use crate::tree::{Filter, PointField, PropertyFormat, RelatedPattern, Root, Traversal};

pub(crate) struct Generator<'a> {
    names: &'a Names,
}

/// The clauses of the statement of a root field. Every variable and parameter is allocated
/// through `names`, which renders the statement afterwards.
pub(crate) fn generate(root: &Root, names: &Names) -> Vec<Clause> {
    let generator = Generator { names };

    match root {
        Root::Read(selection) => generator.root_selection(selection),
        Root::Fulltext { selection, entries } => generator.fulltext(selection, entries),
        Root::Connection(connection) => generator.root_connection(connection),
        Root::Aggregate(aggregation) => generator.root_aggregation(aggregation),
        Root::Custom(custom) => generator.root_custom(custom),
        Root::Create {
            nodes,
            predicate,
            projection,
        } => generator.create(nodes, predicate.as_ref(), projection),
        Root::Update {
            labels,
            update,
            predicate,
            projection,
        } => generator.update(labels, update, predicate.as_ref(), projection),
        Root::Delete { labels, delete } => generator.delete(labels, delete),
    }
}

impl Generator<'_> {
    /// `head` carrying the conditions and the filter. A filter reading subqueries is checked in
    /// a `WITH * WHERE` following them.
    fn filtered(
        &self,
        head: impl FnOnce(Option<Expr>) -> Clause,
        conditions: Vec<Expr>,
        filter: Option<&Filter>,
    ) -> Vec<Clause> {
        let mut pre = Vec::new();
        let predicate = filter.map(|filter| self.filter(filter, &mut pre));

        if pre.is_empty() {
            return vec![head(Expr::and(conditions.into_iter().chain(predicate)))];
        }

        let mut clauses = vec![head(Expr::and(conditions))];
        clauses.extend(pre);
        clauses.push(Clause::With(Projection::star().predicate(predicate)));

        clauses
    }

    /// `WITH * WHERE <filter>`, nothing without a filter.
    fn where_clauses(&self, filter: Option<&Filter>) -> Vec<Clause> {
        match filter {
            Some(filter) => self.filtered(|predicate| Clause::With(Projection::star().predicate(predicate)), Vec::new(), Some(filter)),
            None => Vec::new(),
        }
    }
}

fn traversal_pattern(traversal: &Traversal, relationship: Option<Variable>, node: NodePattern) -> Pattern {
    Pattern::node(NodePattern::new(traversal.parent)).related(
        RelationshipPattern::new(relationship, traversal.relationship_type.clone(), traversal.direction),
        node,
    )
}

/// The pattern of related nodes, with the label alternatives of an abstract target.
fn related_pattern(pattern: &RelatedPattern) -> (Pattern, Option<Expr>) {
    let node = NodePattern::new(pattern.node).labels(pattern.labels.clone());
    let alternatives = Expr::or(
        pattern
            .alternatives
            .iter()
            .map(|labels| Expr::HasLabels(pattern.node, labels.clone())),
    );

    (traversal_pattern(&pattern.traversal, pattern.relationship, node), alternatives)
}

/// A stored value as returned to the client: ISO strings for temporals, maps of the requested
/// subfields for points.
fn format_value(names: &Names, value: Expr, format: &PropertyFormat) -> Expr {
    let (list, single): (bool, Box<dyn Fn(Expr) -> Expr>) = match format {
        PropertyFormat::Plain => return value,
        PropertyFormat::Temporal { list } => (*list, Box::new(|value| Expr::function("toString", [value]))),
        PropertyFormat::Point { subfields, list } => {
            let subfields = subfields.clone();
            (
                *list,
                Box::new(move |value: Expr| Expr::Case {
                    condition: Box::new(value.clone().is_null()),
                    then: Box::new(Expr::Null),
                    otherwise: Box::new(point(value, &subfields)),
                }),
            )
        }
    };

    if !list {
        return single(value);
    }

    let item = names.plain();

    Expr::ListComprehension {
        variable: item,
        list: Box::new(value),
        predicate: None,
        projection: Some(Box::new(single(item.into()))),
    }
}

fn point(value: Expr, subfields: &[(String, PointField)]) -> Expr {
    Expr::Map(
        subfields
            .iter()
            .map(|(key, field)| {
                let expr = match field {
                    PointField::Coordinate(name) => value.clone().property(name),
                    PointField::Typename(name) => Expr::string(name),
                };

                (key.clone(), expr)
            })
            .collect(),
    )
}

/// `CASE WHEN n:Movie THEN "Movie" ELSE ... END`
fn typename_case(node: Variable, alternatives: &[(String, Vec<String>)]) -> Expr {
    alternatives
        .iter()
        .rev()
        .fold(Expr::Null, |otherwise, (name, labels)| Expr::Case {
            condition: Box::new(Expr::HasLabels(node, labels.clone())),
            then: Box::new(Expr::string(name)),
            otherwise: Box::new(otherwise),
        })
}
