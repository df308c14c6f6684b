use cypher_builder::{BinaryOperator, Call, Clause, Expr, Imports, Match, NodePattern, Projection, SetItem, Variable};

use super::{related_pattern, traversal_pattern, Generator};
use crate::tree::{
    CreateNode, DeleteNode, Filter, NestedOperation, Projection as FieldProjection, PropertyValue, UpdateNode,
};

impl Generator<'_> {
    /// Each node is created in its own subquery, the created nodes are then projected together:
    ///
    /// ```cypher
    /// CALL { CREATE (this0:Movie) SET this0.title = $param0 RETURN this0 }
    /// UNWIND [this0] AS this
    /// RETURN collect(this { .title }) AS this
    /// ```
    pub(super) fn create(
        &self,
        nodes: &[CreateNode],
        predicate: Option<&Filter>,
        projection: &FieldProjection,
    ) -> Vec<Clause> {
        let mut clauses = Vec::new();

        for node in nodes {
            let mut body = self.create_clauses(node);
            body.push(Clause::Return(Projection::variables([node.node])));
            clauses.push(Call::new(Imports::None, body).into());
        }

        let root = Variable::root();
        let created = nodes.iter().map(|node| Expr::from(node.node)).collect();
        clauses.push(Clause::Unwind(Expr::List(created), root));
        clauses.extend(self.where_clauses(predicate));

        let mut calls = Vec::new();
        let map = self.projection(root, projection, &mut calls);
        clauses.extend(calls);
        clauses.push(Clause::Return(Projection::new().item(map.collect(), root)));

        clauses
    }

    /// ```cypher
    /// MATCH (this:Movie) WHERE ...
    /// SET this.title = $param0
    /// WITH * CALL { ... }
    /// RETURN collect(DISTINCT this { .title }) AS this
    /// ```
    pub(super) fn update(
        &self,
        labels: &[String],
        update: &UpdateNode,
        predicate: Option<&Filter>,
        projection: &FieldProjection,
    ) -> Vec<Clause> {
        let root = update.node;
        let node = NodePattern::new(root).labels(labels.to_vec());

        let mut clauses = self.filtered(
            |condition| Match::new(node).predicate(condition).into(),
            Vec::new(),
            update.predicate.as_ref(),
        );
        clauses.push(Clause::Set(set_items(root, &update.properties)));
        self.push_nested(&mut clauses, &update.nested);
        clauses.extend(self.where_clauses(update.after.as_ref()));
        clauses.extend(self.where_clauses(predicate));

        let mut calls = Vec::new();
        let map = self.projection(root, projection, &mut calls);

        if !calls.is_empty() {
            clauses.push(Clause::With(Projection::star()));
            clauses.extend(calls);
        }

        clauses.push(Clause::Return(Projection::new().item(map.distinct().collect(), root)));

        clauses
    }

    /// `MATCH (this:Movie) WHERE ... DETACH DELETE this`, nested deletes first.
    pub(super) fn delete(&self, labels: &[String], delete: &DeleteNode) -> Vec<Clause> {
        let node = NodePattern::new(delete.node).labels(labels.to_vec());

        let mut clauses = self.filtered(
            |condition| Match::new(node).predicate(condition).into(),
            Vec::new(),
            delete.predicate.as_ref(),
        );
        self.push_nested(&mut clauses, &delete.nested);
        clauses.push(Clause::Delete {
            detach: true,
            items: vec![delete.node.into()],
        });

        clauses
    }

    fn create_clauses(&self, node: &CreateNode) -> Vec<Clause> {
        let pattern = NodePattern::new(node.node).labels(node.labels.clone());

        let mut clauses = vec![
            Clause::Create(pattern.into()),
            Clause::Set(set_items(node.node, &node.properties)),
        ];
        self.push_nested(&mut clauses, &node.nested);
        clauses.extend(self.where_clauses(node.after.as_ref()));

        clauses
    }

    /// Nested operations follow their parent's writes, each in a subquery importing the parent.
    fn push_nested(&self, clauses: &mut Vec<Clause>, nested: &[NestedOperation]) {
        if nested.is_empty() {
            return;
        }

        clauses.push(Clause::With(Projection::star()));
        clauses.extend(nested.iter().map(|operation| self.nested_operation(operation)));
    }

    fn nested_operation(&self, operation: &NestedOperation) -> Clause {
        let (parent, mut body) = match operation {
            NestedOperation::Create {
                traversal,
                relationship,
                edge_properties,
                node,
            } => {
                let mut body = vec![
                    Clause::Create(NodePattern::new(node.node).labels(node.labels.clone()).into()),
                    Clause::Set(set_items(node.node, &node.properties)),
                    Clause::Create(traversal_pattern(traversal, Some(*relationship), NodePattern::new(node.node))),
                    Clause::Set(set_items(*relationship, edge_properties)),
                ];
                self.push_nested(&mut body, &node.nested);
                body.extend(self.where_clauses(node.after.as_ref()));

                (traversal.parent, body)
            }
            NestedOperation::Connect {
                pattern,
                predicate,
                edge_properties,
                nested,
            } => {
                let (_, alternatives) = related_pattern(pattern);
                let node = NodePattern::new(pattern.node).labels(pattern.labels.clone());
                let relationship = pattern.relationship.unwrap_or_else(|| self.names.relationship());

                let mut body = self.filtered(
                    |condition| Match::new(node).predicate(condition).into(),
                    alternatives.into_iter().collect(),
                    predicate.as_ref(),
                );
                body.push(Clause::Merge(traversal_pattern(
                    &pattern.traversal,
                    Some(relationship),
                    NodePattern::new(pattern.node),
                )));
                body.push(Clause::Set(set_items(relationship, edge_properties)));
                self.push_nested(&mut body, nested);

                (pattern.traversal.parent, body)
            }
            NestedOperation::Disconnect { pattern, predicate } => {
                let (matched, alternatives) = related_pattern(pattern);
                let relationship = pattern.relationship.map(Expr::from).unwrap_or(Expr::Null);

                let mut body = self.filtered(
                    |condition| Match::new(matched).predicate(condition).into(),
                    alternatives.into_iter().collect(),
                    predicate.as_ref(),
                );
                body.push(Clause::Delete {
                    detach: false,
                    items: vec![relationship],
                });

                (pattern.traversal.parent, body)
            }
            NestedOperation::Update {
                pattern,
                edge_properties,
                update,
            } => {
                let (matched, alternatives) = related_pattern(pattern);

                let mut body = self.filtered(
                    |condition| Match::new(matched).predicate(condition).into(),
                    alternatives.into_iter().collect(),
                    update.predicate.as_ref(),
                );

                let mut items = set_items(update.node, &update.properties);
                if let Some(relationship) = pattern.relationship {
                    items.extend(set_items(relationship, edge_properties));
                }
                body.push(Clause::Set(items));
                self.push_nested(&mut body, &update.nested);
                body.extend(self.where_clauses(update.after.as_ref()));

                (pattern.traversal.parent, body)
            }
            NestedOperation::Delete { pattern, delete } => {
                let (matched, alternatives) = related_pattern(pattern);

                let mut body = self.filtered(
                    |condition| Match::new(matched).predicate(condition).into(),
                    alternatives.into_iter().collect(),
                    delete.predicate.as_ref(),
                );
                self.push_nested(&mut body, &delete.nested);
                body.push(Clause::Delete {
                    detach: true,
                    items: vec![delete.node.into()],
                });

                (pattern.traversal.parent, body)
            }
        };

        body.push(Clause::Return(Projection::new().item(Expr::CountStar, self.names.plain())));

        Call::importing([parent], body).into()
    }
}

fn set_items(variable: Variable, properties: &[(String, PropertyValue)]) -> Vec<SetItem> {
    properties
        .iter()
        .map(|(name, value)| SetItem::property(variable, name, property_value(variable, name, value)))
        .collect()
}

fn property_value(variable: Variable, name: &str, value: &PropertyValue) -> Expr {
    match value {
        PropertyValue::Param(param) => (*param).into(),
        PropertyValue::RandomUuid => Expr::function("randomUUID", Vec::new()),
        PropertyValue::Now(function) => Expr::function(*function, Vec::new()),
        PropertyValue::Increment(param) => variable.property(name).binary(BinaryOperator::Add, *param),
        PropertyValue::Decrement(param) => variable.property(name).binary(BinaryOperator::Subtract, *param),
        PropertyValue::Push(param) => Expr::function("coalesce", [variable.property(name), Expr::List(Vec::new())])
            .binary(BinaryOperator::Add, *param),
    }
}
