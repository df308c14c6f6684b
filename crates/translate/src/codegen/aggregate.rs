use cypher_builder::{Call, Clause, Expr, Match, NodePattern, Order, Pattern, Projection, Variable};

use super::{traversal_pattern, Generator};
use crate::tree::{AggregateFunction, AggregateKind, AggregateValue, Aggregation, FieldAggregate};

impl Generator<'_> {
    pub(super) fn root_aggregation(&self, aggregation: &Aggregation) -> Vec<Clause> {
        let (mut clauses, value) = self.aggregation(aggregation);
        clauses.push(Clause::Return(Projection::new().item(value, Variable::root())));

        clauses
    }

    /// One subquery per aggregated value, and the map assembling them.
    pub(super) fn aggregation(&self, aggregation: &Aggregation) -> (Vec<Clause>, Expr) {
        let mut calls = Vec::new();
        let value = self.aggregate_map(aggregation, &aggregation.fields, &mut calls);

        (calls, value)
    }

    fn aggregate_map(
        &self,
        aggregation: &Aggregation,
        fields: &[(String, AggregateValue)],
        calls: &mut Vec<Clause>,
    ) -> Expr {
        let entries = fields
            .iter()
            .map(|(key, value)| {
                let expr = match value {
                    AggregateValue::Count => {
                        let result = self.names.plain();
                        let count = Expr::from(aggregation.node).count();
                        calls.push(self.aggregate_call(aggregation, Vec::new(), count, result));
                        result.into()
                    }
                    AggregateValue::Constant(value) => Expr::string(value),
                    AggregateValue::Field(field) => {
                        let result = self.names.plain();
                        calls.push(self.field_aggregate(aggregation, field, result));
                        result.into()
                    }
                    AggregateValue::Map(fields) => self.aggregate_map(aggregation, fields, calls),
                };

                (key.clone(), expr)
            })
            .collect();

        Expr::Map(entries)
    }

    fn field_aggregate(&self, aggregation: &Aggregation, field: &FieldAggregate, result: Variable) -> Clause {
        let target = if field.on_relationship {
            aggregation.relationship
        } else {
            aggregation.node
        };
        let property = target.property(&field.property);

        if field.kind == AggregateKind::String {
            // Longest first, the shortest is the last element.
            let list = self.names.plain();
            let sorted = vec![
                Clause::With(Projection::star().order_by(vec![
                    (property.clone().size(), Order::Desc),
                    (property.clone(), Order::Asc),
                ])),
                Clause::With(Projection::new().item(property.collect(), list)),
            ];

            let entries = field
                .functions
                .iter()
                .map(|(key, function)| {
                    let value = match function {
                        AggregateFunction::Longest => Expr::from(list).head(),
                        AggregateFunction::Shortest => Expr::from(list).last(),
                        AggregateFunction::Constant(value) => Expr::string(value),
                        _ => Expr::Null,
                    };

                    (key.clone(), value)
                })
                .collect();

            return self.aggregate_call(aggregation, sorted, Expr::Map(entries), result);
        }

        let entries = field
            .functions
            .iter()
            .map(|(key, function)| {
                let aggregated = match function {
                    AggregateFunction::Min => Expr::function("min", [property.clone()]),
                    AggregateFunction::Max => Expr::function("max", [property.clone()]),
                    AggregateFunction::Average => Expr::function("avg", [property.clone()]),
                    AggregateFunction::Sum => Expr::function("sum", [property.clone()]),
                    AggregateFunction::Constant(value) => return (key.clone(), Expr::string(value)),
                    AggregateFunction::Shortest | AggregateFunction::Longest => return (key.clone(), Expr::Null),
                };

                let value = match field.kind {
                    AggregateKind::Temporal => Expr::function("toString", [aggregated]),
                    _ => aggregated,
                };

                (key.clone(), value)
            })
            .collect();

        self.aggregate_call(aggregation, Vec::new(), Expr::Map(entries), result)
    }

    /// `CALL { WITH parent MATCH ... WHERE ... RETURN <value> AS result }`
    fn aggregate_call(&self, aggregation: &Aggregation, extra: Vec<Clause>, value: Expr, result: Variable) -> Clause {
        let node = NodePattern::new(aggregation.node).labels(aggregation.labels.clone());
        let pattern = match &aggregation.traversal {
            Some(traversal) => traversal_pattern(traversal, Some(aggregation.relationship), node),
            None => Pattern::from(node),
        };

        let mut body = self.filtered(
            |predicate| Match::new(pattern).predicate(predicate).into(),
            Vec::new(),
            aggregation.predicate.as_ref(),
        );
        body.extend(extra);
        body.push(Clause::Return(Projection::new().item(value, result)));

        let parent = aggregation.traversal.as_ref().map(|traversal| traversal.parent);
        Call::importing(parent, body).into()
    }
}
