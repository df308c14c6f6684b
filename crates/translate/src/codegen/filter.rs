use cypher_builder::{BinaryOperator, Call, Clause, Expr, Match, Projection, Raw, Variable};
use graphql_cypher_schema::{AggregationFunction, ComparisonOperator, Quantifier};

use super::{related_pattern, Generator};
use crate::tree::{AggregateCondition, AggregateFilter, CustomField, Filter, Operand, RelatedFilter};

impl Generator<'_> {
    /// The expression of a filter. Subqueries it reads are appended to `pre`, to be placed before
    /// the clause checking the expression.
    pub(super) fn filter(&self, filter: &Filter, pre: &mut Vec<Clause>) -> Expr {
        match filter {
            Filter::And(filters) => {
                let items: Vec<_> = filters.iter().map(|filter| self.filter(filter, pre)).collect();
                Expr::and(items).unwrap_or(Expr::Boolean(true))
            }
            Filter::Or(filters) => {
                let items: Vec<_> = filters.iter().map(|filter| self.filter(filter, pre)).collect();
                Expr::or(items).unwrap_or(Expr::Boolean(false))
            }
            Filter::Not(inner) => match inner.as_ref() {
                Filter::IsNull(operand) => self.operand(operand, pre).is_not_null(),
                inner => self.filter(inner, pre).not(),
            },
            Filter::Constant(value) => Expr::Boolean(*value),
            Filter::Authenticated => Expr::named_param("isAuthenticated").equals(true),
            Filter::Compare { left, operator, right } => {
                let left = self.operand(left, pre);
                let right = self.operand(right, pre);
                compare(left, *operator, right)
            }
            Filter::IsNull(operand) => self.operand(operand, pre).is_null(),
            Filter::Labels { node, labels } => Expr::HasLabels(*node, labels.clone()),
            Filter::Related(related) => self.related(related),
            Filter::Aggregate(aggregate) => self.aggregate_filter(aggregate, pre),
            Filter::Guard { predicate, kind } => {
                let predicate = self.filter(predicate, pre);

                Expr::function(
                    "apoc.util.validatePredicate",
                    [
                        predicate.not(),
                        Expr::string(kind.message()),
                        Expr::List(vec![Expr::Integer(0)]),
                    ],
                )
            }
        }
    }

    fn operand(&self, operand: &Operand, pre: &mut Vec<Clause>) -> Expr {
        match operand {
            Operand::Property(variable, name) => variable.property(name),
            Operand::Param(param) => (*param).into(),
            Operand::Claim(segments) => segments
                .iter()
                .fold(Expr::named_param("jwt"), |expr, segment| expr.property(segment)),
            Operand::Computed(custom) => {
                pre.push(self.computed(custom));
                custom.result.into()
            }
            Operand::Variable(variable) => (*variable).into(),
        }
    }

    /// `EXISTS { MATCH (parent)-[:TYPE]->(node) WHERE ... }` and its quantified variants.
    fn related(&self, related: &RelatedFilter) -> Expr {
        let (pattern, alternatives) = related_pattern(&related.pattern);

        let mut pre = Vec::new();
        let predicate = related.predicate.as_ref().map(|filter| self.filter(filter, &mut pre));

        let subquery = |predicate: Option<Expr>| -> Vec<Clause> {
            let head = |condition: Option<Expr>| -> Clause { Match::new(pattern.clone()).predicate(condition).into() };

            if pre.is_empty() {
                return vec![head(Expr::and(alternatives.clone().into_iter().chain(predicate)))];
            }

            let mut clauses = vec![head(alternatives.clone())];
            clauses.extend(pre.iter().cloned());
            clauses.push(Clause::With(Projection::star().predicate(predicate)));
            clauses
        };

        match related.quantifier {
            Quantifier::Some => Expr::Exists(subquery(predicate)),
            Quantifier::None => Expr::Exists(subquery(predicate)).not(),
            Quantifier::Single => Expr::Count(subquery(predicate)).equals(Expr::Integer(1)),
            Quantifier::All => match predicate {
                Some(predicate) => Expr::And(vec![
                    Expr::Exists(subquery(None)),
                    Expr::Exists(subquery(Some(predicate.not()))).not(),
                ]),
                None => Expr::Exists(subquery(None)),
            },
        }
    }

    /// The aggregation runs in a subquery returning whether the condition holds.
    fn aggregate_filter(&self, aggregate: &AggregateFilter, pre: &mut Vec<Clause>) -> Expr {
        let (pattern, alternatives) = related_pattern(&aggregate.pattern);
        let result = self.names.plain();

        let node = aggregate.pattern.node;
        let relationship = aggregate.pattern.relationship.unwrap_or(node);
        let condition = aggregate_condition(&aggregate.condition, node, relationship);

        let body = vec![
            Match::new(pattern).predicate(alternatives).into(),
            Clause::Return(Projection::new().item(condition, result)),
        ];

        pre.push(Call::importing([aggregate.pattern.traversal.parent], body).into());

        Expr::from(result).equals(true)
    }

    /// A custom field read by a filter or a sort, one value per parent.
    pub(super) fn computed(&self, custom: &CustomField) -> Clause {
        let imports: Vec<_> = custom.parent.into_iter().collect();
        let value = Expr::name(&custom.column);

        let inner = Call::importing(imports.clone(), self.custom_body(custom));
        let body = vec![
            inner.into(),
            Clause::Return(Projection::new().item(value.collect().head(), custom.result)),
        ];

        Call::importing(imports, body).into()
    }

    /// The statement of a custom field with `this` bound to the parent node.
    pub(super) fn custom_body(&self, custom: &CustomField) -> Vec<Clause> {
        let mut body = Vec::new();

        if let Some(parent) = custom.parent {
            body.push(Clause::With(Projection::new().item(parent, "this")));
        }

        body.push(Clause::Raw(Raw {
            statement: custom.statement.clone(),
            substitutions: custom
                .substitutions
                .iter()
                .map(|(name, param)| (name.clone(), Expr::from(*param)))
                .collect(),
        }));

        body
    }
}

pub(super) fn compare(left: Expr, operator: ComparisonOperator, right: Expr) -> Expr {
    match operator {
        ComparisonOperator::Equal => left.equals(right),
        ComparisonOperator::In => left.in_list(right),
        ComparisonOperator::LessThan => left.binary(BinaryOperator::LessThan, right),
        ComparisonOperator::LessThanOrEqual => left.binary(BinaryOperator::LessThanOrEquals, right),
        ComparisonOperator::GreaterThan => left.binary(BinaryOperator::GreaterThan, right),
        ComparisonOperator::GreaterThanOrEqual => left.binary(BinaryOperator::GreaterThanOrEquals, right),
        ComparisonOperator::Contains => left.binary(BinaryOperator::Contains, right),
        ComparisonOperator::StartsWith => left.binary(BinaryOperator::StartsWith, right),
        ComparisonOperator::EndsWith => left.binary(BinaryOperator::EndsWith, right),
        ComparisonOperator::Matches => left.binary(BinaryOperator::Matches, right),
        ComparisonOperator::Includes => right.in_list(left),
    }
}

fn aggregate_condition(condition: &AggregateCondition, node: Variable, relationship: Variable) -> Expr {
    match condition {
        AggregateCondition::And(conditions) => Expr::and(
            conditions
                .iter()
                .map(|condition| aggregate_condition(condition, node, relationship)),
        )
        .unwrap_or(Expr::Boolean(true)),
        AggregateCondition::Or(conditions) => Expr::or(
            conditions
                .iter()
                .map(|condition| aggregate_condition(condition, node, relationship)),
        )
        .unwrap_or(Expr::Boolean(false)),
        AggregateCondition::Not(inner) => aggregate_condition(inner, node, relationship).not(),
        AggregateCondition::Count { operator, value } => compare(Expr::from(node).count(), *operator, (*value).into()),
        AggregateCondition::Property {
            on_relationship,
            property,
            function,
            operator,
            value,
        } => {
            let target = if *on_relationship { relationship } else { node };
            let property = target.property(property);

            let aggregated = match function {
                AggregationFunction::Average => Expr::function("avg", [property]),
                AggregationFunction::Min => Expr::function("min", [property]),
                AggregationFunction::Max => Expr::function("max", [property]),
                AggregationFunction::Sum => Expr::function("sum", [property]),
                AggregationFunction::ShortestLength => Expr::function("min", [property.size()]),
                AggregationFunction::LongestLength => Expr::function("max", [property.size()]),
                AggregationFunction::AverageLength => Expr::function("avg", [property.size()]),
            };

            compare(aggregated, *operator, (*value).into())
        }
    }
}
