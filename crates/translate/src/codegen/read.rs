use cypher_builder::{
    Call, CallProcedure, Clause, Expr, MapProjectionItem, Match, NodePattern, Order, Param, Projection, Variable,
};

use super::{format_value, traversal_pattern, typename_case, Generator};
use crate::tree::{Branch, FieldValue, Projection as FieldProjection, PropertyFormat, Selection, SortItem, SortKey, Source};

impl Generator<'_> {
    /// `MATCH (this:Movie) WHERE ... RETURN this { .title } AS this`
    pub(super) fn root_selection(&self, selection: &Selection) -> Vec<Clause> {
        match (selection.is_abstract, selection.branches.as_slice()) {
            (false, [branch]) => {
                let mut clauses = self.concrete_body(selection, branch);

                let mut calls = Vec::new();
                let map = self.projection(branch.node, &branch.projection, &mut calls);
                clauses.extend(calls);
                clauses.push(Clause::Return(Projection::new().item(map, branch.node)));

                clauses
            }
            _ => {
                let result = Variable::root();
                let mut clauses = vec![self.union(selection, None, result)];

                let mut pre = Vec::new();
                let order_by = self.order_by(&selection.sort, result.into(), result.into(), &mut pre);
                clauses.extend(pre);
                clauses.extend(paginate(order_by, selection.offset, selection.limit));
                clauses.push(Clause::Return(Projection::new().item(result, result)));

                clauses
            }
        }
    }

    /// The related nodes of `parent`, collected as `result`.
    pub(super) fn nested_selection(&self, selection: &Selection, parent: Variable, result: Variable) -> Clause {
        let body = match (selection.is_abstract, selection.branches.as_slice()) {
            (false, [branch]) => {
                let mut body = self.concrete_body(selection, branch);

                let mut calls = Vec::new();
                let map = self.projection(branch.node, &branch.projection, &mut calls);
                body.extend(calls);
                body.push(Clause::Return(Projection::new().item(collected(map, selection.single), result)));

                body
            }
            _ => {
                let item = self.names.plain();
                let mut body = vec![self.union(selection, Some(parent), item)];

                let mut pre = Vec::new();
                let order_by = self.order_by(&selection.sort, item.into(), item.into(), &mut pre);
                body.extend(pre);
                body.extend(paginate(order_by, selection.offset, selection.limit));
                body.push(Clause::Return(
                    Projection::new().item(collected(item.into(), selection.single), result),
                ));

                body
            }
        };

        Call::importing([parent], body).into()
    }

    /// Matching, filtering, sorting and paginating a concrete selection, up to its projection.
    pub(super) fn concrete_body(&self, selection: &Selection, branch: &Branch) -> Vec<Clause> {
        let mut clauses = self.branch_head(&selection.source, branch);

        let mut pre = Vec::new();
        let order_by = self.order_by(&selection.sort, branch.node.into(), branch.relationship.into(), &mut pre);
        clauses.extend(pre);
        clauses.extend(paginate(order_by, selection.offset, selection.limit));

        clauses
    }

    /// The nodes of one branch, filtered.
    pub(super) fn branch_head(&self, source: &Source, branch: &Branch) -> Vec<Clause> {
        let node = NodePattern::new(branch.node).labels(branch.labels.clone());
        let predicate = branch.predicate.as_ref();

        match source {
            Source::Labels => {
                let (mut clauses, conditions) = self.branch_gate(Match::new(node.clone()), None, branch);
                clauses.extend(self.filtered(|condition| Match::new(node).predicate(condition).into(), conditions, predicate));
                clauses
            }
            Source::Traversal(traversal) => {
                let pattern = traversal_pattern(traversal, Some(branch.relationship), node);
                let (mut clauses, conditions) =
                    self.branch_gate(Match::new(pattern.clone()), Some(traversal.parent), branch);
                clauses.extend(self.filtered(|condition| Match::new(pattern).predicate(condition).into(), conditions, predicate));
                clauses
            }
            Source::Fulltext {
                index_name,
                phrase,
                score,
            } => self.index_query(
                "db.index.fulltext.queryNodes",
                vec![Expr::string(index_name), (*phrase).into()],
                branch,
                *score,
            ),
            Source::Vector {
                index_name,
                neighbours,
                vector,
                score,
            } => self.index_query(
                "db.index.vector.queryNodes",
                vec![Expr::string(index_name), (*neighbours).into(), (*vector).into()],
                branch,
                *score,
            ),
        }
    }

    /// `CALL { MATCH <branch> WHERE <predicate> AND NOT (<gate>) RETURN count(*) AS var4 }` with the
    /// condition `var4 = 0`: a branch keeps its nodes only when none of them violates its gate.
    fn branch_gate(&self, head: Match, parent: Option<Variable>, branch: &Branch) -> (Vec<Clause>, Vec<Expr>) {
        let Some(gate) = &branch.gate else {
            return (Vec::new(), Vec::new());
        };

        let mut pre = Vec::new();
        let predicate = branch.predicate.as_ref().map(|filter| self.filter(filter, &mut pre));
        let violated = self.filter(gate, &mut pre).not();
        let violation = Expr::and(predicate.into_iter().chain(Some(violated)));

        let mut body = if pre.is_empty() {
            vec![head.predicate(violation).into()]
        } else {
            let mut body = vec![head.into()];
            body.extend(pre);
            body.push(Clause::With(Projection::star().predicate(violation)));
            body
        };

        let violations = self.names.plain();
        body.push(Clause::Return(Projection::new().item(Expr::CountStar, violations)));

        (
            vec![Call::importing(parent, body).into()],
            vec![Expr::from(violations).equals(Expr::Integer(0))],
        )
    }

    /// Index procedures return nodes of any label, the labels of the branch are checked.
    fn index_query(&self, procedure: &str, arguments: Vec<Expr>, branch: &Branch, score: Variable) -> Vec<Clause> {
        let head = |predicate| {
            Clause::CallProcedure(CallProcedure {
                name: procedure.to_string(),
                arguments,
                yields: vec![("node".to_string(), branch.node), ("score".to_string(), score)],
                predicate,
            })
        };

        let labels = vec![Expr::HasLabels(branch.node, branch.labels.clone())];
        self.filtered(head, labels, branch.predicate.as_ref())
    }

    /// Each branch projects its nodes as `result`, merged with `UNION`.
    pub(super) fn union(&self, selection: &Selection, parent: Option<Variable>, result: Variable) -> Clause {
        let branches: Vec<_> = selection
            .branches
            .iter()
            .map(|branch| {
                let mut clauses = self.branch_head(&selection.source, branch);

                let mut calls = Vec::new();
                let map = self.projection(branch.node, &branch.projection, &mut calls);
                clauses.extend(calls);
                clauses.push(Clause::Return(Projection::new().item(map, result)));

                clauses
            })
            .collect();

        let body = if branches.is_empty() {
            vec![
                Clause::Unwind(Expr::List(Vec::new()), result),
                Clause::Return(Projection::variables([result])),
            ]
        } else {
            vec![Clause::Union(branches)]
        };

        Call::importing(parent, body).into()
    }

    /// `node` and `relationship` are the expressions holding the sorted values, the variables
    /// themselves or the entries of a projected edge.
    pub(super) fn order_by(
        &self,
        sort: &[SortItem],
        node: Expr,
        relationship: Expr,
        pre: &mut Vec<Clause>,
    ) -> Vec<(Expr, Order)> {
        sort.iter()
            .map(|item| {
                let expr = match &item.key {
                    SortKey::Property(name) | SortKey::Projected(name) => node.clone().property(name),
                    SortKey::EdgeProperty(name) | SortKey::EdgeProjected(name) => relationship.clone().property(name),
                    SortKey::Computed(custom) => {
                        pre.push(self.computed(custom));
                        custom.result.into()
                    }
                    SortKey::Score(score) => (*score).into(),
                };

                (expr, item.order)
            })
            .collect()
    }

    /// `node { .title, actors: var2 }`, with the subqueries of nested fields appended to `calls`.
    pub(super) fn projection(&self, node: Variable, projection: &FieldProjection, calls: &mut Vec<Clause>) -> Expr {
        let items = projection
            .fields
            .iter()
            .map(|(key, value)| self.projection_item(node, key, value, calls))
            .collect();

        Expr::MapProjection(node, items)
    }

    fn projection_item(
        &self,
        node: Variable,
        key: &str,
        value: &FieldValue,
        calls: &mut Vec<Clause>,
    ) -> MapProjectionItem {
        let expr = match value {
            FieldValue::Property {
                name,
                format: PropertyFormat::Plain,
            } if name == key => return MapProjectionItem::Property(name.clone()),
            FieldValue::Property { name, format } => format_value(self.names, node.property(name), format),
            FieldValue::Constant(value) => Expr::string(value),
            FieldValue::Typename(alternatives) => typename_case(node, alternatives),
            FieldValue::Selection(selection) => {
                let result = self.names.plain();
                calls.push(self.nested_selection(selection, node, result));
                result.into()
            }
            FieldValue::Connection(connection) => {
                let result = self.names.plain();
                calls.push(self.nested_connection(connection, node, result));
                result.into()
            }
            FieldValue::Aggregate(aggregation) => {
                let (clauses, value) = self.aggregation(aggregation);
                calls.extend(clauses);
                value
            }
            FieldValue::Custom(custom) => {
                calls.push(self.custom_call(custom));
                custom.result.into()
            }
        };

        MapProjectionItem::Entry(key.to_string(), expr)
    }
}

/// `WITH * ORDER BY ... SKIP ... LIMIT ...`, nothing without modifiers.
pub(super) fn paginate(order_by: Vec<(Expr, Order)>, offset: Option<Param>, limit: Option<Param>) -> Option<Clause> {
    let projection = Projection::star()
        .order_by(order_by)
        .skip(offset.map(Expr::from))
        .limit(limit.map(Expr::from));

    projection.has_modifiers().then_some(Clause::With(projection))
}

/// `collect(value)`, or its first element for to-one relationships.
pub(super) fn collected(value: Expr, single: bool) -> Expr {
    if single {
        value.collect().head()
    } else {
        value.collect()
    }
}
