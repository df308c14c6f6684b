use cypher_builder::{Call, Clause, Expr, Projection, Variable};

use super::{read::paginate, Generator};
use crate::tree::{Branch, Connection, FulltextEntry, Selection, Source};

impl Generator<'_> {
    pub(super) fn root_connection(&self, connection: &Connection) -> Vec<Clause> {
        self.connection_body(connection, None, Variable::root())
    }

    pub(super) fn nested_connection(&self, connection: &Connection, parent: Variable, result: Variable) -> Clause {
        Call::importing([parent], self.connection_body(connection, Some(parent), result)).into()
    }

    /// Edges are collected before pagination so the total count covers every match:
    ///
    /// ```cypher
    /// MATCH (this)-[this0:ACTED_IN]->(this1:Actor)
    /// WITH collect({ node: this1, relationship: this0 }) AS edges
    /// WITH edges, size(edges) AS totalCount
    /// CALL { WITH edges UNWIND edges AS edge ... RETURN collect({ ... }) AS var2 }
    /// RETURN { edges: var2, totalCount: totalCount } AS this
    /// ```
    fn connection_body(&self, connection: &Connection, parent: Option<Variable>, result: Variable) -> Vec<Clause> {
        let selection = &connection.selection;
        let edges = self.names.plain();
        let total = self.names.plain();
        let page = self.names.plain();

        let (mut clauses, paginated) = match (selection.is_abstract, selection.branches.as_slice()) {
            (false, [branch]) => self.concrete_edges(selection, branch, edges, page),
            _ => self.abstract_edges(selection, parent, edges, page),
        };

        clauses.push(Clause::With(
            Projection::variables([edges]).item(Expr::from(edges).size(), total),
        ));
        clauses.push(paginated);
        clauses.push(Clause::Return(Projection::new().item(
            Expr::Map(vec![
                ("edges".to_string(), page.into()),
                ("totalCount".to_string(), total.into()),
            ]),
            result,
        )));

        clauses
    }

    /// The clauses collecting the matches as `edges`, and the subquery paginating and projecting
    /// them as `page`.
    fn concrete_edges(
        &self,
        selection: &Selection,
        branch: &Branch,
        edges: Variable,
        page: Variable,
    ) -> (Vec<Clause>, Clause) {
        let mut clauses = self.branch_head(&selection.source, branch);

        let traversal = matches!(selection.source, Source::Traversal(_));
        let score = selection.source.score();

        let mut entries = vec![("node".to_string(), Expr::from(branch.node))];
        if traversal {
            entries.push(("relationship".to_string(), branch.relationship.into()));
        }
        if let Some(score) = score {
            entries.push(("score".to_string(), score.into()));
        }

        clauses.push(Clause::With(Projection::new().item(Expr::Map(entries).collect(), edges)));

        let edge = self.names.plain();
        let mut unwound = Projection::new().item(Expr::from(edge).property("node"), branch.node);
        if traversal {
            unwound = unwound.item(Expr::from(edge).property("relationship"), branch.relationship);
        }
        if let Some(score) = score {
            unwound = unwound.item(Expr::from(edge).property("score"), score);
        }

        let mut body = vec![Clause::Unwind(edges.into(), edge), Clause::With(unwound)];

        let mut pre = Vec::new();
        let order_by = self.order_by(&selection.sort, branch.node.into(), branch.relationship.into(), &mut pre);
        body.extend(pre);
        body.extend(paginate(order_by, selection.offset, selection.limit));

        let mut calls = Vec::new();
        let mut projected = vec![(
            "node".to_string(),
            self.projection(branch.node, &branch.projection, &mut calls),
        )];
        if let (true, Some(edge_projection)) = (traversal, &branch.edge_projection) {
            projected.push((
                "properties".to_string(),
                self.projection(branch.relationship, edge_projection, &mut calls),
            ));
        }
        if let Some(score) = score {
            projected.push(("score".to_string(), score.into()));
        }

        body.extend(calls);
        body.push(Clause::Return(
            Projection::new().item(Expr::Map(projected).collect(), page),
        ));

        (clauses, Call::importing([edges], body).into())
    }

    /// Every branch projects its edges before they are merged, pagination then reads the hidden
    /// sort entries of the projections.
    fn abstract_edges(
        &self,
        selection: &Selection,
        parent: Option<Variable>,
        edges: Variable,
        page: Variable,
    ) -> (Vec<Clause>, Clause) {
        let edge = self.names.plain();
        let traversal = matches!(selection.source, Source::Traversal(_));

        let branches: Vec<_> = selection
            .branches
            .iter()
            .map(|branch| {
                let mut clauses = self.branch_head(&selection.source, branch);

                let mut calls = Vec::new();
                let mut projected = vec![(
                    "node".to_string(),
                    self.projection(branch.node, &branch.projection, &mut calls),
                )];
                if let (true, Some(edge_projection)) = (traversal, &branch.edge_projection) {
                    projected.push((
                        "properties".to_string(),
                        self.projection(branch.relationship, edge_projection, &mut calls),
                    ));
                }

                clauses.extend(calls);
                clauses.push(Clause::Return(Projection::new().item(Expr::Map(projected), edge)));
                clauses
            })
            .collect();

        let union_body = if branches.is_empty() {
            vec![
                Clause::Unwind(Expr::List(Vec::new()), edge),
                Clause::Return(Projection::variables([edge])),
            ]
        } else {
            vec![Clause::Union(branches)]
        };

        let clauses = vec![
            Call::importing(parent, union_body).into(),
            Clause::With(Projection::new().item(Expr::from(edge).collect(), edges)),
        ];

        let unwound = self.names.plain();
        let mut body = vec![Clause::Unwind(edges.into(), unwound)];

        let mut pre = Vec::new();
        let order_by = self.order_by(
            &selection.sort,
            Expr::from(unwound).property("node"),
            Expr::from(unwound).property("properties"),
            &mut pre,
        );
        body.extend(pre);
        body.extend(paginate(order_by, selection.offset, selection.limit));
        body.push(Clause::Return(
            Projection::new().item(Expr::from(unwound).collect(), page),
        ));

        (clauses, Call::importing([edges], body).into())
    }

    /// `CALL db.index.fulltext.queryNodes(...) YIELD node AS this, score AS var0 ... RETURN { score: var0, movie: this { ... } } AS this`
    pub(super) fn fulltext(&self, selection: &Selection, entries: &[(String, FulltextEntry)]) -> Vec<Clause> {
        let Some(branch) = selection.branches.first() else {
            return Vec::new();
        };

        let mut clauses = self.concrete_body(selection, branch);
        let score = selection.source.score();

        let mut calls = Vec::new();
        let mut map = Vec::with_capacity(entries.len());

        for (key, entry) in entries {
            let value = match entry {
                FulltextEntry::Score => score.map(Expr::from).unwrap_or(Expr::Null),
                FulltextEntry::Node => self.projection(branch.node, &branch.projection, &mut calls),
                FulltextEntry::Constant(value) => Expr::string(value),
            };

            map.push((key.clone(), value));
        }

        clauses.extend(calls);
        clauses.push(Clause::Return(Projection::new().item(Expr::Map(map), Variable::root())));

        clauses
    }
}
