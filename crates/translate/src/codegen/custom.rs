use cypher_builder::{Call, Clause, Expr, Imports, Projection, Variable};

use super::{
    format_value,
    read::{collected, paginate},
    Generator,
};
use crate::tree::{CustomField, CustomOutput, PropertyFormat};

impl Generator<'_> {
    /// `CALL { <statement> } WITH <column> AS this ... RETURN this { ... } AS this`
    pub(super) fn root_custom(&self, custom: &CustomField) -> Vec<Clause> {
        let mut clauses = vec![Call::new(Imports::None, self.custom_body(custom)).into()];

        let (rows, value) = self.custom_rows(custom);
        clauses.extend(rows);
        clauses.push(Clause::Return(Projection::new().item(value, Variable::root())));

        clauses
    }

    /// A custom field of a projected node, its rows collected as `result`.
    pub(super) fn custom_call(&self, custom: &CustomField) -> Clause {
        let imports: Vec<_> = custom.parent.into_iter().collect();

        let mut body = vec![Call::importing(imports.clone(), self.custom_body(custom)).into()];

        let (rows, value) = self.custom_rows(custom);
        body.extend(rows);
        body.push(Clause::Return(
            Projection::new().item(collected(value, !custom.list), custom.result),
        ));

        Call::importing(imports, body).into()
    }

    /// Renames the column of the statement, then filters, sorts and projects its rows. Returns
    /// the value of each row.
    fn custom_rows(&self, custom: &CustomField) -> (Vec<Clause>, Expr) {
        let value = custom.value;
        let mut clauses = vec![Clause::With(Projection::new().item(Expr::name(&custom.column), value))];

        match &custom.output {
            CustomOutput::Scalar(format) => {
                let format = if custom.list { row_format(format) } else { format.clone() };
                (clauses, format_value(self.names, value.into(), &format))
            }
            CustomOutput::Nodes {
                predicate,
                projection,
                sort,
                offset,
                limit,
            } => {
                clauses.extend(self.where_clauses(predicate.as_ref()));

                let mut pre = Vec::new();
                let order_by = self.order_by(sort, value.into(), value.into(), &mut pre);
                clauses.extend(pre);
                clauses.extend(paginate(order_by, *offset, *limit));

                let mut calls = Vec::new();
                let map = self.projection(value, projection, &mut calls);
                clauses.extend(calls);

                (clauses, map)
            }
        }
    }
}

/// Each row of a list field holds one item.
fn row_format(format: &PropertyFormat) -> PropertyFormat {
    match format {
        PropertyFormat::Plain => PropertyFormat::Plain,
        PropertyFormat::Temporal { .. } => PropertyFormat::Temporal { list: false },
        PropertyFormat::Point { subfields, .. } => PropertyFormat::Point {
            subfields: subfields.clone(),
            list: false,
        },
    }
}
