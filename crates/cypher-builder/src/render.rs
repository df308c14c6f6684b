use std::collections::HashMap;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::{
    clause::{Alias, Call, CallProcedure, Clause, Imports, Match, Order, Projection, Raw, SetItem},
    expr::{Expr, MapProjectionItem},
    pattern::{Direction, NodePattern, Pattern, RelationshipPattern},
    Names, Param, Value, Variable, VariableKind,
};

pub type Params = IndexMap<String, Value>;

const INDENT: &str = "    ";

/// A complete statement, ready to be rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub clauses: Vec<Clause>,
}

impl Statement {
    pub fn new(clauses: Vec<Clause>) -> Self {
        Self { clauses }
    }

    /// Renders the statement. Variables and parameters are named in order of first appearance,
    /// so building the same statement twice yields the same text and parameter map.
    pub fn build(&self, names: &Names) -> (String, Params) {
        let mut renderer = Renderer::new(names);
        let lines = renderer.clauses(&self.clauses);

        (lines.join("\n"), renderer.params)
    }
}

struct Renderer<'a> {
    names: &'a Names,
    variables: HashMap<u32, String>,
    next_variable: usize,
    param_names: HashMap<Param, String>,
    params: Params,
}

impl<'a> Renderer<'a> {
    fn new(names: &'a Names) -> Self {
        Self {
            names,
            variables: HashMap::new(),
            next_variable: 0,
            param_names: HashMap::new(),
            params: IndexMap::new(),
        }
    }

    fn variable(&mut self, variable: Variable) -> String {
        if variable.is_root() {
            return "this".to_string();
        }

        if let Some(name) = self.variables.get(&variable.id()) {
            return name.clone();
        }

        let prefix = match variable.kind() {
            VariableKind::Node | VariableKind::Relationship => "this",
            VariableKind::Plain => "var",
        };

        let name = format!("{prefix}{}", self.next_variable);
        self.next_variable += 1;
        self.variables.insert(variable.id(), name.clone());

        name
    }

    fn param(&mut self, param: Param) -> String {
        if let Some(name) = self.param_names.get(&param) {
            return format!("${name}");
        }

        let name = format!("param{}", self.param_names.len());
        self.params.insert(name.clone(), self.names.param_value(param));
        self.param_names.insert(param, name.clone());

        format!("${name}")
    }

    fn clauses(&mut self, clauses: &[Clause]) -> Vec<String> {
        let mut lines = Vec::new();

        for clause in clauses {
            self.clause(clause, &mut lines);
        }

        lines
    }

    fn clause(&mut self, clause: &Clause, lines: &mut Vec<String>) {
        match clause {
            Clause::Match(Match {
                optional,
                pattern,
                predicate,
            }) => {
                let keyword = if *optional { "OPTIONAL MATCH" } else { "MATCH" };
                let pattern = self.pattern(pattern);
                lines.push(format!("{keyword} {pattern}"));

                if let Some(predicate) = predicate {
                    let predicate = self.expr(predicate);
                    lines.push(format!("WHERE {predicate}"));
                }
            }
            Clause::With(projection) => self.projection("WITH", projection, lines),
            Clause::Return(projection) => self.projection("RETURN", projection, lines),
            Clause::Unwind(expr, variable) => {
                let expr = self.expr(expr);
                let variable = self.variable(*variable);
                lines.push(format!("UNWIND {expr} AS {variable}"));
            }
            Clause::Call(call) => self.call(call, lines),
            Clause::Union(branches) => {
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        lines.push("UNION".to_string());
                    }
                    lines.extend(self.clauses(branch));
                }
            }
            Clause::CallProcedure(CallProcedure {
                name,
                arguments,
                yields,
                predicate,
            }) => {
                let arguments = arguments.iter().map(|arg| self.expr(arg)).join(", ");
                let mut line = format!("CALL {name}({arguments})");

                if !yields.is_empty() {
                    let yields = yields
                        .iter()
                        .map(|(column, variable)| format!("{column} AS {}", self.variable(*variable)))
                        .join(", ");
                    line.push_str(" YIELD ");
                    line.push_str(&yields);
                }

                lines.push(line);

                if let Some(predicate) = predicate {
                    let predicate = self.expr(predicate);
                    lines.push(format!("WHERE {predicate}"));
                }
            }
            Clause::Create(pattern) => {
                let pattern = self.pattern(pattern);
                lines.push(format!("CREATE {pattern}"));
            }
            Clause::Merge(pattern) => {
                let pattern = self.pattern(pattern);
                lines.push(format!("MERGE {pattern}"));
            }
            Clause::Set(items) => {
                if items.is_empty() {
                    return;
                }

                lines.push("SET".to_string());
                let count = items.len();

                for (index, item) in items.iter().enumerate() {
                    let SetItem::Property { target, value } = item;
                    let separator = if index + 1 < count { "," } else { "" };
                    let rendered = format!("{} = {}{separator}", self.expr(target), self.expr(value));
                    lines.push(indent(&rendered));
                }
            }
            Clause::Delete { detach, items } => {
                let keyword = if *detach { "DETACH DELETE" } else { "DELETE" };
                let items = items.iter().map(|item| self.expr(item)).join(", ");
                lines.push(format!("{keyword} {items}"));
            }
            Clause::Raw(raw) => {
                let statement = self.raw(raw);
                lines.extend(statement.trim().lines().map(|line| line.trim().to_string()));
            }
        }
    }

    fn call(&mut self, call: &Call, lines: &mut Vec<String>) {
        let imports = match &call.imports {
            Imports::None => None,
            Imports::Star => Some("WITH *".to_string()),
            Imports::Variables(variables) => Some(format!(
                "WITH {}",
                variables
                    .iter()
                    .map(|variable| self.variable(*variable))
                    .join(", ")
            )),
        };

        let mut body = Vec::new();

        match call.body.as_slice() {
            [Clause::Union(branches)] => {
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        body.push("UNION".to_string());
                    }
                    body.extend(imports.clone());
                    body.extend(self.clauses(branch));
                }
            }
            clauses => {
                body.extend(imports);
                body.extend(self.clauses(clauses));
            }
        }

        lines.push("CALL {".to_string());
        lines.extend(body.iter().map(|line| indent(line)));
        lines.push("}".to_string());
    }

    fn projection(&mut self, keyword: &str, projection: &Projection, lines: &mut Vec<String>) {
        let mut items = Vec::with_capacity(projection.items.len() + 1);

        if projection.star {
            items.push("*".to_string());
        }

        for (expr, alias) in &projection.items {
            let expr = self.expr(expr);

            match alias {
                Some(alias) => {
                    let alias = self.alias(alias);
                    if alias == expr {
                        items.push(expr);
                    } else {
                        items.push(format!("{expr} AS {alias}"));
                    }
                }
                None => items.push(expr),
            }
        }

        let distinct = if projection.distinct { "DISTINCT " } else { "" };
        lines.push(format!("{keyword} {distinct}{}", items.join(", ")));

        if !projection.order_by.is_empty() {
            let order = projection
                .order_by
                .iter()
                .map(|(expr, order)| {
                    let direction = match order {
                        Order::Asc => "ASC",
                        Order::Desc => "DESC",
                    };
                    format!("{} {direction}", self.expr(expr))
                })
                .join(", ");

            lines.push(format!("ORDER BY {order}"));
        }

        if let Some(skip) = &projection.skip {
            let skip = self.expr(skip);
            lines.push(format!("SKIP {skip}"));
        }

        if let Some(limit) = &projection.limit {
            let limit = self.expr(limit);
            lines.push(format!("LIMIT {limit}"));
        }

        if keyword == "WITH" {
            if let Some(predicate) = &projection.predicate {
                let predicate = self.expr(predicate);
                lines.push(format!("WHERE {predicate}"));
            }
        }
    }

    fn alias(&mut self, alias: &Alias) -> String {
        match alias {
            Alias::Variable(variable) => self.variable(*variable),
            Alias::Name(name) => escape(name),
        }
    }

    fn pattern(&mut self, pattern: &Pattern) -> String {
        let mut out = self.node_pattern(&pattern.start);

        for (relationship, node) in &pattern.chain {
            out.push_str(&self.relationship_pattern(relationship));
            out.push_str(&self.node_pattern(node));
        }

        out
    }

    fn node_pattern(&mut self, node: &NodePattern) -> String {
        let mut out = String::from("(");

        if let Some(variable) = node.variable {
            out.push_str(&self.variable(variable));
        }

        for label in &node.labels {
            out.push(':');
            out.push_str(&escape(label));
        }

        if !node.properties.is_empty() {
            out.push_str(" { ");
            out.push_str(&self.entries(&node.properties));
            out.push_str(" }");
        }

        out.push(')');
        out
    }

    fn relationship_pattern(&mut self, relationship: &RelationshipPattern) -> String {
        let mut inner = String::new();

        if let Some(variable) = relationship.variable {
            inner.push_str(&self.variable(variable));
        }

        if !relationship.types.is_empty() {
            inner.push(':');
            inner.push_str(
                &relationship
                    .types
                    .iter()
                    .map(|ty| escape(ty))
                    .join("|"),
            );
        }

        match relationship.direction {
            Direction::Outgoing => format!("-[{inner}]->"),
            Direction::Incoming => format!("<-[{inner}]-"),
            Direction::Undirected => format!("-[{inner}]-"),
        }
    }

    fn entries(&mut self, entries: &[(String, Expr)]) -> String {
        entries
            .iter()
            .map(|(key, value)| format!("{}: {}", escape(key), self.expr(value)))
            .join(", ")
    }

    fn subquery(&mut self, keyword: &str, clauses: &[Clause]) -> String {
        let lines = self.clauses(clauses);
        let mut out = format!("{keyword} {{\n");

        for line in lines {
            out.push_str(&indent(&line));
            out.push('\n');
        }

        out.push('}');
        out
    }

    fn raw(&mut self, raw: &Raw) -> String {
        let mut substitutions = Vec::with_capacity(raw.substitutions.len());
        for (name, expr) in &raw.substitutions {
            substitutions.push((name.as_str(), self.expr(expr)));
        }

        let mut out = String::with_capacity(raw.statement.len());
        let mut chars = raw.statement.char_indices().peekable();

        while let Some((start, c)) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            let mut end = start + 1;
            while let Some((index, next)) = chars.peek().copied() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    end = index + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }

            let token = &raw.statement[start + 1..end];

            match substitutions.iter().find(|(name, _)| *name == token) {
                Some((_, rendered)) => out.push_str(rendered),
                None => {
                    out.push('$');
                    out.push_str(token);
                }
            }
        }

        out
    }

    fn operand(&mut self, expr: &Expr) -> String {
        let rendered = self.expr(expr);

        match expr {
            Expr::Binary(..) | Expr::Not(_) | Expr::IsNull(_) | Expr::IsNotNull(_) => format!("({rendered})"),
            _ => rendered,
        }
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Variable(variable) => self.variable(*variable),
            Expr::Param(param) => self.param(*param),
            Expr::NamedParam(name) => format!("${name}"),
            Expr::Name(name) => escape(name),
            Expr::Null => "NULL".to_string(),
            Expr::Boolean(value) => value.to_string(),
            Expr::Integer(value) => value.to_string(),
            Expr::String(value) => quote(value),
            Expr::Property(target, name) => {
                let target_rendered = self.expr(target);
                let target_rendered = match target.as_ref() {
                    Expr::Variable(_) | Expr::Param(_) | Expr::NamedParam(_) | Expr::Name(_) | Expr::Property(..) => {
                        target_rendered
                    }
                    _ => format!("({target_rendered})"),
                };

                format!("{target_rendered}.{}", escape(name))
            }
            Expr::Function(name, args) => {
                let args = args.iter().map(|arg| self.expr(arg)).join(", ");
                format!("{name}({args})")
            }
            Expr::CountStar => "count(*)".to_string(),
            Expr::Distinct(inner) => format!("DISTINCT {}", self.expr(inner)),
            Expr::Binary(operator, left, right) => {
                let left = self.operand(left);
                let right = self.operand(right);
                format!("{left} {} {right}", operator.as_str())
            }
            Expr::Not(inner) => format!("NOT ({})", self.expr(inner)),
            Expr::IsNull(inner) => format!("{} IS NULL", self.operand(inner)),
            Expr::IsNotNull(inner) => format!("{} IS NOT NULL", self.operand(inner)),
            Expr::And(items) => self.junction("AND", items, "true"),
            Expr::Or(items) => self.junction("OR", items, "false"),
            Expr::List(items) => {
                let items = items.iter().map(|item| self.expr(item)).join(", ");
                format!("[{items}]")
            }
            Expr::Map(entries) => {
                if entries.is_empty() {
                    "{ }".to_string()
                } else {
                    format!("{{ {} }}", self.entries(entries))
                }
            }
            Expr::MapProjection(variable, items) => {
                let variable = self.variable(*variable);
                let items = items
                    .iter()
                    .map(|item| match item {
                        MapProjectionItem::Property(name) => format!(".{}", escape(name)),
                        MapProjectionItem::Entry(key, value) => format!("{}: {}", escape(key), self.expr(value)),
                    })
                    .collect::<Vec<_>>();

                if items.is_empty() {
                    format!("{variable} {{ }}")
                } else {
                    format!("{variable} {{ {} }}", items.join(", "))
                }
            }
            Expr::HasLabels(variable, labels) => {
                let mut out = self.variable(*variable);
                for label in labels {
                    out.push(':');
                    out.push_str(&escape(label));
                }
                out
            }
            Expr::Exists(clauses) => self.subquery("EXISTS", clauses),
            Expr::Count(clauses) => self.subquery("COUNT", clauses),
            Expr::PatternComprehension {
                pattern,
                predicate,
                projection,
            } => {
                let pattern = self.pattern(pattern);
                let predicate = predicate
                    .as_ref()
                    .map(|predicate| format!(" WHERE {}", self.expr(predicate)))
                    .unwrap_or_default();
                let projection = self.expr(projection);

                format!("[{pattern}{predicate} | {projection}]")
            }
            Expr::ListComprehension {
                variable,
                list,
                predicate,
                projection,
            } => {
                let variable = self.variable(*variable);
                let list = self.expr(list);
                let predicate = predicate
                    .as_ref()
                    .map(|predicate| format!(" WHERE {}", self.expr(predicate)))
                    .unwrap_or_default();
                let projection = projection
                    .as_ref()
                    .map(|projection| format!(" | {}", self.expr(projection)))
                    .unwrap_or_default();

                format!("[{variable} IN {list}{predicate}{projection}]")
            }
            Expr::Case {
                condition,
                then,
                otherwise,
            } => {
                let condition = self.expr(condition);
                let then = self.expr(then);
                let otherwise = self.expr(otherwise);

                format!("CASE WHEN {condition} THEN {then} ELSE {otherwise} END")
            }
        }
    }

    fn junction(&mut self, keyword: &str, items: &[Expr], empty: &str) -> String {
        match items {
            [] => empty.to_string(),
            [single] => self.expr(single),
            items => {
                let separator = format!(" {keyword} ");
                let items = items.iter().map(|item| self.expr(item)).collect::<Vec<_>>();
                format!("({})", items.join(&separator))
            }
        }
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("{INDENT}{line}"))
        .join("\n")
}

/// Escapes labels, relationship types, property keys and aliases that are not plain identifiers.
pub fn escape(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    };

    if plain {
        name.to_string()
    } else {
        format!("`{}`", name.replace('`', "``"))
    }
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');

    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", u32::from(c))),
            c => out.push(c),
        }
    }

    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Call, Imports, Match, NodePattern, Pattern, Projection, RelationshipPattern};

    #[test]
    fn nested_call_with_collect() {
        let names = Names::new();
        let this = Variable::root();
        let rel = names.relationship();
        let actor = names.node();
        let result = names.plain();
        let title = names.param("X");

        let statement = Statement::new(vec![
            Match::new(NodePattern::new(this).labels(["Movie"]))
                .predicate(Some(this.property("title").equals(title)))
                .into(),
            Call::new(
                Imports::Variables(vec![this]),
                vec![
                    Match::new(Pattern::node(NodePattern::new(this)).related(
                        RelationshipPattern::new(Some(rel), "ACTED_IN", Direction::Incoming),
                        NodePattern::new(actor).labels(["Actor"]),
                    ))
                    .into(),
                    Clause::Return(Projection::new().item(Expr::from(actor).count(), result)),
                ],
            )
            .into(),
            Clause::Return(Projection::new().item(
                this.project(vec![
                    MapProjectionItem::Property("title".into()),
                    MapProjectionItem::Entry(
                        "actorsAggregate".into(),
                        Expr::Map(vec![("count".into(), result.into())]),
                    ),
                ]),
                this,
            )),
        ]);

        let (cypher, params) = statement.build(&names);

        insta::assert_snapshot!(cypher, @r###"
        MATCH (this:Movie)
        WHERE this.title = $param0
        CALL {
            WITH this
            MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)
            RETURN count(this1) AS var2
        }
        RETURN this { .title, actorsAggregate: { count: var2 } } AS this
        "###);

        assert_eq!(params.len(), 1);
        assert_eq!(params["param0"], Value::from("X"));
    }

    #[test]
    fn union_repeats_imports() {
        let names = Names::new();
        let this = Variable::root();
        let movie = names.node();
        let series = names.node();
        let out = names.plain();

        let branch = |node: Variable, label: &str| {
            vec![
                Match::new(NodePattern::new(node).labels([label])).into(),
                Clause::Return(Projection::new().item(node, out)),
            ]
        };

        let statement = Statement::new(vec![Call::new(
            Imports::Variables(vec![this]),
            vec![Clause::Union(vec![branch(movie, "Movie"), branch(series, "Series")])],
        )
        .into()]);

        let (cypher, _) = statement.build(&names);

        insta::assert_snapshot!(cypher, @r###"
        CALL {
            WITH this
            MATCH (this0:Movie)
            RETURN this0 AS var1
            UNION
            WITH this
            MATCH (this2:Series)
            RETURN this2 AS var1
        }
        "###);
    }

    #[test]
    fn shared_param_is_bound_once() {
        let names = Names::new();
        let a = names.node();
        let b = names.node();
        let value = names.param("shared");

        let statement = Statement::new(vec![Clause::Return(
            Projection::new()
                .bare(Expr::Or(vec![
                    a.property("name").equals(value),
                    b.property("name").equals(value),
                ])),
        )]);

        let (cypher, params) = statement.build(&names);

        assert_eq!(cypher, "RETURN (this0.name = $param0 OR this1.name = $param0)");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn raw_statements_substitute_arguments() {
        let names = Names::new();
        let limit = names.param(3);

        let statement = Statement::new(vec![Clause::Raw(Raw {
            statement: "MATCH (m:Movie) RETURN m LIMIT $limit // $other".into(),
            substitutions: vec![("limit".into(), limit.into())],
        })]);

        let (cypher, params) = statement.build(&names);

        assert_eq!(cypher, "MATCH (m:Movie) RETURN m LIMIT $param0 // $other");
        assert_eq!(params["param0"], Value::Integer(3));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape("Movie"), "Movie");
        assert_eq!(escape("My Label"), "`My Label`");
        assert_eq!(escape("a`b"), "`a``b`");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("a\r\n\tb"), r#""a\r\n\tb""#);
        assert_eq!(quote("bell\u{7}"), r#""bell\u0007""#);
    }
}
