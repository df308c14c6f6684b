//! Parsing of the operation document. Fragments are inlined, `@skip`/`@include` are applied and
//! variables are substituted, so the tree builder only ever sees plain fields with literal
//! arguments.

mod variables;

use cynic_parser::{
    common::OperationType,
    executable::{Directive, ExecutableDocument, OperationDefinition, Selection},
    Value,
};
use indexmap::IndexMap;

use crate::{InputValue, TranslationError};

use variables::Variables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperationKind {
    Query,
    Mutation,
}

#[derive(Debug)]
pub(crate) struct BoundOperation {
    pub kind: OperationKind,
    pub fields: Vec<BoundField>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundField {
    pub response_key: String,
    pub name: String,
    pub arguments: IndexMap<String, InputValue>,
    /// Type condition of the fragment this field was selected through.
    pub type_condition: Option<String>,
    pub selection_set: Vec<BoundField>,
}

impl BoundField {
    pub fn argument(&self, name: &str) -> Option<&InputValue> {
        self.arguments.get(name)
    }

    /// First selected subfield of the given name, whatever its type condition.
    pub fn subfield(&self, name: &str) -> Option<&BoundField> {
        self.selection_set.iter().find(|field| field.name == name)
    }

    /// Subfields selected for a concrete type. `applies` decides whether a type condition
    /// matches the type: its own name, one of its interfaces or a union it belongs to.
    pub fn fields_for<'a>(&'a self, applies: impl Fn(&str) -> bool + 'a) -> impl Iterator<Item = &'a BoundField> + 'a {
        self.selection_set
            .iter()
            .filter(move |field| field.type_condition.as_deref().map_or(true, &applies))
    }
}

pub(crate) fn bind(
    query: &str,
    operation_name: Option<&str>,
    variables: &serde_json::Map<String, serde_json::Value>,
) -> Result<BoundOperation, TranslationError> {
    let document =
        cynic_parser::parse_executable_document(query).map_err(|err| TranslationError::Parse(err.to_string()))?;

    let operation = select_operation(&document, operation_name)?;

    let kind = match operation.operation_type() {
        OperationType::Query => OperationKind::Query,
        OperationType::Mutation => OperationKind::Mutation,
        OperationType::Subscription => return Err(TranslationError::Subscription),
    };

    let mut binder = Binder {
        variables: Variables::coerce(operation, variables)?,
        fragments: Vec::new(),
    };

    let mut fields = Vec::new();
    binder.selection_set(operation.selection_set(), None, &mut fields)?;

    Ok(BoundOperation { kind, fields })
}

fn select_operation<'a>(
    document: &'a ExecutableDocument,
    name: Option<&str>,
) -> Result<OperationDefinition<'a>, TranslationError> {
    if let Some(name) = name {
        return document
            .operations()
            .find(|operation| operation.name() == Some(name))
            .ok_or_else(|| TranslationError::UnknownOperation(name.to_string()));
    }

    let mut operations = document.operations();
    let operation = operations.next().ok_or(TranslationError::NoOperation)?;

    if operations.next().is_some() {
        return Err(TranslationError::MissingOperationName);
    }

    Ok(operation)
}

struct Binder {
    variables: Variables,
    /// Fragments being inlined, to detect spreads cycles.
    fragments: Vec<String>,
}

impl Binder {
    fn selection_set<'doc>(
        &mut self,
        selections: impl IntoIterator<Item = Selection<'doc>>,
        type_condition: Option<&str>,
        out: &mut Vec<BoundField>,
    ) -> Result<(), TranslationError> {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    if !self.is_included(field.directives())? {
                        continue;
                    }

                    let mut arguments = IndexMap::new();
                    for argument in field.arguments() {
                        if let Some(value) = self.variables.resolve(argument.value())? {
                            arguments.insert(argument.name().to_string(), value);
                        }
                    }

                    let mut selection_set = Vec::new();
                    self.selection_set(field.selection_set(), None, &mut selection_set)?;

                    merge(
                        out,
                        BoundField {
                            response_key: field.alias().unwrap_or(field.name()).to_string(),
                            name: field.name().to_string(),
                            arguments,
                            type_condition: type_condition.map(str::to_string),
                            selection_set,
                        },
                    );
                }
                Selection::InlineFragment(fragment) => {
                    if !self.is_included(fragment.directives())? {
                        continue;
                    }

                    let condition = fragment.type_condition().or(type_condition);
                    self.selection_set(fragment.selection_set(), condition, out)?;
                }
                Selection::FragmentSpread(spread) => {
                    if !self.is_included(spread.directives())? {
                        continue;
                    }

                    let name = spread.fragment_name();
                    let fragment = spread
                        .fragment()
                        .ok_or_else(|| TranslationError::UnknownFragment(name.to_string()))?;

                    if self.fragments.iter().any(|in_progress| in_progress == name) {
                        return Err(TranslationError::FragmentCycle(name.to_string()));
                    }

                    self.fragments.push(name.to_string());
                    self.selection_set(fragment.selection_set(), Some(fragment.type_condition()), out)?;
                    self.fragments.pop();
                }
            }
        }

        Ok(())
    }

    /// `@skip(if:)` and `@include(if:)`
    fn is_included<'doc>(&self, directives: impl IntoIterator<Item = Directive<'doc>>) -> Result<bool, TranslationError> {
        for directive in directives {
            let skip_when = match directive.name() {
                "skip" => true,
                "include" => false,
                _ => continue,
            };

            let condition = directive
                .arguments()
                .find(|argument| argument.name() == "if")
                .map(|argument| self.condition(argument.value()))
                .transpose()?
                .unwrap_or(!skip_when);

            if condition == skip_when {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn condition(&self, value: Value<'_>) -> Result<bool, TranslationError> {
        match self.variables.resolve(value)? {
            Some(InputValue::Boolean(condition)) => Ok(condition),
            _ => Err(TranslationError::invalid_value("if", "expected a Boolean")),
        }
    }
}

/// Fields sharing a response key and a type condition are selected once, with their
/// selection sets merged.
fn merge(fields: &mut Vec<BoundField>, field: BoundField) {
    let existing = fields
        .iter_mut()
        .find(|existing| existing.response_key == field.response_key && existing.type_condition == field.type_condition);

    match existing {
        Some(existing) => {
            for subfield in field.selection_set {
                merge(&mut existing.selection_set, subfield);
            }
        }
        None => fields.push(field),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn bind_query(query: &str, variables: serde_json::Value) -> Result<BoundOperation, TranslationError> {
        let serde_json::Value::Object(variables) = variables else {
            unreachable!()
        };

        bind(query, None, &variables)
    }

    #[test]
    fn fragments_are_inlined() {
        let operation = bind_query(
            r#"
            query {
                productions {
                    title
                    ... on Movie { runtime }
                    ...SeriesFields
                }
            }

            fragment SeriesFields on Series { episodes }
            "#,
            json!({}),
        )
        .unwrap();

        let productions = &operation.fields[0];
        let fields: Vec<_> = productions
            .selection_set
            .iter()
            .map(|field| (field.name.as_str(), field.type_condition.as_deref()))
            .collect();

        assert_eq!(
            fields,
            [("title", None), ("runtime", Some("Movie")), ("episodes", Some("Series"))]
        );

        let movie_fields: Vec<_> = productions
            .fields_for(|condition| condition == "Movie")
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(movie_fields, ["title", "runtime"]);
    }

    #[test]
    fn variables_and_aliases() {
        let operation = bind_query(
            r#"
            query Movies($title: String, $limit: Int = 3, $missing: String) {
                films: movies(where: { title: $title, tagline: $missing }, options: { limit: $limit }) {
                    name: title
                }
            }
            "#,
            json!({ "title": "X" }),
        )
        .unwrap();

        let movies = &operation.fields[0];
        assert_eq!(movies.response_key, "films");
        assert_eq!(movies.name, "movies");
        assert_eq!(
            movies.argument("where"),
            Some(&InputValue::Object(
                [("title".to_string(), InputValue::String("X".into()))].into_iter().collect()
            ))
        );
        assert_eq!(
            movies.argument("options").and_then(|options| options.get("limit")),
            Some(&InputValue::Int(3))
        );
        assert_eq!(movies.selection_set[0].response_key, "name");
    }

    #[test]
    fn skip_and_include() {
        let operation = bind_query(
            r#"
            query($withTitle: Boolean!) {
                movies {
                    title @include(if: $withTitle)
                    tagline @skip(if: true)
                    released
                }
            }
            "#,
            json!({ "withTitle": false }),
        )
        .unwrap();

        let names: Vec<_> = operation.fields[0]
            .selection_set
            .iter()
            .map(|field| field.name.as_str())
            .collect();
        assert_eq!(names, ["released"]);
    }

    #[test]
    fn duplicate_fields_are_merged() {
        let operation = bind_query("{ movies { title } movies { released } }", json!({})).unwrap();

        assert_eq!(operation.fields.len(), 1);
        assert_eq!(operation.fields[0].selection_set.len(), 2);
    }

    #[test]
    fn errors() {
        let missing = bind_query("query($title: String!) { movies(where: { title: $title }) { title } }", json!({}));
        assert_eq!(
            missing.unwrap_err(),
            TranslationError::MissingVariable {
                name: "title".into(),
                ty: "String!".into()
            }
        );

        let undefined = bind_query("{ movies(where: { title: $title }) { title } }", json!({}));
        assert_eq!(undefined.unwrap_err(), TranslationError::UndefinedVariable("title".into()));

        let several = bind_query("query A { movies { title } } query B { movies { title } }", json!({}));
        assert_eq!(several.unwrap_err(), TranslationError::MissingOperationName);

        let cycle = bind_query("{ movies { ...A } } fragment A on Movie { ...A }", json!({}));
        assert_eq!(cycle.unwrap_err(), TranslationError::FragmentCycle("A".into()));

        assert!(matches!(bind_query("{ movies {", json!({})), Err(TranslationError::Parse(_))));
        assert_eq!(
            bind_query("subscription { movies { title } }", json!({})).unwrap_err(),
            TranslationError::Subscription
        );
    }
}
