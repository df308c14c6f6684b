use cynic_parser::type_system as ast;

use super::super::{sdl::*, SchemaBuilder, SchemaErrorKind};
use crate::*;

const MUTATION_OPERATIONS: ResolverOperations = ResolverOperations::CREATE
    .union(ResolverOperations::UPDATE)
    .union(ResolverOperations::DELETE);

impl SchemaBuilder {
    /// Directives of object, interface and union types. `@plural` goes first as the default
    /// index query names derive from it.
    pub(in crate::builder) fn ingest_type_level_directives(
        &mut self,
        type_id: TypeDefinitionId,
        directives: &[ast::Directive<'_>],
    ) {
        let name = self.schema[type_id].name.clone();
        let kind = self.schema[type_id].kind;

        if !matches!(kind, TypeKind::Node | TypeKind::Interface | TypeKind::Union) {
            return;
        }

        if let Some(directive) = find_directive(directives.iter().copied(), "plural") {
            match directive_arguments(directive).get("value").and_then(|value| value.as_str()) {
                Some(value) if !value.is_empty() => self.schema[type_id].plural = root_plural(&name, Some(value)),
                _ => self.error(
                    [name.as_str(), "@plural", "value"],
                    SchemaErrorKind::InvalidDirective {
                        directive: "plural",
                        message: "`value` must be a non-empty string".to_string(),
                    },
                ),
            }
        }

        for directive in directives {
            match directive.name() {
                "node" if kind == TypeKind::Node => self.ingest_node_labels(type_id, &name, *directive),
                "limit" if kind != TypeKind::Union => {
                    self.schema[type_id].limit = self.ingest_limit(&name, *directive);
                }
                "exclude" => self.ingest_exclude(type_id, &name, *directive),
                "query" => {
                    let arguments = directive_arguments(*directive);
                    let read = arguments.get("read").and_then(|value| value.as_bool()).unwrap_or(true);
                    let aggregate = arguments
                        .get("aggregate")
                        .and_then(|value| value.as_bool())
                        .unwrap_or(false);

                    let operations = &mut self.schema[type_id].operations;
                    operations.set(ResolverOperations::READ, read);
                    operations.set(ResolverOperations::AGGREGATE, aggregate);
                }
                "mutation" => self.ingest_mutation_operations(type_id, &name, *directive),
                "fulltext" if kind == TypeKind::Node => self.ingest_fulltext(type_id, &name, *directive),
                "vector" if kind == TypeKind::Node => self.ingest_vector(type_id, &name, *directive),
                "authorization" if kind == TypeKind::Node => {
                    let rules = self.ingest_authorization(type_id, &[name.as_str()], *directive);
                    self.schema[type_id].authorization = rules;
                }
                "authentication" if kind == TypeKind::Node => {
                    let rule = self.ingest_authentication(&[name.as_str()], *directive);
                    self.schema[type_id].authentication = rule;
                }
                _ => {}
            }
        }
    }

    /// `@node(labels: [String!])`, the first label is the main one.
    fn ingest_node_labels(&mut self, type_id: TypeDefinitionId, name: &str, directive: ast::Directive<'_>) {
        let Some(value) = directive_arguments(directive).remove("labels") else {
            return;
        };

        match string_list(&value) {
            Some(labels) if !labels.is_empty() && labels.iter().all(|label| !label.is_empty()) => {
                self.schema[type_id].labels = labels.iter().map(|label| LabelExpression::parse(label)).collect();
            }
            _ => self.error(
                [name, "@node", "labels"],
                SchemaErrorKind::InvalidDirective {
                    directive: "node",
                    message: "`labels` must be a non-empty list of non-empty strings".to_string(),
                },
            ),
        }
    }

    /// `@limit(default: Int, max: Int)`, both strictly positive with `default <= max`.
    fn ingest_limit(&mut self, name: &str, directive: ast::Directive<'_>) -> Option<LimitDirective> {
        let arguments = directive_arguments(directive);
        let mut limit = LimitDirective::default();
        let mut valid = true;

        for (argument, target) in [("default", &mut limit.default), ("max", &mut limit.max)] {
            let Some(value) = arguments.get(argument).filter(|value| !value.is_null()) else {
                continue;
            };

            match value.as_i64() {
                Some(bound) if bound > 0 => match u32::try_from(bound) {
                    Ok(bound) => *target = Some(bound),
                    Err(_) => {
                        self.error(
                            [name, "@limit", argument],
                            SchemaErrorKind::InvalidLimit(format!("{argument} is {bound}, it must be at most {}", u32::MAX)),
                        );
                        valid = false;
                    }
                },
                Some(bound) => {
                    self.error(
                        [name, "@limit", argument],
                        SchemaErrorKind::InvalidLimit(format!("{argument} is {bound}, it must be greater than 0")),
                    );
                    valid = false;
                }
                None => {
                    self.error(
                        [name, "@limit", argument],
                        SchemaErrorKind::InvalidLimit(format!("{argument} is {value}, it must be an integer")),
                    );
                    valid = false;
                }
            }
        }

        if let (Some(default), Some(max)) = (limit.default, limit.max) {
            if default > max {
                self.error(
                    [name, "@limit"],
                    SchemaErrorKind::InvalidLimit(format!("default {default} is greater than max {max}")),
                );
                valid = false;
            }
        }

        valid.then_some(limit)
    }

    /// `@exclude(operations: [CREATE, READ, UPDATE, DELETE])`, everything without arguments or
    /// with `"*"`. Excluding reads also excludes aggregations.
    fn ingest_exclude(&mut self, type_id: TypeDefinitionId, name: &str, directive: ast::Directive<'_>) {
        let names = match directive_arguments(directive).get("operations") {
            None => vec!["*".to_string()],
            Some(value) => string_list(value).unwrap_or_default(),
        };

        let mut excluded = ResolverOperations::empty();

        for operation in names {
            match operation.as_str() {
                "*" => excluded = ResolverOperations::all(),
                "READ" => excluded |= ResolverOperations::READ | ResolverOperations::AGGREGATE,
                "CREATE" | "UPDATE" | "DELETE" => {
                    excluded |= ResolverOperations::from_name(&operation).unwrap_or(ResolverOperations::empty());
                }
                _ => self.error(
                    [name, "@exclude", "operations"],
                    SchemaErrorKind::InvalidOperation {
                        directive: "exclude",
                        value: operation,
                    },
                ),
            }
        }

        self.schema[type_id].operations.remove(excluded);
    }

    /// `@mutation(operations: [CREATE, UPDATE, DELETE])`
    fn ingest_mutation_operations(&mut self, type_id: TypeDefinitionId, name: &str, directive: ast::Directive<'_>) {
        let Some(value) = directive_arguments(directive).remove("operations") else {
            return;
        };

        let mut operations = ResolverOperations::empty();

        for operation in string_list(&value).unwrap_or_default() {
            match ResolverOperations::from_name(&operation).filter(|op| MUTATION_OPERATIONS.contains(*op)) {
                Some(op) => operations |= op,
                None => self.error(
                    [name, "@mutation", "operations"],
                    SchemaErrorKind::InvalidOperation {
                        directive: "mutation",
                        value: operation,
                    },
                ),
            }
        }

        let current = &mut self.schema[type_id].operations;
        current.remove(MUTATION_OPERATIONS);
        current.insert(operations);
    }
}
