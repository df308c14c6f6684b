use cynic_parser::type_system as ast;
use cynic_parser_deser::{ConstDeserializer as _, ValueDeserialize};

use super::super::{sdl::*, SchemaBuilder, SchemaErrorKind};
use crate::*;

#[derive(ValueDeserialize)]
struct CypherDirective<'a> {
    statement: &'a str,
    #[deser(rename = "columnName")]
    column_name: &'a str,
}

#[derive(ValueDeserialize)]
struct AliasDirective<'a> {
    property: &'a str,
}

impl SchemaBuilder {
    /// `@cypher(statement: String!, columnName: String!)`
    pub(in crate::builder) fn ingest_custom_statement(
        &mut self,
        field_id: FieldDefinitionId,
        parent_name: &str,
        field_name: &str,
        directive: ast::Directive<'_>,
    ) -> Option<CustomStatementId> {
        let cypher = match directive.deserialize::<CypherDirective<'_>>() {
            Ok(cypher) => cypher,
            Err(err) => {
                self.error(
                    [parent_name, field_name, "@cypher"],
                    SchemaErrorKind::InvalidDirective {
                        directive: "cypher",
                        message: err.to_string(),
                    },
                );
                return None;
            }
        };

        if cypher.statement.trim().is_empty() {
            self.error(
                [parent_name, field_name, "@cypher", "statement"],
                SchemaErrorKind::InvalidDirective {
                    directive: "cypher",
                    message: "the statement cannot be empty".to_string(),
                },
            );
            return None;
        }

        let id = CustomStatementId::from(self.schema.custom_statements.len());
        self.schema.custom_statements.push(CustomStatementRecord {
            field_id,
            statement: cypher.statement.to_string(),
            column_name: cypher.column_name.to_string(),
        });

        Some(id)
    }

    /// `@alias`, `@id`, `@unique`, `@default`, `@populatedBy` and `@timestamp`.
    pub(in crate::builder) fn ingest_field_directives(
        &mut self,
        field: &mut FieldDefinitionRecord,
        parent_name: &str,
        directives: &[ast::Directive<'_>],
    ) {
        let property = matches!(field.kind, FieldKind::Scalar(_) | FieldKind::Enum | FieldKind::CustomScalar);

        for directive in directives {
            let name = directive.name();
            let path = [parent_name, field.name.as_str(), name];

            match name {
                "alias" => match directive.deserialize::<AliasDirective<'_>>() {
                    Ok(alias) if property => field.database_name = alias.property.to_string(),
                    Ok(_) => self.error(
                        path,
                        SchemaErrorKind::InvalidDirective {
                            directive: "alias",
                            message: "only stored properties can be aliased".to_string(),
                        },
                    ),
                    Err(err) => self.error(
                        path,
                        SchemaErrorKind::InvalidDirective {
                            directive: "alias",
                            message: err.to_string(),
                        },
                    ),
                },
                "id" => {
                    if field.kind != FieldKind::Scalar(ScalarType::Id) {
                        self.error(
                            path,
                            SchemaErrorKind::InvalidDirective {
                                directive: "id",
                                message: "only fields of type ID can be identifiers".to_string(),
                            },
                        );
                        continue;
                    }

                    let autogenerate = directive_arguments(*directive)
                        .get("autogenerate")
                        .and_then(|value| value.as_bool())
                        .unwrap_or(true);

                    field.id = Some(IdDirective { autogenerate });
                }
                "unique" => field.unique = true,
                "default" => match directive_arguments(*directive).remove("value") {
                    Some(value) if property => field.default = Some(value),
                    _ => self.error(
                        path,
                        SchemaErrorKind::InvalidDirective {
                            directive: "default",
                            message: "a `value` is required on a stored property".to_string(),
                        },
                    ),
                },
                "populatedBy" => {
                    let arguments = directive_arguments(*directive);
                    let Some(callback) = arguments.get("callback").and_then(|value| value.as_str()) else {
                        self.error(
                            path,
                            SchemaErrorKind::InvalidDirective {
                                directive: "populatedBy",
                                message: "`callback` must be a string".to_string(),
                            },
                        );
                        continue;
                    };

                    let operations = self.callback_operations(&arguments, "populatedBy", path);
                    field.populated_by = Some(PopulatedBy {
                        callback: callback.to_string(),
                        operations,
                    });
                }
                "timestamp" => {
                    let temporal = matches!(
                        field.kind,
                        FieldKind::Scalar(
                            ScalarType::DateTime | ScalarType::LocalDateTime | ScalarType::Time | ScalarType::LocalTime
                        )
                    );

                    if !temporal {
                        self.error(
                            path,
                            SchemaErrorKind::InvalidDirective {
                                directive: "timestamp",
                                message: "only DateTime, LocalDateTime, Time and LocalTime fields can be timestamps"
                                    .to_string(),
                            },
                        );
                        continue;
                    }

                    let arguments = directive_arguments(*directive);
                    field.timestamp = Some(self.callback_operations(&arguments, "timestamp", path));
                }
                _ => {}
            }
        }

        if field.id.is_some() && field.default.is_some() {
            self.error(
                [parent_name, field.name.as_str(), "default"],
                SchemaErrorKind::InvalidDirective {
                    directive: "default",
                    message: "identifiers cannot have a default value".to_string(),
                },
            );
        }
    }

    fn callback_operations(&mut self, arguments: &Arguments, directive: &'static str, path: [&str; 3]) -> CallbackOperations {
        let Some(value) = arguments.get("operations") else {
            return CallbackOperations::default();
        };

        let mut operations = CallbackOperations::empty();

        for name in string_list(value).unwrap_or_default() {
            match CallbackOperations::from_name(&name) {
                Some(operation) => operations |= operation,
                None => self.error(path, SchemaErrorKind::InvalidOperation { directive, value: name }),
            }
        }

        operations
    }
}
