use cynic_parser::type_system as ast;

use super::super::{sdl::*, SchemaBuilder, SchemaErrorKind};
use crate::*;

impl SchemaBuilder {
    /// `@relationship(type: String!, direction: IN | OUT, properties: String, queryDirection: ...,
    /// nestedOperations: [...], aggregate: Boolean = true)`
    pub(in crate::builder) fn ingest_relationship(
        &mut self,
        field_id: FieldDefinitionId,
        parent_id: TypeDefinitionId,
        field_name: &str,
        ty: &FieldType,
        directive: ast::Directive<'_>,
    ) -> Option<RelationshipId> {
        let parent_name = self.schema[parent_id].name.clone();
        let path = |argument: &str| vec![parent_name.clone(), field_name.to_string(), "@relationship".to_string(), argument.to_string()];
        let arguments = directive_arguments(directive);
        let mut valid = true;

        let target_id = match self.schema.type_by_name.get(&ty.name).copied() {
            Some(id) if matches!(self.schema[id].kind, TypeKind::Node | TypeKind::Interface | TypeKind::Union) => Some(id),
            Some(_) => {
                self.error(
                    [parent_name.as_str(), field_name],
                    SchemaErrorKind::UnsupportedType(format!("`{}` cannot be the target of a relationship", ty.name)),
                );
                None
            }
            None => {
                self.error([parent_name.as_str(), field_name], SchemaErrorKind::UnknownType(ty.name.clone()));
                None
            }
        };

        let relationship_type = match arguments.get("type").and_then(|value| value.as_str()) {
            Some(relationship_type) if !relationship_type.is_empty() => Some(relationship_type.to_string()),
            _ => {
                self.error(
                    path("type"),
                    SchemaErrorKind::InvalidDirective {
                        directive: "relationship",
                        message: "`type` must be a non-empty string".to_string(),
                    },
                );
                None
            }
        };

        let direction = match arguments
            .get("direction")
            .and_then(|value| value.as_str())
            .and_then(|direction| direction.parse::<RelationshipDirection>().ok())
        {
            Some(direction) => Some(direction),
            None => {
                self.error(
                    path("direction"),
                    SchemaErrorKind::InvalidDirective {
                        directive: "relationship",
                        message: "`direction` must be IN or OUT".to_string(),
                    },
                );
                None
            }
        };

        let query_direction = match arguments.get("queryDirection").and_then(|value| value.as_str()) {
            None => QueryDirection::default(),
            Some(value) => match value.parse::<QueryDirection>() {
                Ok(query_direction) => query_direction,
                Err(_) => {
                    self.error(
                        path("queryDirection"),
                        SchemaErrorKind::InvalidOperation {
                            directive: "relationship",
                            value: value.to_string(),
                        },
                    );
                    valid = false;
                    QueryDirection::default()
                }
            },
        };

        let properties_id = match arguments.get("properties").and_then(|value| value.as_str()) {
            None => None,
            Some(properties) => match self.schema.type_by_name.get(properties).copied() {
                Some(id) if self.schema[id].kind == TypeKind::RelationshipProperties => Some(id),
                Some(_) => {
                    self.error(
                        path("properties"),
                        SchemaErrorKind::MissingRelationshipProperties(properties.to_string()),
                    );
                    valid = false;
                    None
                }
                None => {
                    self.error(path("properties"), SchemaErrorKind::UnknownType(properties.to_string()));
                    valid = false;
                    None
                }
            },
        };

        let nested_operations = match arguments.get("nestedOperations") {
            None => NestedOperations::default(),
            Some(value) => {
                let mut operations = NestedOperations::empty();

                for name in string_list(value).unwrap_or_default() {
                    match NestedOperations::from_name(&name) {
                        Some(operation) => operations |= operation,
                        None => {
                            self.error(
                                path("nestedOperations"),
                                SchemaErrorKind::InvalidOperation {
                                    directive: "relationship",
                                    value: name,
                                },
                            );
                            valid = false;
                        }
                    }
                }

                operations
            }
        };

        let aggregate = arguments
            .get("aggregate")
            .and_then(|value| value.as_bool())
            .unwrap_or(true);

        let (Some(target_id), Some(ty_name), Some(direction)) = (target_id, relationship_type, direction) else {
            return None;
        };

        if !valid {
            return None;
        }

        let id = RelationshipId::from(self.schema.relationships.len());
        self.schema.relationships.push(RelationshipRecord {
            field_id,
            ty: ty_name,
            direction,
            query_direction,
            cardinality: if ty.list { Cardinality::Many } else { Cardinality::One },
            target_id,
            properties_id,
            nested_operations,
            aggregate,
            aggregable: false,
        });

        Some(id)
    }
}
