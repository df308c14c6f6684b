use cynic_parser::type_system as ast;
use inflector::Inflector;
use serde_json::Value;

use super::super::{sdl::*, SchemaBuilder, SchemaErrorKind};
use crate::*;

impl SchemaBuilder {
    /// `@fulltext(indexes: [{ indexName: String!, queryName: String, fields: [String!]! }])`
    pub(in crate::builder) fn ingest_fulltext(&mut self, type_id: TypeDefinitionId, name: &str, directive: ast::Directive<'_>) {
        for (position, index) in indexes(&directive_arguments(directive)).iter().enumerate() {
            let location = format!("indexes[{position}]");

            match self.parse_fulltext_index(type_id, index) {
                Ok(index) => self.schema[type_id].fulltext_indexes.push(index),
                Err(message) => self.error(
                    [name, "@fulltext", location.as_str()],
                    SchemaErrorKind::InvalidDirective {
                        directive: "fulltext",
                        message,
                    },
                ),
            }
        }
    }

    /// `@vector(indexes: [{ indexName: String!, embeddingProperty: String!, queryName: String! }])`
    pub(in crate::builder) fn ingest_vector(&mut self, type_id: TypeDefinitionId, name: &str, directive: ast::Directive<'_>) {
        for (position, index) in indexes(&directive_arguments(directive)).iter().enumerate() {
            let location = format!("indexes[{position}]");

            let parsed = required_string(index, "indexName").and_then(|index_name| {
                Ok(VectorIndex {
                    index_name,
                    query_name: required_string(index, "queryName")?,
                    embedding_property: required_string(index, "embeddingProperty")?,
                })
            });

            match parsed {
                Ok(index) => self.schema[type_id].vector_indexes.push(index),
                Err(message) => self.error(
                    [name, "@vector", location.as_str()],
                    SchemaErrorKind::InvalidDirective {
                        directive: "vector",
                        message,
                    },
                ),
            }
        }
    }

    fn parse_fulltext_index(&self, type_id: TypeDefinitionId, index: &Value) -> Result<FulltextIndex, String> {
        let ty = self.schema.walk(type_id);
        let index_name = required_string(index, "indexName")?;

        let query_name = match index.get("queryName").and_then(Value::as_str) {
            Some(query_name) => query_name.to_string(),
            None => format!("{}Fulltext{}", ty.plural, index_name.to_pascal_case()),
        };

        let field_names = index
            .get("fields")
            .and_then(string_list)
            .filter(|fields| !fields.is_empty())
            .ok_or("`fields` must be a non-empty list of field names")?;

        let field_ids = field_names
            .iter()
            .map(|field_name| {
                ty.field_by_name(field_name)
                    .filter(|field| matches!(field.scalar_type(), Some(ScalarType::String | ScalarType::Id)) && field.is_property())
                    .map(|field| field.id())
                    .ok_or_else(|| format!("`{field_name}` is not a String field of `{}`", ty.name()))
            })
            .collect::<Result<_, _>>()?;

        Ok(FulltextIndex {
            index_name,
            query_name,
            field_ids,
        })
    }
}

fn indexes(arguments: &Arguments) -> Vec<Value> {
    match arguments.get("indexes") {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(_)) => arguments.get("indexes").cloned().into_iter().collect(),
        _ => Vec::new(),
    }
}

fn required_string(index: &Value, key: &str) -> Result<String, String> {
    index
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("`{key}` must be a non-empty string"))
}
