//! Turns the rows returned by the store into the `data` value of a root field.
//!
//! Statements already project their maps under the response keys, shaping only adds what the
//! store cannot compute: relay cursors and page info, `__typename` of the connection and
//! mutation wrappers, and mutation counters.

use base64::{engine::general_purpose, Engine as _};
use serde_json::{Map, Value};

use crate::{Counters, Row};

/// Name of the single column returned by every statement.
pub(crate) const COLUMN: &str = "this";

const CURSOR_PREFIX: &str = "arrayconnection:";

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Returned as is.
    Value,
    /// Only the listed keys are kept, in this order. Keys absent from the value are skipped,
    /// branches of an abstract selection only project their own fields.
    Object(Vec<(String, Shape)>),
    List(Box<Shape>),
    Connection(Box<ConnectionShape>),
    /// One item per row.
    Rows(Box<Shape>),
    /// The first row, `null` without any.
    FirstRow(Box<Shape>),
    Mutation(Vec<(String, MutationField)>),
    /// Counters of a deletion.
    Info(Vec<(String, InfoField)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionShape {
    /// Position of the first edge in the whole result, decoded from `after`.
    pub offset: usize,
    pub fields: Vec<(String, ConnectionField)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionField {
    TotalCount,
    Edges(Vec<(String, EdgeField)>),
    PageInfo(Vec<(String, PageInfoField)>),
    Typename(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EdgeField {
    Cursor,
    Node(Shape),
    Properties(Shape),
    Score,
    Typename(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageInfoField {
    HasNextPage,
    HasPreviousPage,
    StartCursor,
    EndCursor,
    Typename,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationField {
    Nodes(Shape),
    Info(Vec<(String, InfoField)>),
    Typename(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfoField {
    NodesCreated,
    NodesDeleted,
    RelationshipsCreated,
    RelationshipsDeleted,
    Typename(String),
}

pub fn encode_cursor(index: usize) -> String {
    general_purpose::STANDARD.encode(format!("{CURSOR_PREFIX}{index}"))
}

/// The position encoded in a cursor, `None` if it was not produced by [`encode_cursor`].
pub fn decode_cursor(cursor: &str) -> Option<usize> {
    let bytes = general_purpose::STANDARD.decode(cursor).ok()?;
    let text = String::from_utf8(bytes).ok()?;

    text.strip_prefix(CURSOR_PREFIX)?.parse().ok()
}

impl Shape {
    /// The response of a root field from the rows of its program.
    pub fn to_response(&self, rows: &[Row], counters: &Counters) -> Value {
        let first = || rows.first().and_then(|row| row.get(COLUMN)).unwrap_or(&Value::Null);

        match self {
            Shape::Rows(inner) => Value::Array(
                rows.iter()
                    .map(|row| inner.apply(row.get(COLUMN).unwrap_or(&Value::Null)))
                    .collect(),
            ),
            Shape::FirstRow(inner) => inner.apply(first()),
            Shape::Mutation(fields) => {
                let mut out = Map::new();

                for (key, field) in fields {
                    let value = match field {
                        MutationField::Nodes(shape) => match first() {
                            Value::Array(items) => Value::Array(items.iter().map(|item| shape.apply(item)).collect()),
                            _ => Value::Array(Vec::new()),
                        },
                        MutationField::Info(fields) => info(fields, counters),
                        MutationField::Typename(name) => Value::String(name.clone()),
                    };

                    out.insert(key.clone(), value);
                }

                Value::Object(out)
            }
            Shape::Info(fields) => info(fields, counters),
            other => other.apply(first()),
        }
    }

    fn apply(&self, value: &Value) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (Shape::Object(fields), Value::Object(map)) => {
                let mut out = Map::new();

                for (key, shape) in fields {
                    if let Some(value) = map.get(key) {
                        out.insert(key.clone(), shape.apply(value));
                    }
                }

                Value::Object(out)
            }
            (Shape::List(inner), Value::Array(items)) => Value::Array(items.iter().map(|item| inner.apply(item)).collect()),
            (Shape::List(inner), single) => inner.apply(single),
            (Shape::Connection(connection), Value::Object(map)) => connection.apply(map),
            _ => value.clone(),
        }
    }
}

impl ConnectionShape {
    fn apply(&self, value: &Map<String, Value>) -> Value {
        let empty = Vec::new();
        let edges = value.get("edges").and_then(Value::as_array).unwrap_or(&empty);
        let total_count = value.get("totalCount").and_then(Value::as_u64).unwrap_or_default() as usize;

        let mut out = Map::new();

        for (key, field) in &self.fields {
            let value = match field {
                ConnectionField::TotalCount => Value::from(total_count),
                ConnectionField::Edges(fields) => Value::Array(
                    edges
                        .iter()
                        .enumerate()
                        .map(|(index, edge)| self.edge(fields, self.offset + index, edge))
                        .collect(),
                ),
                ConnectionField::PageInfo(fields) => self.page_info(fields, edges.len(), total_count),
                ConnectionField::Typename(name) => Value::String(name.clone()),
            };

            out.insert(key.clone(), value);
        }

        Value::Object(out)
    }

    fn edge(&self, fields: &[(String, EdgeField)], index: usize, edge: &Value) -> Value {
        let mut out = Map::new();

        for (key, field) in fields {
            let value = match field {
                EdgeField::Cursor => Value::String(encode_cursor(index)),
                EdgeField::Node(shape) => shape.apply(edge.get("node").unwrap_or(&Value::Null)),
                EdgeField::Properties(shape) => shape.apply(edge.get("properties").unwrap_or(&Value::Null)),
                EdgeField::Score => edge.get("score").cloned().unwrap_or(Value::Null),
                EdgeField::Typename(name) => Value::String(name.clone()),
            };

            out.insert(key.clone(), value);
        }

        Value::Object(out)
    }

    fn page_info(&self, fields: &[(String, PageInfoField)], edges: usize, total_count: usize) -> Value {
        let mut out = Map::new();

        let cursor = |index: usize| {
            if edges == 0 {
                Value::Null
            } else {
                Value::String(encode_cursor(index))
            }
        };

        for (key, field) in fields {
            let value = match field {
                PageInfoField::HasNextPage => Value::Bool(self.offset + edges < total_count),
                PageInfoField::HasPreviousPage => Value::Bool(self.offset > 0),
                PageInfoField::StartCursor => cursor(self.offset),
                PageInfoField::EndCursor => cursor(self.offset + edges.saturating_sub(1)),
                PageInfoField::Typename => Value::String("PageInfo".to_string()),
            };

            out.insert(key.clone(), value);
        }

        Value::Object(out)
    }
}

fn info(fields: &[(String, InfoField)], counters: &Counters) -> Value {
    let mut out = Map::new();

    for (key, field) in fields {
        let value = match field {
            InfoField::NodesCreated => Value::from(counters.nodes_created),
            InfoField::NodesDeleted => Value::from(counters.nodes_deleted),
            InfoField::RelationshipsCreated => Value::from(counters.relationships_created),
            InfoField::RelationshipsDeleted => Value::from(counters.relationships_deleted),
            InfoField::Typename(name) => Value::String(name.clone()),
        };

        out.insert(key.clone(), value);
    }

    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values
            .into_iter()
            .map(|value| {
                let mut row = Row::new();
                row.insert(COLUMN.to_string(), value);
                row
            })
            .collect()
    }

    #[test]
    fn cursors() {
        assert_eq!(encode_cursor(0), "YXJyYXljb25uZWN0aW9uOjA=");
        assert_eq!(decode_cursor(&encode_cursor(41)), Some(41));
        assert_eq!(decode_cursor("not a cursor"), None);
        assert_eq!(decode_cursor("Zm9vOjE="), None);
    }

    #[test]
    fn abstract_objects_keep_their_own_keys() {
        let shape = Shape::Rows(Box::new(Shape::Object(vec![
            ("__typename".into(), Shape::Value),
            ("title".into(), Shape::Value),
            ("episodes".into(), Shape::Value),
        ])));

        let response = shape.to_response(
            &rows(vec![
                json!({ "__resolveType": "Movie", "__typename": "Movie", "title": "Heat" }),
                json!({ "__resolveType": "Series", "__typename": "Series", "episodes": 10, "_sort_title": "Dark" }),
            ]),
            &Counters::default(),
        );

        insta::assert_json_snapshot!(response, @r###"
        [
          {
            "__typename": "Movie",
            "title": "Heat"
          },
          {
            "__typename": "Series",
            "episodes": 10
          }
        ]
        "###);
    }

    #[test]
    fn connection_page_info() {
        let shape = Shape::FirstRow(Box::new(Shape::Connection(Box::new(ConnectionShape {
            offset: 2,
            fields: vec![
                ("totalCount".into(), ConnectionField::TotalCount),
                (
                    "edges".into(),
                    ConnectionField::Edges(vec![
                        ("cursor".into(), EdgeField::Cursor),
                        (
                            "node".into(),
                            EdgeField::Node(Shape::Object(vec![("name".into(), Shape::Value)])),
                        ),
                        (
                            "properties".into(),
                            EdgeField::Properties(Shape::Object(vec![("role".into(), Shape::Value)])),
                        ),
                    ]),
                ),
                (
                    "pageInfo".into(),
                    ConnectionField::PageInfo(vec![
                        ("hasNextPage".into(), PageInfoField::HasNextPage),
                        ("hasPreviousPage".into(), PageInfoField::HasPreviousPage),
                        ("endCursor".into(), PageInfoField::EndCursor),
                    ]),
                ),
            ],
        }))));

        let response = shape.to_response(
            &rows(vec![json!({
                "edges": [
                    { "node": { "name": "Al" }, "properties": { "role": "Neil" } },
                    { "node": { "name": "Val" }, "properties": { "role": "Chris" } }
                ],
                "totalCount": 5
            })]),
            &Counters::default(),
        );

        insta::assert_json_snapshot!(response, @r###"
        {
          "totalCount": 5,
          "edges": [
            {
              "cursor": "YXJyYXljb25uZWN0aW9uOjI=",
              "node": {
                "name": "Al"
              },
              "properties": {
                "role": "Neil"
              }
            },
            {
              "cursor": "YXJyYXljb25uZWN0aW9uOjM=",
              "node": {
                "name": "Val"
              },
              "properties": {
                "role": "Chris"
              }
            }
          ],
          "pageInfo": {
            "hasNextPage": true,
            "hasPreviousPage": true,
            "endCursor": "YXJyYXljb25uZWN0aW9uOjM="
          }
        }
        "###);
    }

    #[test]
    fn mutation_info_comes_from_counters() {
        let shape = Shape::Mutation(vec![
            (
                "movies".into(),
                MutationField::Nodes(Shape::Object(vec![("title".into(), Shape::Value)])),
            ),
            (
                "info".into(),
                MutationField::Info(vec![
                    ("nodesCreated".into(), InfoField::NodesCreated),
                    ("relationshipsCreated".into(), InfoField::RelationshipsCreated),
                ]),
            ),
            ("__typename".into(), MutationField::Typename("CreateMoviesMutationResponse".into())),
        ]);

        let counters = Counters {
            nodes_created: 2,
            relationships_created: 1,
            ..Default::default()
        };

        let response = shape.to_response(&rows(vec![json!([{ "title": "Heat" }, { "title": "Ronin" }])]), &counters);

        insta::assert_json_snapshot!(response, @r###"
        {
          "movies": [
            {
              "title": "Heat"
            },
            {
              "title": "Ronin"
            }
          ],
          "info": {
            "nodesCreated": 2,
            "relationshipsCreated": 1
          },
          "__typename": "CreateMoviesMutationResponse"
        }
        "###);
    }
}
