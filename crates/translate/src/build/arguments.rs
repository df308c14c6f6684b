use cypher_builder::Order;

use crate::{bind::BoundField, response::decode_cursor, InputValue, TranslationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SortScope {
    Node,
    /// Relationship properties of a connection.
    Edge,
    /// The score of an index query.
    Score,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SortArgument {
    pub scope: SortScope,
    pub field: String,
    pub order: Order,
}

/// `sort`, `limit` and `offset`, either directly on the field or inside `options`. Direct
/// arguments win.
#[derive(Debug, Default)]
pub(super) struct Pagination {
    pub sort: Vec<SortArgument>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub fn from_field(field: &BoundField) -> Result<Self, TranslationError> {
        let options = field.argument("options").filter(|options| !options.is_null());
        let argument = |name: &str| {
            field
                .argument(name)
                .filter(|value| !value.is_null())
                .or_else(|| options.and_then(|options| options.get(name)).filter(|value| !value.is_null()))
        };

        Ok(Pagination {
            sort: argument("sort").map(|sort| sort_arguments(sort, "sort")).transpose()?.unwrap_or_default(),
            limit: argument("limit").map(|limit| non_negative(limit, "limit")).transpose()?,
            offset: argument("offset").map(|offset| non_negative(offset, "offset")).transpose()?,
        })
    }

    /// `first`, `after` and `sort` of a connection. The offset is the position following the
    /// `after` cursor.
    pub fn from_connection(field: &BoundField) -> Result<Self, TranslationError> {
        let first = field
            .argument("first")
            .filter(|value| !value.is_null())
            .map(|first| non_negative(first, "first"))
            .transpose()?;

        let offset = match field.argument("after").filter(|value| !value.is_null()) {
            Some(after) => {
                let cursor = after
                    .as_str()
                    .ok_or_else(|| TranslationError::invalid_value("after", "a cursor must be a string"))?;
                let offset = decode_cursor(cursor)
                    .and_then(|position| i64::try_from(position).ok())
                    .and_then(|position| position.checked_add(1))
                    .ok_or_else(|| TranslationError::InvalidCursor(cursor.to_string()))?;
                Some(offset)
            }
            None => None,
        };

        let sort = match field.argument("sort").filter(|value| !value.is_null()) {
            Some(sort) => sort_arguments(sort, "sort")?,
            None => Vec::new(),
        };

        Ok(Pagination {
            sort,
            limit: first,
            offset,
        })
    }
}

/// `[{ title: ASC }, { node: { name: DESC } }, { edge: { role: ASC } }, { score: DESC }]`.
/// Nested objects other than `edge` sort on the node.
fn sort_arguments(value: &InputValue, path: &str) -> Result<Vec<SortArgument>, TranslationError> {
    let mut sort = Vec::new();

    for (position, item) in value.items().iter().enumerate() {
        let item_path = format!("{path}[{position}]");
        let fields = item
            .as_object()
            .ok_or_else(|| TranslationError::invalid_value(&item_path, "a sort item must be an object"))?;

        for (key, value) in fields {
            let scope = match (key.as_str(), value.as_object()) {
                ("edge", Some(_)) => Some(SortScope::Edge),
                (_, Some(_)) => Some(SortScope::Node),
                _ => None,
            };

            match scope {
                Some(scope) => {
                    for (field, order) in value.as_object().into_iter().flatten() {
                        sort.push(SortArgument {
                            scope,
                            field: field.clone(),
                            order: order_of(order, &format!("{item_path}.{key}.{field}"))?,
                        });
                    }
                }
                None => sort.push(SortArgument {
                    scope: if key == "score" { SortScope::Score } else { SortScope::Node },
                    field: key.clone(),
                    order: order_of(value, &format!("{item_path}.{key}"))?,
                }),
            }
        }
    }

    Ok(sort)
}

fn order_of(value: &InputValue, path: &str) -> Result<Order, TranslationError> {
    match value.as_str() {
        Some("ASC") => Ok(Order::Asc),
        Some("DESC") => Ok(Order::Desc),
        _ => Err(TranslationError::invalid_value(path, "expected ASC or DESC")),
    }
}

fn non_negative(value: &InputValue, path: &str) -> Result<i64, TranslationError> {
    value
        .as_i64()
        .filter(|value| *value >= 0)
        .ok_or_else(|| TranslationError::invalid_value(path, "expected a non-negative integer"))
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;
    use crate::response::encode_cursor;

    fn field(arguments: serde_json::Value) -> BoundField {
        let arguments: IndexMap<String, InputValue> = match InputValue::from(arguments) {
            InputValue::Object(fields) => fields,
            _ => IndexMap::new(),
        };

        BoundField {
            response_key: "movies".into(),
            name: "movies".into(),
            arguments,
            type_condition: None,
            selection_set: Vec::new(),
        }
    }

    #[test]
    fn direct_arguments_win_over_options() {
        let pagination = Pagination::from_field(&field(serde_json::json!({
            "limit": 5,
            "options": { "limit": 10, "offset": 2, "sort": [{ "title": "DESC" }] }
        })))
        .unwrap();

        assert_eq!(pagination.limit, Some(5));
        assert_eq!(pagination.offset, Some(2));
        assert_eq!(
            pagination.sort,
            vec![SortArgument {
                scope: SortScope::Node,
                field: "title".into(),
                order: Order::Desc
            }]
        );
    }

    #[test]
    fn connection_arguments() {
        let pagination = Pagination::from_connection(&field(serde_json::json!({
            "first": 2,
            "after": encode_cursor(4),
            "sort": [{ "node": { "name": "ASC" } }, { "edge": { "role": "DESC" } }]
        })))
        .unwrap();

        assert_eq!(pagination.limit, Some(2));
        assert_eq!(pagination.offset, Some(5));
        assert_eq!(pagination.sort[1].scope, SortScope::Edge);

        let invalid = Pagination::from_connection(&field(serde_json::json!({ "after": "nope" })));
        assert_eq!(invalid.unwrap_err(), TranslationError::InvalidCursor("nope".into()));
    }

    #[rstest::rstest]
    #[case::past_i64(usize::MAX)]
    #[case::last_i64(i64::MAX as usize)]
    fn out_of_range_cursors(#[case] position: usize) {
        let cursor = encode_cursor(position);
        let pagination = Pagination::from_connection(&field(serde_json::json!({ "after": cursor.clone() })));

        assert_eq!(pagination.unwrap_err(), TranslationError::InvalidCursor(cursor));
    }

    #[test]
    fn invalid_values() {
        let negative = Pagination::from_field(&field(serde_json::json!({ "limit": -1 })));
        assert!(matches!(negative, Err(TranslationError::InvalidValue { .. })));

        let order = Pagination::from_field(&field(serde_json::json!({ "sort": [{ "title": "UP" }] })));
        assert!(matches!(order, Err(TranslationError::InvalidValue { .. })));
    }
}
