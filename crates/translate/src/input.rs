use cypher_builder::{BigInt, Crs, Point, Temporal, TemporalKind, Value};
use graphql_cypher_schema::ScalarType;
use indexmap::IndexMap;

/// An argument value after variable substitution. Objects keep the order of the operation,
/// which keeps the generated statements stable.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    String(String),
    Enum(String),
    List(Vec<InputValue>),
    Object(IndexMap<String, InputValue>),
}

impl InputValue {
    pub fn is_null(&self) -> bool {
        matches!(self, InputValue::Null)
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, InputValue>> {
        match self {
            InputValue::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Strings and enum values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InputValue::String(s) | InputValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            InputValue::Int(i) => Some(*i),
            InputValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            InputValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&InputValue> {
        self.as_object()?.get(key)
    }

    /// List input coercion: a single value stands for a list of one, `null` for an empty list.
    pub fn items(&self) -> &[InputValue] {
        match self {
            InputValue::Null => &[],
            InputValue::List(items) => items,
            single => std::slice::from_ref(single),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            InputValue::Null => serde_json::Value::Null,
            InputValue::Boolean(b) => (*b).into(),
            InputValue::Int(i) => (*i).into(),
            InputValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            InputValue::String(s) | InputValue::Enum(s) => s.clone().into(),
            InputValue::List(items) => items.iter().map(InputValue::to_json).collect(),
            InputValue::Object(fields) => fields
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect::<serde_json::Map<_, _>>()
                .into(),
        }
    }

    /// The parameter value for a property of the given scalar type. Temporal, spatial and big
    /// integer values are wrapped so that the driver converts them to their native types.
    pub fn to_param(&self, scalar: Option<ScalarType>) -> Value {
        match (self, scalar) {
            (InputValue::Null, _) => Value::Null,
            (InputValue::List(items), _) => Value::List(items.iter().map(|item| item.to_param(scalar)).collect()),
            (InputValue::String(value), Some(scalar)) if scalar.is_temporal() => Value::Temporal(Temporal {
                kind: temporal_kind(scalar),
                value: value.clone(),
            }),
            (InputValue::Object(fields), Some(scalar)) if scalar.is_spatial() => point(fields, scalar),
            (InputValue::String(value), Some(ScalarType::BigInt)) => Value::BigInt(BigInt { value: value.clone() }),
            (InputValue::Int(value), Some(ScalarType::BigInt)) => Value::BigInt(BigInt {
                value: value.to_string(),
            }),
            (InputValue::Int(value), Some(ScalarType::Float)) => Value::Float(*value as f64),
            _ => self.into(),
        }
    }
}

pub(crate) fn temporal_kind(scalar: ScalarType) -> TemporalKind {
    match scalar {
        ScalarType::LocalDateTime => TemporalKind::LocalDateTime,
        ScalarType::Date => TemporalKind::Date,
        ScalarType::Time => TemporalKind::Time,
        ScalarType::LocalTime => TemporalKind::LocalTime,
        ScalarType::Duration => TemporalKind::Duration,
        _ => TemporalKind::DateTime,
    }
}

/// `{ longitude, latitude, height }` for `Point`, `{ x, y, z }` for `CartesianPoint`.
fn point(fields: &IndexMap<String, InputValue>, scalar: ScalarType) -> Value {
    let coordinate = |name: &str| {
        fields.get(name).and_then(|value| match value {
            InputValue::Int(i) => Some(*i as f64),
            InputValue::Float(f) => Some(*f),
            _ => None,
        })
    };

    let (names, crs_2d, crs_3d) = match scalar {
        ScalarType::CartesianPoint => (["x", "y", "z"], Crs::Cartesian, Crs::Cartesian3d),
        _ => (["longitude", "latitude", "height"], Crs::Wgs84, Crs::Wgs843d),
    };

    let mut coordinates: Vec<f64> = names[..2].iter().filter_map(|name| coordinate(name)).collect();

    let crs = match coordinate(names[2]) {
        Some(third) => {
            coordinates.push(third);
            crs_3d
        }
        None => crs_2d,
    };

    Value::Point(Point { crs, coordinates })
}

impl From<&InputValue> for Value {
    fn from(value: &InputValue) -> Self {
        match value {
            InputValue::Null => Value::Null,
            InputValue::Boolean(b) => Value::Boolean(*b),
            InputValue::Int(i) => Value::Integer(*i),
            InputValue::Float(f) => Value::Float(*f),
            InputValue::String(s) | InputValue::Enum(s) => Value::String(s.clone()),
            InputValue::List(items) => Value::List(items.iter().map(Value::from).collect()),
            InputValue::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for InputValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => InputValue::Null,
            serde_json::Value::Bool(b) => InputValue::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => InputValue::Int(i),
                None => InputValue::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => InputValue::String(s),
            serde_json::Value::Array(items) => InputValue::List(items.into_iter().map(InputValue::from).collect()),
            serde_json::Value::Object(fields) => InputValue::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, InputValue::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_params() {
        let date = InputValue::String("2024-05-01".into());
        assert_eq!(
            date.to_param(Some(ScalarType::Date)),
            Value::Temporal(Temporal {
                kind: TemporalKind::Date,
                value: "2024-05-01".into()
            })
        );

        let location = InputValue::from(serde_json::json!({ "longitude": 2.35, "latitude": 48.85 }));
        assert_eq!(
            location.to_param(Some(ScalarType::Point)),
            Value::Point(Point {
                crs: Crs::Wgs84,
                coordinates: vec![2.35, 48.85]
            })
        );

        let position = InputValue::from(serde_json::json!({ "x": 1, "y": 2, "z": 3 }));
        assert_eq!(
            position.to_param(Some(ScalarType::CartesianPoint)),
            Value::Point(Point {
                crs: Crs::Cartesian3d,
                coordinates: vec![1.0, 2.0, 3.0]
            })
        );

        assert_eq!(
            InputValue::Int(12).to_param(Some(ScalarType::BigInt)),
            Value::BigInt(BigInt { value: "12".into() })
        );
        assert_eq!(InputValue::Enum("ASC".into()).to_param(None), Value::String("ASC".into()));
    }

    #[test]
    fn list_coercion() {
        assert_eq!(InputValue::Null.items().len(), 0);
        assert_eq!(InputValue::Int(1).items(), &[InputValue::Int(1)]);
        assert_eq!(InputValue::List(vec![InputValue::Null; 2]).items().len(), 2);
    }
}
