//! Interpretation of the keys of `where` inputs, `title_STARTS_WITH`, `actors_SOME`,
//! `actorsAggregate`...

use crate::{FieldDefinitionId, FieldKind, TypeDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Equal,
    In,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    Matches,
    /// The list property contains the value.
    Includes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScalarOperator {
    pub comparison: ComparisonOperator,
    pub negated: bool,
}

impl ScalarOperator {
    pub const EQUAL: ScalarOperator = ScalarOperator {
        comparison: ComparisonOperator::Equal,
        negated: false,
    };

    /// Splits a key into its name and operator without knowing the fields it may refer to,
    /// `roles_INCLUDES` into `roles` and `Includes`.
    pub fn split_key(key: &str) -> (&str, ScalarOperator) {
        SCALAR_SUFFIXES
            .iter()
            .find_map(|(suffix, comparison, negated)| {
                key.strip_suffix(suffix).filter(|name| !name.is_empty()).map(|name| {
                    (
                        name,
                        ScalarOperator {
                            comparison: *comparison,
                            negated: *negated,
                        },
                    )
                })
            })
            .unwrap_or((key, ScalarOperator::EQUAL))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    Some,
    None,
    All,
    Single,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKey {
    And,
    Or,
    Not,
    /// `_on: { Type: {...} }`
    On,
    /// `typename_IN: [Type]`
    TypenameIn,
    Scalar {
        field_id: FieldDefinitionId,
        operator: ScalarOperator,
    },
    /// A bare relationship key when `quantifier` is `None`.
    Relationship {
        field_id: FieldDefinitionId,
        quantifier: Option<Quantifier>,
    },
    Connection {
        field_id: FieldDefinitionId,
        quantifier: Option<Quantifier>,
    },
    Aggregate {
        field_id: FieldDefinitionId,
    },
}

const SCALAR_SUFFIXES: &[(&str, ComparisonOperator, bool)] = &[
    ("_NOT_STARTS_WITH", ComparisonOperator::StartsWith, true),
    ("_NOT_ENDS_WITH", ComparisonOperator::EndsWith, true),
    ("_NOT_CONTAINS", ComparisonOperator::Contains, true),
    ("_NOT_INCLUDES", ComparisonOperator::Includes, true),
    ("_NOT_IN", ComparisonOperator::In, true),
    ("_STARTS_WITH", ComparisonOperator::StartsWith, false),
    ("_ENDS_WITH", ComparisonOperator::EndsWith, false),
    ("_CONTAINS", ComparisonOperator::Contains, false),
    ("_INCLUDES", ComparisonOperator::Includes, false),
    ("_MATCHES", ComparisonOperator::Matches, false),
    ("_LTE", ComparisonOperator::LessThanOrEqual, false),
    ("_GTE", ComparisonOperator::GreaterThanOrEqual, false),
    ("_LT", ComparisonOperator::LessThan, false),
    ("_GT", ComparisonOperator::GreaterThan, false),
    ("_IN", ComparisonOperator::In, false),
    ("_NOT", ComparisonOperator::Equal, true),
    ("_EQ", ComparisonOperator::Equal, false),
];

const QUANTIFIER_SUFFIXES: &[(&str, Quantifier)] = &[
    ("_SOME", Quantifier::Some),
    ("_NONE", Quantifier::None),
    ("_ALL", Quantifier::All),
    ("_SINGLE", Quantifier::Single),
    ("_NOT", Quantifier::None),
];

impl FilterKey {
    /// Interprets a key of the `where` input of the given type. `None` for unknown keys.
    pub fn parse(key: &str, ty: TypeDefinition<'_>) -> Option<FilterKey> {
        match key {
            "AND" => return Some(FilterKey::And),
            "OR" => return Some(FilterKey::Or),
            "NOT" => return Some(FilterKey::Not),
            "_on" => return Some(FilterKey::On),
            "typename_IN" => return Some(FilterKey::TypenameIn),
            _ => {}
        }

        if let Some(field) = ty.field_by_name(key) {
            return Some(match field.kind {
                FieldKind::Relationship(_) => FilterKey::Relationship {
                    field_id: field.id(),
                    quantifier: None,
                },
                _ => FilterKey::Scalar {
                    field_id: field.id(),
                    operator: ScalarOperator::EQUAL,
                },
            });
        }

        if let Some(name) = key.strip_suffix("Aggregate") {
            if let Some(field) = ty.field_by_name(name).filter(|field| field.relationship().is_some()) {
                return Some(FilterKey::Aggregate { field_id: field.id() });
            }
        }

        if let Some(name) = key.strip_suffix("Connection") {
            if let Some(field) = ty.field_by_name(name).filter(|field| field.relationship().is_some()) {
                return Some(FilterKey::Connection {
                    field_id: field.id(),
                    quantifier: None,
                });
            }
        }

        for (suffix, quantifier) in QUANTIFIER_SUFFIXES {
            let Some(prefix) = key.strip_suffix(suffix) else {
                continue;
            };

            if let Some(name) = prefix.strip_suffix("Connection") {
                if let Some(field) = ty.field_by_name(name).filter(|field| field.relationship().is_some()) {
                    return Some(FilterKey::Connection {
                        field_id: field.id(),
                        quantifier: Some(*quantifier),
                    });
                }
            }

            if let Some(field) = ty.field_by_name(prefix).filter(|field| field.relationship().is_some()) {
                return Some(FilterKey::Relationship {
                    field_id: field.id(),
                    quantifier: Some(*quantifier),
                });
            }
        }

        for (suffix, comparison, negated) in SCALAR_SUFFIXES {
            let Some(prefix) = key.strip_suffix(suffix) else {
                continue;
            };

            if let Some(field) = ty.field_by_name(prefix).filter(|field| field.relationship().is_none()) {
                return Some(FilterKey::Scalar {
                    field_id: field.id(),
                    operator: ScalarOperator {
                        comparison: *comparison,
                        negated: *negated,
                    },
                });
            }
        }

        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregationFunction {
    Average,
    Min,
    Max,
    Sum,
    ShortestLength,
    LongestLength,
    AverageLength,
}

const AGGREGATION_SUFFIXES: &[(&str, AggregationFunction)] = &[
    ("_SHORTEST_LENGTH", AggregationFunction::ShortestLength),
    ("_LONGEST_LENGTH", AggregationFunction::LongestLength),
    ("_AVERAGE_LENGTH", AggregationFunction::AverageLength),
    ("_AVERAGE", AggregationFunction::Average),
    ("_MIN", AggregationFunction::Min),
    ("_MAX", AggregationFunction::Max),
    ("_SUM", AggregationFunction::Sum),
];

const THRESHOLD_SUFFIXES: &[(&str, ComparisonOperator)] = &[
    ("_EQUAL", ComparisonOperator::Equal),
    ("_LTE", ComparisonOperator::LessThanOrEqual),
    ("_GTE", ComparisonOperator::GreaterThanOrEqual),
    ("_LT", ComparisonOperator::LessThan),
    ("_GT", ComparisonOperator::GreaterThan),
];

/// A key of the `node` or `edge` input of an aggregation filter, `title_SHORTEST_LENGTH_LT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateFilterKey {
    pub field_id: FieldDefinitionId,
    pub function: AggregationFunction,
    pub comparison: ComparisonOperator,
}

impl AggregateFilterKey {
    pub fn parse(key: &str, ty: TypeDefinition<'_>) -> Option<Self> {
        let (rest, comparison) = THRESHOLD_SUFFIXES
            .iter()
            .find_map(|(suffix, comparison)| key.strip_suffix(suffix).map(|rest| (rest, *comparison)))?;

        let (name, function) = AGGREGATION_SUFFIXES
            .iter()
            .find_map(|(suffix, function)| rest.strip_suffix(suffix).map(|name| (name, *function)))?;

        let field = ty.field_by_name(name).filter(|field| field.is_property())?;

        Some(AggregateFilterKey {
            field_id: field.id(),
            function,
            comparison,
        })
    }

    /// `count`, `count_LT`... of an aggregation filter.
    pub fn parse_count(key: &str) -> Option<ComparisonOperator> {
        match key {
            "count" | "count_EQ" => Some(ComparisonOperator::Equal),
            "count_LT" => Some(ComparisonOperator::LessThan),
            "count_LTE" => Some(ComparisonOperator::LessThanOrEqual),
            "count_GT" => Some(ComparisonOperator::GreaterThan),
            "count_GTE" => Some(ComparisonOperator::GreaterThanOrEqual),
            _ => None,
        }
    }
}
