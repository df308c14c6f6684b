use cypher_builder::Variable;
use graphql_cypher_schema::{
    AggregateFilterKey, AggregationFunction, ComparisonOperator, FieldDefinition, FieldKind, FilterKey, Quantifier,
    Relationship, ScalarOperator, TypeDefinition, TypeKind,
};
use indexmap::IndexMap;

use super::BuildContext;
use crate::{
    tree::{AggregateCondition, AggregateFilter, Filter, Operand, RelatedFilter, RelatedPattern},
    InputValue, TranslationError,
};

impl BuildContext<'_> {
    /// The `where` input of `ty`. Within a branch of an abstract selection, `branch` is the
    /// concrete type of the branch: `_on` and `typename_IN` then select the branch rather than
    /// checking labels.
    pub fn node_filter(
        &self,
        node: Variable,
        ty: TypeDefinition<'_>,
        branch: Option<TypeDefinition<'_>>,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let fields = object(value, path)?;

        if fields.is_empty() {
            return Ok(None);
        }

        if ty.kind == TypeKind::Union {
            return self.union_filter(node, ty, branch, fields, path);
        }

        let mut filters = Vec::new();

        for (key, value) in fields {
            let path = format!("{path}.{key}");
            let key_kind = FilterKey::parse(key, ty).ok_or_else(|| TranslationError::InvalidFilter {
                ty: ty.name().to_string(),
                key: key.clone(),
            })?;

            let filter = match key_kind {
                FilterKey::And => Filter::all(self.each(value, &path, |item, path| {
                    self.node_filter(node, ty, branch, item, path)
                })?),
                FilterKey::Or => Filter::any(
                    self.each(value, &path, |item, path| {
                        Ok(Some(
                            self.node_filter(node, ty, branch, item, path)?
                                .unwrap_or(Filter::Constant(true)),
                        ))
                    })?,
                ),
                FilterKey::Not => self.node_filter(node, ty, branch, value, &path)?.map(Filter::negate),
                FilterKey::On => self.on_filter(node, ty, branch, value, &path)?,
                FilterKey::TypenameIn => self.typename_filter(node, ty, branch, value, &path)?,
                FilterKey::Scalar { field_id, operator } => {
                    self.scalar_filter(node, self.schema.walk(field_id), operator, value, &path)?
                }
                FilterKey::Relationship { field_id, quantifier } => {
                    let relationship = relationship_of(self.schema.walk(field_id), ty, key)?;
                    self.relationship_filter(node, relationship, quantifier, value, &path)?
                }
                FilterKey::Connection { field_id, quantifier } => {
                    let relationship = relationship_of(self.schema.walk(field_id), ty, key)?;
                    self.connection_quantifier_filter(node, relationship, quantifier, value, &path)?
                }
                FilterKey::Aggregate { field_id } => {
                    let relationship = relationship_of(self.schema.walk(field_id), ty, key)?;
                    let pattern = self.related_pattern(node, relationship, relationship.target(), true, true)?;
                    let condition = self.aggregate_condition(relationship, value, &path)?;

                    Some(Filter::Aggregate(Box::new(AggregateFilter { pattern, condition })))
                }
            };

            filters.extend(filter);
        }

        Ok(Filter::all(filters))
    }

    /// The `where` input of a connection, `{ node, edge, AND, OR, NOT }`.
    pub fn connection_filter(
        &self,
        node: Variable,
        relationship_variable: Variable,
        relationship: Relationship<'_>,
        branch: Option<TypeDefinition<'_>>,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let fields = object(value, path)?;
        let mut filters = Vec::new();

        for (key, value) in fields {
            let path = format!("{path}.{key}");

            let filter = match key.as_str() {
                "node" => self.node_filter(node, relationship.target(), branch, value, &path)?,
                "edge" => match relationship.properties() {
                    Some(properties) => self.node_filter(relationship_variable, properties, None, value, &path)?,
                    None => return Err(invalid_filter(relationship, key)),
                },
                "AND" => Filter::all(self.each(value, &path, |item, path| {
                    self.connection_filter(node, relationship_variable, relationship, branch, item, path)
                })?),
                "OR" => Filter::any(self.each(value, &path, |item, path| {
                    Ok(Some(
                        self.connection_filter(node, relationship_variable, relationship, branch, item, path)?
                            .unwrap_or(Filter::Constant(true)),
                    ))
                })?),
                "NOT" => self
                    .connection_filter(node, relationship_variable, relationship, branch, value, &path)?
                    .map(Filter::negate),
                _ => return Err(invalid_filter(relationship, key)),
            };

            filters.extend(filter);
        }

        Ok(Filter::all(filters))
    }

    /// `(parent)-[relationship:TYPE]->(node:Label)` towards `target`, the relationship target or
    /// one of its possible types.
    pub fn related_pattern(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        with_relationship: bool,
        read: bool,
    ) -> Result<RelatedPattern, TranslationError> {
        let (labels, alternatives) = if target.is_abstract() {
            (Vec::new(), self.alternatives(target)?)
        } else {
            (self.labels(target)?, Vec::new())
        };

        Ok(RelatedPattern {
            traversal: self.traversal(parent, relationship, read),
            relationship: with_relationship.then(|| self.names.relationship()),
            node: self.names.node(),
            labels,
            alternatives,
        })
    }

    fn union_filter(
        &self,
        node: Variable,
        ty: TypeDefinition<'_>,
        branch: Option<TypeDefinition<'_>>,
        fields: &IndexMap<String, InputValue>,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        // Members left out of a union filter are excluded.
        if let Some(branch) = branch {
            return match fields.get(branch.name()) {
                Some(value) => self.node_filter(node, branch, Some(branch), value, &format!("{path}.{}", branch.name())),
                None => Ok(Some(Filter::Constant(false))),
            };
        }

        let mut alternatives = Vec::new();

        for (name, value) in fields {
            let member = self.member(ty, name)?;
            let filter = self.node_filter(node, member, Some(member), value, &format!("{path}.{name}"))?;

            alternatives.push(
                Filter::all(
                    std::iter::once(Filter::Labels {
                        node,
                        labels: self.labels(member)?,
                    })
                    .chain(filter),
                )
                .unwrap_or(Filter::Constant(true)),
            );
        }

        Ok(Filter::any(alternatives))
    }

    /// `_on: { Movie: {...} }`
    fn on_filter(
        &self,
        node: Variable,
        ty: TypeDefinition<'_>,
        branch: Option<TypeDefinition<'_>>,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let mut filters = Vec::new();

        for (name, value) in object(value, path)? {
            let member = self.member(ty, name)?;
            let path = format!("{path}.{name}");

            match branch {
                Some(branch) if branch.id() == member.id() => {
                    filters.extend(self.node_filter(node, member, Some(member), value, &path)?);
                }
                Some(_) => {}
                None => {
                    let Some(filter) = self.node_filter(node, member, None, value, &path)? else {
                        continue;
                    };

                    let other_type = Filter::Labels {
                        node,
                        labels: self.labels(member)?,
                    }
                    .negate();

                    filters.push(Filter::Or(vec![other_type, filter]));
                }
            }
        }

        Ok(Filter::all(filters))
    }

    /// `typename_IN: [Movie, Series]`
    fn typename_filter(
        &self,
        node: Variable,
        ty: TypeDefinition<'_>,
        branch: Option<TypeDefinition<'_>>,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let names = value
            .items()
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| TranslationError::invalid_value(path, "expected type names"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(branch) = branch {
            return Ok(Some(Filter::Constant(names.contains(&branch.name()))));
        }

        let mut alternatives = Vec::new();
        for name in names {
            let member = self.member(ty, name)?;
            alternatives.push(Filter::Labels {
                node,
                labels: self.labels(member)?,
            });
        }

        Ok(Some(Filter::any(alternatives).unwrap_or(Filter::Constant(false))))
    }

    fn scalar_filter(
        &self,
        node: Variable,
        definition: FieldDefinition<'_>,
        operator: ScalarOperator,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let left = match definition.kind {
            FieldKind::Cypher(_) => Operand::Computed(Box::new(self.custom_operand(definition, node)?)),
            _ => Operand::Property(node, definition.database_name().to_string()),
        };

        let right = (!value.is_null())
            .then(|| Operand::Param(self.input_param(value, value.to_param(definition.scalar_type()))));

        comparison(left, operator, right)
            .map(Some)
            .ok_or_else(|| TranslationError::invalid_value(path, "null only compares with equality"))
    }

    /// `r`, `r_SOME`, `r_NONE`, `r_ALL`, `r_SINGLE` and `r_NOT`. `r: null` matches nodes without
    /// any related node, `r_NOT: null` nodes with at least one.
    fn relationship_filter(
        &self,
        node: Variable,
        relationship: Relationship<'_>,
        quantifier: Option<Quantifier>,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let target = relationship.target();
        let pattern = self.related_pattern(node, relationship, target, false, true)?;

        let (quantifier, predicate) = if value.is_null() {
            match quantifier {
                None => (Quantifier::None, None),
                Some(Quantifier::None) => (Quantifier::Some, None),
                Some(_) => return Err(TranslationError::invalid_value(path, "a quantified filter cannot be null")),
            }
        } else {
            let predicate = self.node_filter(pattern.node, target, None, value, path)?;
            (quantifier.unwrap_or(Quantifier::Some), predicate)
        };

        Ok(Some(Filter::Related(Box::new(RelatedFilter {
            pattern,
            quantifier,
            predicate,
        }))))
    }

    fn connection_quantifier_filter(
        &self,
        node: Variable,
        relationship: Relationship<'_>,
        quantifier: Option<Quantifier>,
        value: &InputValue,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let pattern = self.related_pattern(node, relationship, relationship.target(), true, true)?;

        let (quantifier, predicate) = if value.is_null() {
            match quantifier {
                None => (Quantifier::None, None),
                Some(Quantifier::None) => (Quantifier::Some, None),
                Some(_) => return Err(TranslationError::invalid_value(path, "a quantified filter cannot be null")),
            }
        } else {
            let relationship_variable = pattern.relationship.unwrap_or(pattern.node);
            let predicate =
                self.connection_filter(pattern.node, relationship_variable, relationship, None, value, path)?;
            (quantifier.unwrap_or(Quantifier::Some), predicate)
        };

        Ok(Some(Filter::Related(Box::new(RelatedFilter {
            pattern,
            quantifier,
            predicate,
        }))))
    }

    /// `rAggregate: { count_GT: 1, node: { name_SHORTEST_LENGTH_LT: 5 }, edge: {...} }`
    fn aggregate_condition(
        &self,
        relationship: Relationship<'_>,
        value: &InputValue,
        path: &str,
    ) -> Result<AggregateCondition, TranslationError> {
        let mut conditions = Vec::new();

        for (key, value) in object(value, path)? {
            let path = format!("{path}.{key}");

            match key.as_str() {
                "AND" | "OR" => {
                    let items = value
                        .items()
                        .iter()
                        .map(|item| self.aggregate_condition(relationship, item, &path))
                        .collect::<Result<Vec<_>, _>>()?;

                    conditions.push(if key == "AND" {
                        AggregateCondition::And(items)
                    } else {
                        AggregateCondition::Or(items)
                    });
                }
                "NOT" => conditions.push(AggregateCondition::Not(Box::new(
                    self.aggregate_condition(relationship, value, &path)?,
                ))),
                "node" => self.aggregate_properties(relationship.target(), false, value, &path, &mut conditions)?,
                "edge" => match relationship.properties() {
                    Some(properties) => self.aggregate_properties(properties, true, value, &path, &mut conditions)?,
                    None => return Err(invalid_filter(relationship, key)),
                },
                _ => {
                    let operator =
                        AggregateFilterKey::parse_count(key).ok_or_else(|| invalid_filter(relationship, key))?;
                    let count = value
                        .as_i64()
                        .ok_or_else(|| TranslationError::invalid_value(&path, "expected an integer"))?;

                    conditions.push(AggregateCondition::Count {
                        operator,
                        value: self.input_param(value, count.into()),
                    });
                }
            }
        }

        Ok(match conditions.len() {
            1 => conditions.remove(0),
            _ => AggregateCondition::And(conditions),
        })
    }

    fn aggregate_properties(
        &self,
        ty: TypeDefinition<'_>,
        on_relationship: bool,
        value: &InputValue,
        path: &str,
        conditions: &mut Vec<AggregateCondition>,
    ) -> Result<(), TranslationError> {
        for (key, value) in object(value, path)? {
            let parsed = AggregateFilterKey::parse(key, ty).ok_or_else(|| TranslationError::InvalidFilter {
                ty: ty.name().to_string(),
                key: key.clone(),
            })?;

            let definition = self.schema.walk(parsed.field_id);
            let length = matches!(
                parsed.function,
                AggregationFunction::ShortestLength
                    | AggregationFunction::LongestLength
                    | AggregationFunction::AverageLength
            );

            let param = if length || parsed.function == AggregationFunction::Average {
                cypher_builder::Value::from(value)
            } else {
                value.to_param(definition.scalar_type())
            };

            conditions.push(AggregateCondition::Property {
                on_relationship,
                property: definition.database_name().to_string(),
                function: parsed.function,
                operator: parsed.comparison,
                value: self.input_param(value, param),
            });
        }

        Ok(())
    }

    fn member<'s>(&self, ty: TypeDefinition<'s>, name: &str) -> Result<TypeDefinition<'s>, TranslationError> {
        ty.possible_types()
            .find(|member| member.name() == name)
            .ok_or_else(|| TranslationError::InvalidFilter {
                ty: ty.name().to_string(),
                key: name.to_string(),
            })
    }

    /// Compiles each item of a list input, list coercion applies.
    fn each(
        &self,
        value: &InputValue,
        path: &str,
        compile: impl Fn(&InputValue, &str) -> Result<Option<Filter>, TranslationError>,
    ) -> Result<Vec<Filter>, TranslationError> {
        let mut filters = Vec::new();

        for (index, item) in value.items().iter().enumerate() {
            filters.extend(compile(item, &format!("{path}[{index}]"))?);
        }

        Ok(filters)
    }
}

/// `left <operator> right`, where a missing right side is `null`: equality becomes a null check,
/// every other comparison is meaningless. `None` in that last case.
pub(super) fn comparison(left: Operand, operator: ScalarOperator, right: Option<Operand>) -> Option<Filter> {
    let filter = match right {
        Some(right) => Filter::Compare {
            left,
            operator: operator.comparison,
            right,
        },
        None if operator.comparison == ComparisonOperator::Equal => Filter::IsNull(left),
        None => return None,
    };

    Some(if operator.negated { filter.negate() } else { filter })
}

pub(super) fn object<'v>(value: &'v InputValue, path: &str) -> Result<&'v IndexMap<String, InputValue>, TranslationError> {
    value
        .as_object()
        .ok_or_else(|| TranslationError::invalid_value(path, "expected an object"))
}

fn relationship_of<'a>(
    definition: FieldDefinition<'a>,
    ty: TypeDefinition<'_>,
    key: &str,
) -> Result<Relationship<'a>, TranslationError> {
    definition.relationship().ok_or_else(|| TranslationError::InvalidFilter {
        ty: ty.name().to_string(),
        key: key.to_string(),
    })
}

fn invalid_filter(relationship: Relationship<'_>, key: &str) -> TranslationError {
    let field = relationship.field();

    TranslationError::InvalidFilter {
        ty: format!("{}.{}", field.parent().name(), field.name()),
        key: key.to_string(),
    }
}
