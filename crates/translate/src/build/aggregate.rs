use cypher_builder::Variable;
use graphql_cypher_schema::{AuthOperations, FieldDefinition, ScalarType, TypeDefinition};
use inflector::Inflector;

use super::BuildContext;
use crate::{
    bind::BoundField,
    tree::{AggregateFunction, AggregateKind, AggregateValue, Aggregation, FieldAggregate, Filter},
    TranslationError,
};

impl BuildContext<'_> {
    /// `moviesAggregate(where: ...) { count title { shortest } }`
    pub(super) fn root_aggregation(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
    ) -> Result<Aggregation, TranslationError> {
        let node = Variable::root();
        let predicate = self.aggregation_predicate(ty, field, node)?;
        let typename = format!("{}AggregateSelection", ty.name());

        let mut fields = Vec::new();
        for subfield in &field.selection_set {
            let value = match subfield.name.as_str() {
                "count" => AggregateValue::Count,
                "__typename" => AggregateValue::Constant(typename.clone()),
                _ => self.property_aggregate(ty, subfield, false, &typename)?,
            };

            fields.push((subfield.response_key.clone(), value));
        }

        Ok(Aggregation {
            traversal: None,
            node,
            relationship: self.names.relationship(),
            labels: self.aggregation_labels(ty)?,
            predicate,
            fields,
        })
    }

    /// `actorsAggregate { count node { name { longest } } edge { screenTime { max } } }`
    pub(super) fn nested_aggregation(
        &self,
        parent: Variable,
        definition: FieldDefinition<'_>,
        field: &BoundField,
    ) -> Result<Aggregation, TranslationError> {
        let relationship = definition
            .relationship()
            .ok_or_else(|| TranslationError::unknown_field(definition.parent().name(), &field.name))?;
        let target = relationship.target();

        let node = self.names.node();
        let relationship_variable = self.names.relationship();
        let predicate = self.aggregation_predicate(target, field, node)?;

        let prefix = format!(
            "{}{}{}",
            definition.parent().name(),
            target.name(),
            definition.name().to_pascal_case()
        );
        let typename = format!("{prefix}AggregationSelection");

        let mut fields = Vec::new();
        for subfield in &field.selection_set {
            let value = match subfield.name.as_str() {
                "count" => AggregateValue::Count,
                "__typename" => AggregateValue::Constant(typename.clone()),
                "node" => self.aggregate_map(target, subfield, false, &format!("{prefix}NodeAggregateSelection"))?,
                "edge" => {
                    let properties = relationship
                        .properties()
                        .ok_or_else(|| TranslationError::unknown_field(&typename, "edge"))?;
                    self.aggregate_map(properties, subfield, true, &format!("{prefix}EdgeAggregateSelection"))?
                }
                name => return Err(TranslationError::unknown_field(&typename, name)),
            };

            fields.push((subfield.response_key.clone(), value));
        }

        Ok(Aggregation {
            traversal: Some(self.traversal(parent, relationship, true)),
            node,
            relationship: relationship_variable,
            labels: self.aggregation_labels(target)?,
            predicate,
            fields,
        })
    }

    fn aggregation_labels(&self, ty: TypeDefinition<'_>) -> Result<Vec<String>, TranslationError> {
        if ty.is_abstract() {
            Ok(Vec::new())
        } else {
            self.labels(ty)
        }
    }

    fn aggregation_predicate(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        node: Variable,
    ) -> Result<Option<Filter>, TranslationError> {
        let where_filter = match field.argument("where").filter(|value| !value.is_null()) {
            Some(value) => self.node_filter(node, ty, None, value, "where")?,
            None => None,
        };

        let alternatives = self.alternatives_filter(node, ty)?;
        let authorization = self.read_authorization(ty, AuthOperations::AGGREGATE, node)?;

        Ok(Filter::all(alternatives.into_iter().chain(where_filter).chain(authorization)))
    }

    fn aggregate_map(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        on_relationship: bool,
        typename: &str,
    ) -> Result<AggregateValue, TranslationError> {
        let mut fields = Vec::new();

        for subfield in &field.selection_set {
            let value = match subfield.name.as_str() {
                "__typename" => AggregateValue::Constant(typename.to_string()),
                _ => self.property_aggregate(ty, subfield, on_relationship, typename)?,
            };

            fields.push((subfield.response_key.clone(), value));
        }

        Ok(AggregateValue::Map(fields))
    }

    fn property_aggregate(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        on_relationship: bool,
        typename: &str,
    ) -> Result<AggregateValue, TranslationError> {
        let unknown = || TranslationError::unknown_field(typename, &field.name);

        let definition = ty
            .field_by_name(&field.name)
            .filter(|definition| definition.is_property() && !definition.ty.list)
            .ok_or_else(unknown)?;
        let scalar = definition.scalar_type().ok_or_else(unknown)?;
        let kind = aggregate_kind(scalar).ok_or_else(unknown)?;

        let selection = format!("{scalar}AggregateSelection");
        let mut functions = Vec::new();

        for function in &field.selection_set {
            let value = match (kind, function.name.as_str()) {
                (_, "__typename") => AggregateFunction::Constant(selection.clone()),
                (AggregateKind::String, "shortest") => AggregateFunction::Shortest,
                (AggregateKind::String, "longest") => AggregateFunction::Longest,
                (AggregateKind::Number | AggregateKind::Temporal, "min") => AggregateFunction::Min,
                (AggregateKind::Number | AggregateKind::Temporal, "max") => AggregateFunction::Max,
                (AggregateKind::Number, "average") => AggregateFunction::Average,
                (AggregateKind::Number, "sum") => AggregateFunction::Sum,
                (_, name) => return Err(TranslationError::unknown_field(&selection, name)),
            };

            functions.push((function.response_key.clone(), value));
        }

        Ok(AggregateValue::Field(FieldAggregate {
            property: definition.database_name().to_string(),
            on_relationship,
            kind,
            functions,
        }))
    }
}

fn aggregate_kind(scalar: ScalarType) -> Option<AggregateKind> {
    if scalar.is_string_like() {
        Some(AggregateKind::String)
    } else if scalar.is_numeric() {
        Some(AggregateKind::Number)
    } else if scalar.is_temporal() {
        Some(AggregateKind::Temporal)
    } else {
        None
    }
}
