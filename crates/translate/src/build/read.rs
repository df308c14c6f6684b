use cypher_builder::Variable;
use graphql_cypher_schema::{AuthOperations, FieldDefinition, FieldKind, TypeDefinition};

use super::{
    applies,
    arguments::{Pagination, SortArgument, SortScope},
    authorization::BranchAuthorization,
    BuildContext,
};
use crate::{
    bind::BoundField,
    response::Shape,
    tree::{
        Branch, FieldValue, Filter, PointField, Projection, PropertyFormat, Selection, SortItem, SortKey, Source,
        Traversal,
    },
    TranslationError,
};

const POINT_FIELDS: &[&str] = &["longitude", "latitude", "height", "x", "y", "z", "crs", "srid"];

/// Where the nodes of a selection come from.
pub(crate) enum SelectionSource {
    Root,
    Traversal(Traversal),
}

/// The projection of one concrete type with the shape of its response and the guards of the
/// selected fields.
#[derive(Default)]
pub(super) struct ProjectionPlan {
    pub projection: Projection,
    pub shape: Vec<(String, Shape)>,
    pub guards: Vec<Filter>,
}

impl BuildContext<'_> {
    /// A list of nodes, or a single one for to-one relationships. The returned shape is the one
    /// of each item.
    pub fn selection(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        source: SelectionSource,
        single: bool,
    ) -> Result<(Selection, Shape), TranslationError> {
        let pagination = if single {
            Pagination::default()
        } else {
            Pagination::from_field(field)?
        };

        let filter = field.argument("where").filter(|value| !value.is_null());
        let is_abstract = ty.is_abstract();
        let is_root = matches!(source, SelectionSource::Root);

        let mut branches = Vec::new();
        let mut shape = Vec::new();

        for member in ty.possible_types() {
            let node = if is_root && !is_abstract {
                Variable::root()
            } else {
                self.names.node()
            };

            let branch_type = is_abstract.then_some(member);
            let mut plan = self.projection(member, field, node)?;

            let where_filter = match filter {
                Some(filter) => self.node_filter(node, ty, branch_type, filter, "where")?,
                None => None,
            };
            let authorization = self.member_authorization(member, is_abstract.then_some(ty), node)?;

            if is_abstract {
                plan.projection
                    .fields
                    .insert(0, ("__resolveType".to_string(), FieldValue::Constant(member.name().to_string())));
            }

            merge_shape(&mut shape, plan.shape);

            branches.push(Branch {
                node,
                relationship: self.names.relationship(),
                labels: self.labels(member)?,
                predicate: Filter::all(where_filter.into_iter().chain(authorization.filter).chain(plan.guards)),
                gate: authorization.gate,
                projection: plan.projection,
                edge_projection: None,
            });
        }

        let sort = self.node_sort(ty, &pagination.sort, &mut branches)?;

        let limit = if single {
            None
        } else {
            self.limit(ty, pagination.limit).map(|limit| self.param(limit))
        };

        let selection = Selection {
            source: match source {
                SelectionSource::Root => Source::Labels,
                SelectionSource::Traversal(traversal) => Source::Traversal(traversal),
            },
            branches,
            is_abstract,
            sort,
            offset: pagination.offset.map(|offset| self.param(offset)),
            limit,
            single,
        };

        Ok((selection, Shape::Object(shape)))
    }

    /// The read authorization of a selected type, or of one member of the interface or union
    /// `parent`.
    pub(super) fn member_authorization(
        &self,
        member: TypeDefinition<'_>,
        parent: Option<TypeDefinition<'_>>,
        node: Variable,
    ) -> Result<BranchAuthorization, TranslationError> {
        match parent {
            Some(parent) => self.branch_authorization(member, parent, AuthOperations::READ, node),
            None => Ok(BranchAuthorization {
                filter: self.read_authorization(member, AuthOperations::READ, node)?,
                gate: None,
            }),
        }
    }

    /// Sort items over the nodes of a selection. Abstract selections are sorted after the union
    /// of their branches, on hidden entries of the projections.
    pub(super) fn node_sort(
        &self,
        ty: TypeDefinition<'_>,
        arguments: &[SortArgument],
        branches: &mut [Branch],
    ) -> Result<Vec<SortItem>, TranslationError> {
        let mut sort = Vec::new();

        for argument in arguments {
            if argument.scope == SortScope::Edge {
                return Err(TranslationError::invalid_value(
                    "sort.edge",
                    "only connections sort on relationship properties",
                ));
            }

            sort.push(SortItem {
                key: self.node_sort_key(ty, &argument.field, branches)?,
                order: argument.order,
            });
        }

        Ok(sort)
    }

    pub(super) fn node_sort_key(
        &self,
        ty: TypeDefinition<'_>,
        field: &str,
        branches: &mut [Branch],
    ) -> Result<SortKey, TranslationError> {
        let definition = ty
            .field_by_name(field)
            .ok_or_else(|| TranslationError::unknown_field(ty.name(), field))?;

        if !ty.is_abstract() {
            let node = branches.first().map(|branch| branch.node).unwrap_or_else(Variable::root);
            return self.sort_key(definition, node);
        }

        if !definition.is_property() {
            return Err(TranslationError::invalid_value(
                format!("sort.{field}"),
                "only properties sort interfaces and unions",
            ));
        }

        let key = format!("_sort_{field}");
        for branch in branches.iter_mut() {
            hide(&mut branch.projection, &key, definition.database_name());
        }

        Ok(SortKey::Projected(key))
    }

    pub(super) fn sort_key(&self, definition: FieldDefinition<'_>, node: Variable) -> Result<SortKey, TranslationError> {
        match definition.kind {
            FieldKind::Cypher(_) => Ok(SortKey::Computed(Box::new(self.custom_operand(definition, node)?))),
            _ if definition.is_property() => Ok(SortKey::Property(definition.database_name().to_string())),
            _ => Err(TranslationError::invalid_value(
                format!("sort.{}", definition.name()),
                "relationships are not sortable",
            )),
        }
    }

    /// Fields selected on a concrete type. A response key selected several times is projected
    /// once.
    pub(super) fn projection(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        node: Variable,
    ) -> Result<ProjectionPlan, TranslationError> {
        let mut plan = ProjectionPlan::default();

        for subfield in field.fields_for(|condition| applies(ty, condition)) {
            if plan.projection.contains_key(&subfield.response_key) {
                continue;
            }

            let (value, shape) = self.field_value(ty, subfield, node, &mut plan.guards)?;

            plan.projection.fields.push((subfield.response_key.clone(), value));
            plan.shape.push((subfield.response_key.clone(), shape));
        }

        Ok(plan)
    }

    fn field_value(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        node: Variable,
        guards: &mut Vec<Filter>,
    ) -> Result<(FieldValue, Shape), TranslationError> {
        if field.name == "__typename" {
            let value = if ty.is_abstract() {
                let alternatives = ty
                    .possible_types()
                    .map(|member| Ok((member.name().to_string(), self.labels(member)?)))
                    .collect::<Result<_, TranslationError>>()?;

                FieldValue::Typename(alternatives)
            } else {
                FieldValue::Constant(ty.name().to_string())
            };

            return Ok((value, Shape::Value));
        }

        if let Some(definition) = ty.field_by_name(&field.name) {
            guards.extend(self.field_guards(definition, node)?);

            if let Some(relationship) = definition.relationship() {
                let target = relationship.target();
                let traversal = self.traversal(node, relationship, true);
                let single = !relationship.is_many();

                let (selection, shape) = self.selection(target, field, SelectionSource::Traversal(traversal), single)?;
                let shape = if single { shape } else { Shape::List(Box::new(shape)) };

                return Ok((FieldValue::Selection(Box::new(selection)), shape));
            }

            if definition.custom_statement().is_some() {
                let (custom, shape) = self.custom_field(definition, field, Some(node))?;
                let shape = if custom.list { Shape::List(Box::new(shape)) } else { shape };

                return Ok((FieldValue::Custom(Box::new(custom)), shape));
            }

            let format = property_format(definition, field)?;
            return Ok((
                FieldValue::Property {
                    name: definition.database_name().to_string(),
                    format,
                },
                Shape::Value,
            ));
        }

        let aggregate = field
            .name
            .strip_suffix("Aggregate")
            .and_then(|name| ty.field_by_name(name))
            .filter(|definition| definition.relationship().is_some_and(|relationship| relationship.is_aggregable()));

        if let Some(definition) = aggregate {
            let aggregation = self.nested_aggregation(node, definition, field)?;
            return Ok((FieldValue::Aggregate(Box::new(aggregation)), Shape::Value));
        }

        let connection = field
            .name
            .strip_suffix("Connection")
            .and_then(|name| ty.field_by_name(name))
            .and_then(|definition| definition.relationship());

        if let Some(relationship) = connection {
            let traversal = self.traversal(node, relationship, true);
            let (connection, shape) = self.connection(
                relationship.target(),
                field,
                SelectionSource::Traversal(traversal),
                Some(relationship),
            )?;

            return Ok((
                FieldValue::Connection(Box::new(connection)),
                Shape::Connection(Box::new(shape)),
            ));
        }

        Err(TranslationError::unknown_field(ty.name(), &field.name))
    }
}

pub(super) fn property_format(
    definition: FieldDefinition<'_>,
    field: &BoundField,
) -> Result<PropertyFormat, TranslationError> {
    let list = definition.ty.list;

    match definition.scalar_type() {
        Some(scalar) if scalar.is_temporal() => Ok(PropertyFormat::Temporal { list }),
        Some(scalar) if scalar.is_spatial() => {
            let subfields = field
                .selection_set
                .iter()
                .map(|subfield| match subfield.name.as_str() {
                    "__typename" => Ok((subfield.response_key.clone(), PointField::Typename(scalar.to_string()))),
                    name if POINT_FIELDS.contains(&name) => {
                        Ok((subfield.response_key.clone(), PointField::Coordinate(name.to_string())))
                    }
                    name => Err(TranslationError::unknown_field(&scalar.to_string(), name)),
                })
                .collect::<Result<_, _>>()?;

            Ok(PropertyFormat::Point { subfields, list })
        }
        _ => Ok(PropertyFormat::Plain),
    }
}

/// Adds a hidden property entry used for sorting, unless the key is already projected.
pub(super) fn hide(projection: &mut Projection, key: &str, property: &str) {
    if !projection.contains_key(key) {
        projection.fields.push((
            key.to_string(),
            FieldValue::Property {
                name: property.to_string(),
                format: PropertyFormat::Plain,
            },
        ));
    }
}

/// Branches project their own fields, the shape keeps the first one seen for each key.
pub(super) fn merge_shape(into: &mut Vec<(String, Shape)>, from: Vec<(String, Shape)>) {
    for (key, shape) in from {
        if !into.iter().any(|(existing, _)| *existing == key) {
            into.push((key, shape));
        }
    }
}
