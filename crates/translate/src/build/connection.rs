use cypher_builder::{Value, Variable};
use graphql_cypher_schema::{AuthOperations, ComparisonOperator, Relationship, TypeDefinition};
use inflector::Inflector;

use super::{
    arguments::{Pagination, SortScope},
    filter::object,
    read::{hide, merge_shape, ProjectionPlan, SelectionSource},
    BuildContext,
};
use crate::{
    bind::BoundField,
    response::{ConnectionField, ConnectionShape, EdgeField, PageInfoField, Shape},
    tree::{
        Branch, Connection, FieldValue, Filter, FulltextEntry, Operand, Projection, Root, Selection, SortItem, SortKey,
        Source,
    },
    InputValue, TranslationError,
};

/// Neighbours returned by a vector index without `first`.
const DEFAULT_NEIGHBOURS: i64 = 4;

#[derive(Clone, Copy)]
enum ConnectionKind<'a> {
    /// `moviesConnection`
    Root,
    /// `actorsConnection` on a movie.
    Relationship(Relationship<'a>),
    /// A vector index query.
    Vector,
}

struct ConnectionNames {
    connection: String,
    edge: String,
}

impl BuildContext<'_> {
    /// A root or relationship connection, `relationship` being set for the latter.
    pub(super) fn connection(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        source: SelectionSource,
        relationship: Option<Relationship<'_>>,
    ) -> Result<(Connection, ConnectionShape), TranslationError> {
        let pagination = Pagination::from_connection(field)?;

        let (source, kind) = match (source, relationship) {
            (SelectionSource::Traversal(traversal), Some(relationship)) => {
                (Source::Traversal(traversal), ConnectionKind::Relationship(relationship))
            }
            (SelectionSource::Traversal(traversal), None) => (Source::Traversal(traversal), ConnectionKind::Root),
            (SelectionSource::Root, _) => (Source::Labels, ConnectionKind::Root),
        };

        self.build_connection(ty, field, source, kind, pagination)
    }

    /// `movieSearch(phrase: "...", where: { score: { min: 0.5 }, movie: { ... } })`, one row per
    /// result.
    pub(super) fn fulltext(
        &self,
        ty: TypeDefinition<'_>,
        index: usize,
        field: &BoundField,
    ) -> Result<(Root, Shape), TranslationError> {
        let index = ty
            .fulltext_indexes
            .get(index)
            .ok_or_else(|| TranslationError::unknown_field("Query", &field.name))?;

        let phrase = field
            .argument("phrase")
            .and_then(InputValue::as_str)
            .ok_or_else(|| TranslationError::MissingArgument {
                field: field.name.clone(),
                argument: "phrase".to_string(),
            })?;

        let pagination = Pagination::from_field(field)?;
        let score = self.names.plain();
        let node = Variable::root();
        let singular = ty.singular();
        let typename = format!("{}FulltextResult", ty.name());

        let mut plan = ProjectionPlan::default();
        let mut entries = Vec::new();
        let mut shape = Vec::new();

        for subfield in &field.selection_set {
            let (entry, entry_shape) = match subfield.name.as_str() {
                "score" => (FulltextEntry::Score, Shape::Value),
                "__typename" => (FulltextEntry::Constant(typename.clone()), Shape::Value),
                name if name == singular => {
                    plan = self.projection(ty, subfield, node)?;
                    (FulltextEntry::Node, Shape::Object(plan.shape.clone()))
                }
                name => return Err(TranslationError::unknown_field(&typename, name)),
            };

            entries.push((subfield.response_key.clone(), entry));
            shape.push((subfield.response_key.clone(), entry_shape));
        }

        let where_filter = match field.argument("where").filter(|value| !value.is_null()) {
            Some(value) => self.index_filter(node, ty, score, &singular, value)?,
            None => None,
        };
        let authorization = self.read_authorization(ty, AuthOperations::READ, node)?;

        let mut branches = vec![Branch {
            node,
            relationship: self.names.relationship(),
            labels: self.labels(ty)?,
            predicate: Filter::all(where_filter.into_iter().chain(authorization).chain(plan.guards)),
            gate: None,
            projection: plan.projection,
            edge_projection: None,
        }];

        let mut sort = Vec::new();
        for argument in &pagination.sort {
            let key = match argument.scope {
                SortScope::Score => SortKey::Score(score),
                SortScope::Node => self.node_sort_key(ty, &argument.field, &mut branches)?,
                SortScope::Edge => {
                    return Err(TranslationError::invalid_value(
                        "sort.edge",
                        "only connections sort on relationship properties",
                    ))
                }
            };

            sort.push(SortItem {
                key,
                order: argument.order,
            });
        }

        let selection = Selection {
            source: Source::Fulltext {
                index_name: index.index_name.clone(),
                phrase: self.param(phrase),
                score,
            },
            branches,
            is_abstract: false,
            sort,
            offset: pagination.offset.map(|offset| self.param(offset)),
            limit: self.limit(ty, pagination.limit).map(|limit| self.param(limit)),
            single: false,
        };

        Ok((
            Root::Fulltext { selection, entries },
            Shape::Rows(Box::new(Shape::Object(shape))),
        ))
    }

    /// `moviesVector(vector: [...], first: 10)`, a connection over the nearest neighbours.
    pub(super) fn vector(
        &self,
        ty: TypeDefinition<'_>,
        index: usize,
        field: &BoundField,
    ) -> Result<(Connection, ConnectionShape), TranslationError> {
        let index = ty
            .vector_indexes
            .get(index)
            .ok_or_else(|| TranslationError::unknown_field("Query", &field.name))?;

        let vector = field
            .argument("vector")
            .filter(|value| !value.is_null())
            .ok_or_else(|| TranslationError::MissingArgument {
                field: field.name.clone(),
                argument: "vector".to_string(),
            })?;

        if vector.items().iter().any(|item| !matches!(item, InputValue::Int(_) | InputValue::Float(_))) {
            return Err(TranslationError::invalid_value("vector", "expected a list of floats"));
        }

        let pagination = Pagination::from_connection(field)?;

        let first = pagination
            .limit
            .or_else(|| ty.limit.and_then(|limit| limit.default).map(i64::from))
            .unwrap_or(DEFAULT_NEIGHBOURS);
        let neighbours = first + pagination.offset.unwrap_or_default();

        let source = Source::Vector {
            index_name: index.index_name.clone(),
            neighbours: self.param(neighbours),
            vector: self.param(Value::from(vector)),
            score: self.names.plain(),
        };

        self.build_connection(ty, field, source, ConnectionKind::Vector, pagination)
    }

    fn build_connection(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        source: Source,
        kind: ConnectionKind<'_>,
        pagination: Pagination,
    ) -> Result<(Connection, ConnectionShape), TranslationError> {
        let is_abstract = ty.is_abstract();
        let is_root = !matches!(source, Source::Traversal(_));
        let score = source.score();
        let names = self.connection_names(ty, kind);

        let filter = field.argument("where").filter(|value| !value.is_null());
        let edges_field = field.subfield("edges");
        let node_field = edges_field.and_then(|edges| edges.subfield("node"));
        let properties_field = edges_field.and_then(|edges| edges.subfield("properties"));

        let mut branches = Vec::new();
        let mut node_shape = Vec::new();
        let mut properties_shape = Vec::new();

        for member in ty.possible_types() {
            let node = if is_root && !is_abstract {
                Variable::root()
            } else {
                self.names.node()
            };
            let relationship_variable = self.names.relationship();
            let branch_type = is_abstract.then_some(member);

            let mut plan = match node_field {
                Some(node_field) => self.projection(member, node_field, node)?,
                None => ProjectionPlan::default(),
            };

            let edge_plan = match (properties_field, kind) {
                (Some(properties_field), ConnectionKind::Relationship(relationship)) => {
                    let properties = relationship
                        .properties()
                        .ok_or_else(|| TranslationError::unknown_field(&names.edge, "properties"))?;
                    Some(self.projection(properties, properties_field, relationship_variable)?)
                }
                (Some(_), _) => return Err(TranslationError::unknown_field(&names.edge, "properties")),
                (None, _) => None,
            };

            let where_filter = match (filter, kind, score) {
                (None, _, _) => None,
                (Some(filter), ConnectionKind::Relationship(relationship), _) => {
                    self.connection_filter(node, relationship_variable, relationship, branch_type, filter, "where")?
                }
                (Some(filter), ConnectionKind::Vector, Some(score)) => {
                    self.index_filter(node, ty, score, "node", filter)?
                }
                (Some(filter), _, _) => self.node_filter(node, ty, branch_type, filter, "where")?,
            };
            let authorization = self.member_authorization(member, is_abstract.then_some(ty), node)?;

            if is_abstract {
                plan.projection
                    .fields
                    .insert(0, ("__resolveType".to_string(), FieldValue::Constant(member.name().to_string())));
            }

            merge_shape(&mut node_shape, plan.shape);

            let mut guards = plan.guards;
            let edge_projection = edge_plan.map(|edge_plan| {
                merge_shape(&mut properties_shape, edge_plan.shape);
                guards.extend(edge_plan.guards);
                edge_plan.projection
            });

            branches.push(Branch {
                node,
                relationship: relationship_variable,
                labels: self.labels(member)?,
                predicate: Filter::all(where_filter.into_iter().chain(authorization.filter).chain(guards)),
                gate: authorization.gate,
                projection: plan.projection,
                edge_projection,
            });
        }

        let mut sort = Vec::new();
        for argument in &pagination.sort {
            let key = match (argument.scope, score) {
                (SortScope::Score, Some(score)) => SortKey::Score(score),
                (SortScope::Edge, _) => self.edge_sort_key(kind, &argument.field, &mut branches, is_abstract)?,
                _ => self.node_sort_key(ty, &argument.field, &mut branches)?,
            };

            sort.push(SortItem {
                key,
                order: argument.order,
            });
        }

        let shape = connection_shape(
            field,
            &names,
            score.is_some(),
            pagination.offset.unwrap_or_default() as usize,
            node_shape,
            properties_shape,
        )?;

        let selection = Selection {
            source,
            branches,
            is_abstract,
            sort,
            offset: pagination.offset.map(|offset| self.param(offset)),
            limit: self.limit(ty, pagination.limit).map(|limit| self.param(limit)),
            single: false,
        };

        Ok((Connection { selection }, shape))
    }

    fn connection_names(&self, ty: TypeDefinition<'_>, kind: ConnectionKind<'_>) -> ConnectionNames {
        match kind {
            ConnectionKind::Root => ConnectionNames {
                connection: format!("{}Connection", ty.pascal_plural()),
                edge: format!("{}Edge", ty.name()),
            },
            ConnectionKind::Relationship(relationship) => {
                let field = relationship.field();
                let prefix = format!("{}{}", field.parent().name(), field.name().to_pascal_case());

                ConnectionNames {
                    connection: format!("{prefix}Connection"),
                    edge: format!("{prefix}Relationship"),
                }
            }
            ConnectionKind::Vector => ConnectionNames {
                connection: format!("{}VectorConnection", ty.pascal_plural()),
                edge: format!("{}VectorEdge", ty.name()),
            },
        }
    }

    fn edge_sort_key(
        &self,
        kind: ConnectionKind<'_>,
        field: &str,
        branches: &mut [Branch],
        is_abstract: bool,
    ) -> Result<SortKey, TranslationError> {
        let properties = match kind {
            ConnectionKind::Relationship(relationship) => relationship.properties(),
            _ => None,
        }
        .ok_or_else(|| {
            TranslationError::invalid_value(format!("sort.edge.{field}"), "the relationship has no properties")
        })?;

        let definition = properties
            .field_by_name(field)
            .filter(|definition| definition.is_property())
            .ok_or_else(|| TranslationError::unknown_field(properties.name(), field))?;

        if !is_abstract {
            return Ok(SortKey::EdgeProperty(definition.database_name().to_string()));
        }

        let key = format!("_sort_{field}");
        for branch in branches.iter_mut() {
            let projection = branch.edge_projection.get_or_insert_with(Projection::default);
            hide(projection, &key, definition.database_name());
        }

        Ok(SortKey::EdgeProjected(key))
    }

    /// `{ score: { min, max }, <node>: { ... } }` of an index query.
    fn index_filter(
        &self,
        node: Variable,
        ty: TypeDefinition<'_>,
        score: Variable,
        node_key: &str,
        value: &InputValue,
    ) -> Result<Option<Filter>, TranslationError> {
        let mut filters = Vec::new();

        for (key, value) in object(value, "where")? {
            let path = format!("where.{key}");

            match key.as_str() {
                "score" => {
                    for (bound, value) in object(value, &path)? {
                        let operator = match bound.as_str() {
                            "min" => ComparisonOperator::GreaterThanOrEqual,
                            "max" => ComparisonOperator::LessThanOrEqual,
                            _ => {
                                return Err(TranslationError::InvalidFilter {
                                    ty: "FloatWhere".to_string(),
                                    key: bound.clone(),
                                })
                            }
                        };

                        if value.is_null() {
                            continue;
                        }

                        filters.push(Filter::Compare {
                            left: Operand::Variable(score),
                            operator,
                            right: Operand::Param(self.param(value)),
                        });
                    }
                }
                key if key == node_key => filters.extend(self.node_filter(node, ty, None, value, &path)?),
                _ => {
                    return Err(TranslationError::InvalidFilter {
                        ty: ty.name().to_string(),
                        key: key.clone(),
                    })
                }
            }
        }

        Ok(Filter::all(filters))
    }
}

fn connection_shape(
    field: &BoundField,
    names: &ConnectionNames,
    has_score: bool,
    offset: usize,
    node_shape: Vec<(String, Shape)>,
    properties_shape: Vec<(String, Shape)>,
) -> Result<ConnectionShape, TranslationError> {
    let mut fields = Vec::new();

    for subfield in &field.selection_set {
        let value = match subfield.name.as_str() {
            "totalCount" => ConnectionField::TotalCount,
            "__typename" => ConnectionField::Typename(names.connection.clone()),
            "pageInfo" => ConnectionField::PageInfo(
                subfield
                    .selection_set
                    .iter()
                    .map(|info| {
                        let value = match info.name.as_str() {
                            "hasNextPage" => PageInfoField::HasNextPage,
                            "hasPreviousPage" => PageInfoField::HasPreviousPage,
                            "startCursor" => PageInfoField::StartCursor,
                            "endCursor" => PageInfoField::EndCursor,
                            "__typename" => PageInfoField::Typename,
                            name => return Err(TranslationError::unknown_field("PageInfo", name)),
                        };

                        Ok((info.response_key.clone(), value))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            "edges" => ConnectionField::Edges(
                subfield
                    .selection_set
                    .iter()
                    .map(|edge| {
                        let value = match edge.name.as_str() {
                            "cursor" => EdgeField::Cursor,
                            "node" => EdgeField::Node(Shape::Object(node_shape.clone())),
                            "properties" => EdgeField::Properties(Shape::Object(properties_shape.clone())),
                            "score" if has_score => EdgeField::Score,
                            "__typename" => EdgeField::Typename(names.edge.clone()),
                            name => return Err(TranslationError::unknown_field(&names.edge, name)),
                        };

                        Ok((edge.response_key.clone(), value))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            name => return Err(TranslationError::unknown_field(&names.connection, name)),
        };

        fields.push((subfield.response_key.clone(), value));
    }

    Ok(ConnectionShape { offset, fields })
}
