use cypher_builder::{Param, Value, Variable};
use graphql_cypher_schema::{
    AuthOperations, CallbackOperations, NestedOperations, Relationship, ScalarType, TypeDefinition,
};
use indexmap::IndexMap;

use super::{filter::object, BuildContext, RootPlan};
use crate::{
    bind::BoundField,
    input::temporal_kind,
    response::{InfoField, MutationField, Shape},
    tree::{
        CreateNode, DeleteNode, Filter, NestedOperation, Projection, PropertyValue, RelatedPattern, Root, UpdateNode,
    },
    AccessMode, InputValue, TranslationError,
};

/// Update suffixes computing the new value from the stored one.
const ARITHMETIC: &[(&str, fn(Param) -> PropertyValue)] = &[
    ("_INCREMENT", PropertyValue::Increment),
    ("_DECREMENT", PropertyValue::Decrement),
    ("_PUSH", PropertyValue::Push),
];

type Properties = Vec<(String, PropertyValue)>;

/// One item of a nested operation: the relationship it goes through, the concrete type it
/// targets, its input and the path of that input.
type RelationshipItem<'s, 'v> = (Relationship<'s>, TypeDefinition<'s>, &'v InputValue, String);

impl BuildContext<'_> {
    /// `createMovies(input: [...]) { movies { ... } info { nodesCreated } }`
    pub(super) fn create(&self, ty: TypeDefinition<'_>, field: &BoundField) -> Result<RootPlan, TranslationError> {
        let input = field
            .argument("input")
            .filter(|input| !input.is_null())
            .ok_or_else(|| TranslationError::MissingArgument {
                field: field.name.clone(),
                argument: "input".to_string(),
            })?;

        let nodes = input
            .items()
            .iter()
            .enumerate()
            .map(|(index, item)| self.create_node(ty, item, &format!("input[{index}]")))
            .collect::<Result<Vec<_>, _>>()?;

        let (projection, predicate, nodes_shape) = self.mutation_projection(ty, field)?;
        let shape = mutation_shape(ty, field, "Create", nodes_shape, &["nodesCreated", "relationshipsCreated"])?;

        Ok(RootPlan {
            root: Root::Create {
                nodes,
                predicate,
                projection,
            },
            shape,
            access_mode: AccessMode::Write,
        })
    }

    /// `updateMovies(where, update, connect, disconnect, create, delete)`
    pub(super) fn update(&self, ty: TypeDefinition<'_>, field: &BoundField) -> Result<RootPlan, TranslationError> {
        let node = Variable::root();
        let where_filter = self.root_where(ty, field, node)?;
        let authorization = self.write_authorization(ty, AuthOperations::UPDATE, node)?;

        let (properties, mut nested) = match field.argument("update").filter(|value| !value.is_null()) {
            Some(update) => self.update_input(ty, node, update, "update")?,
            None => (Vec::new(), Vec::new()),
        };

        if let Some(value) = field.argument("create").filter(|value| !value.is_null()) {
            for (relationship, target, item, path) in self.relationship_items(ty, value, "create")? {
                nested.push(self.nested_create(node, relationship, target, item, &path)?);
            }
        }

        if let Some(value) = field.argument("connect").filter(|value| !value.is_null()) {
            for (relationship, target, item, path) in self.relationship_items(ty, value, "connect")? {
                nested.push(self.nested_connect(node, relationship, target, item, &path)?);
            }
        }

        if let Some(value) = field.argument("disconnect").filter(|value| !value.is_null()) {
            for (relationship, target, item, path) in self.relationship_items(ty, value, "disconnect")? {
                nested.push(self.nested_disconnect(node, relationship, target, item, &path)?);
            }
        }

        if let Some(value) = field.argument("delete").filter(|value| !value.is_null()) {
            for (relationship, target, item, path) in self.relationship_items(ty, value, "delete")? {
                nested.push(self.nested_delete(node, relationship, target, item, &path)?);
            }
        }

        let update = UpdateNode {
            node,
            predicate: Filter::all(
                where_filter
                    .into_iter()
                    .chain(authorization.filter)
                    .chain(authorization.before),
            ),
            properties,
            nested,
            after: authorization.after,
        };

        let (projection, predicate, nodes_shape) = self.mutation_projection(ty, field)?;
        let shape = mutation_shape(
            ty,
            field,
            "Update",
            nodes_shape,
            &["nodesCreated", "nodesDeleted", "relationshipsCreated", "relationshipsDeleted"],
        )?;

        Ok(RootPlan {
            root: Root::Update {
                labels: self.labels(ty)?,
                update,
                predicate,
                projection,
            },
            shape,
            access_mode: AccessMode::Write,
        })
    }

    /// `deleteMovies(where, delete) { nodesDeleted relationshipsDeleted }`
    pub(super) fn delete(&self, ty: TypeDefinition<'_>, field: &BoundField) -> Result<RootPlan, TranslationError> {
        let node = Variable::root();
        let where_filter = self.root_where(ty, field, node)?;
        let authorization = self.write_authorization(ty, AuthOperations::DELETE, node)?;

        let mut nested = Vec::new();
        if let Some(value) = field.argument("delete").filter(|value| !value.is_null()) {
            for (relationship, target, item, path) in self.relationship_items(ty, value, "delete")? {
                nested.push(self.nested_delete(node, relationship, target, item, &path)?);
            }
        }

        let delete = DeleteNode {
            node,
            predicate: Filter::all(
                where_filter
                    .into_iter()
                    .chain(authorization.filter)
                    .chain(authorization.before),
            ),
            nested,
        };

        let shape = Shape::Info(info_fields(field, "DeleteInfo", &["nodesDeleted", "relationshipsDeleted"])?);

        Ok(RootPlan {
            root: Root::Delete {
                labels: self.labels(ty)?,
                delete,
            },
            shape,
            access_mode: AccessMode::Write,
        })
    }

    fn root_where(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
        node: Variable,
    ) -> Result<Option<Filter>, TranslationError> {
        match field.argument("where").filter(|value| !value.is_null()) {
            Some(value) => self.node_filter(node, ty, None, value, "where"),
            None => Ok(None),
        }
    }

    /// The nodes returned by a create or an update are read back like any selection.
    fn mutation_projection(
        &self,
        ty: TypeDefinition<'_>,
        field: &BoundField,
    ) -> Result<(Projection, Option<Filter>, Shape), TranslationError> {
        let node = Variable::root();

        let Some(nodes_field) = field.subfield(&ty.plural) else {
            return Ok((Projection::default(), None, Shape::Object(Vec::new())));
        };

        let plan = self.projection(ty, nodes_field, node)?;
        let authorization = self.read_authorization(ty, AuthOperations::READ, node)?;

        Ok((
            plan.projection,
            Filter::all(authorization.into_iter().chain(plan.guards)),
            Shape::Object(plan.shape),
        ))
    }

    fn create_node(&self, ty: TypeDefinition<'_>, input: &InputValue, path: &str) -> Result<CreateNode, TranslationError> {
        let node = self.names.node();
        let fields = object(input, path)?;

        let (properties, relationships) = self.create_properties(ty, fields, path)?;

        let mut nested = Vec::new();
        for (relationship, value, path) in relationships {
            nested.extend(self.create_relationship_input(node, relationship, value, &path)?);
        }

        // Validations before creating have nothing to check yet, they run with the others once
        // the node exists.
        let authorization = self.write_authorization(ty, AuthOperations::CREATE, node)?;

        Ok(CreateNode {
            node,
            labels: self.labels(ty)?,
            properties,
            nested,
            after: Filter::all(authorization.before.into_iter().chain(authorization.after)),
        })
    }

    /// Properties of a created node or relationship, with the relationship inputs left for the
    /// caller.
    fn create_properties<'s, 'v>(
        &self,
        ty: TypeDefinition<'s>,
        fields: &'v IndexMap<String, InputValue>,
        path: &str,
    ) -> Result<(Properties, Vec<(Relationship<'s>, &'v InputValue, String)>), TranslationError> {
        let mut properties = Vec::new();
        let mut relationships = Vec::new();

        for (key, value) in fields {
            let definition = ty
                .field_by_name(key)
                .ok_or_else(|| TranslationError::unknown_field(&format!("{}CreateInput", ty.name()), key))?;

            if let Some(relationship) = definition.relationship() {
                if !value.is_null() {
                    relationships.push((relationship, value, format!("{path}.{key}")));
                }
            } else if definition.is_property() {
                let param = self.param(value.to_param(definition.scalar_type()));
                properties.push((definition.database_name().to_string(), PropertyValue::Param(param)));
            } else {
                return Err(TranslationError::unknown_field(&format!("{}CreateInput", ty.name()), key));
            }
        }

        self.generated_properties(ty, CallbackOperations::CREATE, fields, &mut properties)?;

        Ok((properties, relationships))
    }

    /// `update: { title: "...", runtime_INCREMENT: 5, actors: [{ where, update, connect, ... }] }`
    fn update_input(
        &self,
        ty: TypeDefinition<'_>,
        node: Variable,
        value: &InputValue,
        path: &str,
    ) -> Result<(Properties, Vec<NestedOperation>), TranslationError> {
        let fields = object(value, path)?;

        let mut properties = Vec::new();
        let mut nested = Vec::new();

        for (key, value) in fields {
            let path = format!("{path}.{key}");

            match ty.field_by_name(key).and_then(|definition| definition.relationship()) {
                Some(_) if value.is_null() => {}
                Some(relationship) => nested.extend(self.update_relationship_input(node, relationship, value, &path)?),
                None => properties.push(self.update_property(ty, key, value, &path)?),
            }
        }

        self.generated_properties(ty, CallbackOperations::UPDATE, fields, &mut properties)?;

        Ok((properties, nested))
    }

    fn update_property(
        &self,
        ty: TypeDefinition<'_>,
        key: &str,
        value: &InputValue,
        path: &str,
    ) -> Result<(String, PropertyValue), TranslationError> {
        let unknown = || TranslationError::unknown_field(&format!("{}UpdateInput", ty.name()), key);

        if let Some(definition) = ty.field_by_name(key) {
            if !definition.is_property() {
                return Err(unknown());
            }

            let param = self.param(value.to_param(definition.scalar_type()));
            return Ok((definition.database_name().to_string(), PropertyValue::Param(param)));
        }

        let (definition, operation, push) = ARITHMETIC
            .iter()
            .find_map(|(suffix, operation)| {
                let name = key.strip_suffix(suffix)?;
                let definition = ty.field_by_name(name).filter(|definition| definition.is_property())?;
                Some((definition, *operation, *suffix == "_PUSH"))
            })
            .ok_or_else(unknown)?;

        if value.is_null() {
            return Err(TranslationError::invalid_value(path, "cannot be null"));
        }

        let scalar = definition.scalar_type();
        let param = if push {
            if !definition.ty.list {
                return Err(unknown());
            }

            Value::List(value.items().iter().map(|item| item.to_param(scalar)).collect())
        } else {
            if definition.ty.list || !scalar.is_some_and(ScalarType::is_numeric) {
                return Err(unknown());
            }

            value.to_param(scalar)
        };

        Ok((definition.database_name().to_string(), operation(self.param(param))))
    }

    /// Values the caller does not provide: generated ids, timestamps, callbacks and defaults.
    fn generated_properties(
        &self,
        ty: TypeDefinition<'_>,
        operation: CallbackOperations,
        input: &IndexMap<String, InputValue>,
        properties: &mut Properties,
    ) -> Result<(), TranslationError> {
        let create = operation == CallbackOperations::CREATE;

        for definition in ty.fields().filter(|definition| definition.is_property()) {
            if input.contains_key(definition.name()) {
                continue;
            }

            let scalar = definition.scalar_type();
            let autogenerated = definition.id.is_some_and(|id| id.autogenerate);

            let value = if create && autogenerated {
                Some(PropertyValue::RandomUuid)
            } else if definition.timestamp.is_some_and(|operations| operations.contains(operation)) {
                let scalar = scalar.filter(|scalar| scalar.is_temporal()).unwrap_or(ScalarType::DateTime);
                Some(PropertyValue::Now(temporal_kind(scalar).function()))
            } else if let Some(populated_by) = definition
                .populated_by
                .as_ref()
                .filter(|populated_by| populated_by.operations.contains(operation))
            {
                let callback = self
                    .ctx
                    .callback(&populated_by.callback)
                    .ok_or_else(|| TranslationError::UnknownCallback(populated_by.callback.clone()))?;

                let parent = serde_json::Value::Object(
                    input
                        .iter()
                        .map(|(key, value)| (key.clone(), value.to_json()))
                        .collect(),
                );
                let computed = InputValue::from(callback(&parent));

                Some(PropertyValue::Param(self.param(computed.to_param(scalar))))
            } else if create {
                definition
                    .default
                    .clone()
                    .map(|default| PropertyValue::Param(self.param(InputValue::from(default).to_param(scalar))))
            } else {
                None
            };

            if let Some(value) = value {
                tracing::trace!(field = definition.name(), "generated property value");
                properties.push((definition.database_name().to_string(), value));
            }
        }

        Ok(())
    }

    /// `actors: { create: [{ node, edge }], connect: [{ where, edge, connect }] }` of a create
    /// input.
    fn create_relationship_input(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        value: &InputValue,
        path: &str,
    ) -> Result<Vec<NestedOperation>, TranslationError> {
        let mut operations = Vec::new();

        for (target, value, path) in per_target(relationship, value, path)? {
            for (key, value) in object(value, &path)? {
                let path = format!("{path}.{key}");

                for (index, item) in value.items().iter().enumerate() {
                    let path = format!("{path}[{index}]");

                    let operation = match key.as_str() {
                        "create" => self.nested_create(parent, relationship, target, item, &path)?,
                        "connect" => self.nested_connect(parent, relationship, target, item, &path)?,
                        _ => return Err(TranslationError::invalid_value(path, "expected create or connect")),
                    };

                    operations.push(operation);
                }
            }
        }

        Ok(operations)
    }

    /// `actors: [{ where, update: { node, edge }, connect, disconnect, create, delete }]` of an
    /// update input.
    fn update_relationship_input(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        value: &InputValue,
        path: &str,
    ) -> Result<Vec<NestedOperation>, TranslationError> {
        let mut operations = Vec::new();

        for (target, value, path) in per_target(relationship, value, path)? {
            for (index, item) in value.items().iter().enumerate() {
                let path = format!("{path}[{index}]");
                let fields = object(item, &path)?;

                for (key, value) in fields {
                    let path = format!("{path}.{key}");

                    match key.as_str() {
                        "where" => {}
                        "update" => operations.push(self.nested_update(
                            parent,
                            relationship,
                            target,
                            fields.get("where"),
                            value,
                            &path,
                        )?),
                        "create" | "connect" | "disconnect" | "delete" => {
                            for (index, item) in value.items().iter().enumerate() {
                                let path = format!("{path}[{index}]");

                                operations.push(match key.as_str() {
                                    "create" => self.nested_create(parent, relationship, target, item, &path)?,
                                    "connect" => self.nested_connect(parent, relationship, target, item, &path)?,
                                    "disconnect" => {
                                        self.nested_disconnect(parent, relationship, target, item, &path)?
                                    }
                                    _ => self.nested_delete(parent, relationship, target, item, &path)?,
                                });
                            }
                        }
                        _ => {
                            return Err(TranslationError::invalid_value(
                                path,
                                "expected where, update, create, connect, disconnect or delete",
                            ))
                        }
                    }
                }
            }
        }

        Ok(operations)
    }

    /// `{ node: { ... }, edge: { ... } }`
    fn nested_create(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        item: &InputValue,
        path: &str,
    ) -> Result<NestedOperation, TranslationError> {
        ensure_allowed(relationship, NestedOperations::CREATE, "create")?;

        let node_input = item
            .get("node")
            .ok_or_else(|| TranslationError::invalid_value(path, "expected a node input"))?;
        let node = self.create_node(target, node_input, &format!("{path}.node"))?;

        let edge_properties = self.edge_create_properties(relationship, item.get("edge"), path)?;

        Ok(NestedOperation::Create {
            traversal: self.traversal(parent, relationship, false),
            relationship: self.names.relationship(),
            edge_properties,
            node,
        })
    }

    /// `{ where: { node: { ... } }, edge: { ... }, connect: { ... } }`
    fn nested_connect(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        item: &InputValue,
        path: &str,
    ) -> Result<NestedOperation, TranslationError> {
        ensure_allowed(relationship, NestedOperations::CONNECT, "connect")?;

        let fields = object(item, path)?;
        let pattern = self.related_pattern(parent, relationship, target, true, false)?;

        let where_filter = match fields
            .get("where")
            .filter(|value| !value.is_null())
            .and_then(|value| value.get("node"))
        {
            Some(node) => self.node_filter(pattern.node, target, None, node, &format!("{path}.where.node"))?,
            None => None,
        };
        let authorization = self.write_authorization(target, AuthOperations::CONNECT, pattern.node)?;

        let edge_properties = self.edge_create_properties(relationship, fields.get("edge"), path)?;

        let mut nested = Vec::new();
        if let Some(value) = fields.get("connect").filter(|value| !value.is_null()) {
            let connect_path = format!("{path}.connect");

            for (relationship, target, item, path) in self.relationship_items(target, value, &connect_path)? {
                nested.push(self.nested_connect(pattern.node, relationship, target, item, &path)?);
            }
        }

        Ok(NestedOperation::Connect {
            predicate: Filter::all(
                where_filter
                    .into_iter()
                    .chain(authorization.filter)
                    .chain(authorization.before)
                    .chain(authorization.after),
            ),
            pattern,
            edge_properties,
            nested,
        })
    }

    /// `{ where: { node, edge } }`
    fn nested_disconnect(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        item: &InputValue,
        path: &str,
    ) -> Result<NestedOperation, TranslationError> {
        ensure_allowed(relationship, NestedOperations::DISCONNECT, "disconnect")?;

        let fields = object(item, path)?;
        let pattern = self.related_pattern(parent, relationship, target, true, false)?;

        if fields.contains_key("disconnect") {
            return Err(TranslationError::invalid_value(
                format!("{path}.disconnect"),
                "disconnecting through a disconnected node is not supported",
            ));
        }

        let where_filter = self.relationship_where(&pattern, relationship, target, fields.get("where"), path)?;
        let authorization = self.write_authorization(target, AuthOperations::DISCONNECT, pattern.node)?;

        Ok(NestedOperation::Disconnect {
            predicate: Filter::all(
                where_filter
                    .into_iter()
                    .chain(authorization.filter)
                    .chain(authorization.before)
                    .chain(authorization.after),
            ),
            pattern,
        })
    }

    /// `update: { node: { ... }, edge: { ... } }`, scoped by the `where` of its item.
    fn nested_update(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        where_value: Option<&InputValue>,
        value: &InputValue,
        path: &str,
    ) -> Result<NestedOperation, TranslationError> {
        ensure_allowed(relationship, NestedOperations::UPDATE, "update")?;

        let fields = object(value, path)?;
        let pattern = self.related_pattern(parent, relationship, target, true, false)?;
        let node = pattern.node;

        let where_filter = self.relationship_where(&pattern, relationship, target, where_value, path)?;
        let authorization = self.write_authorization(target, AuthOperations::UPDATE, node)?;

        let (properties, nested) = match fields.get("node").filter(|value| !value.is_null()) {
            Some(node_input) => self.update_input(target, node, node_input, &format!("{path}.node"))?,
            None => (Vec::new(), Vec::new()),
        };

        let edge_properties = match (fields.get("edge").filter(|value| !value.is_null()), relationship.properties()) {
            (Some(edge), Some(properties)) => {
                let relationship_variable = pattern.relationship.unwrap_or(node);
                self.update_input(properties, relationship_variable, edge, &format!("{path}.edge"))?
                    .0
            }
            (Some(_), None) => {
                return Err(TranslationError::invalid_value(
                    format!("{path}.edge"),
                    "the relationship has no properties",
                ))
            }
            (None, _) => Vec::new(),
        };

        Ok(NestedOperation::Update {
            pattern,
            edge_properties,
            update: UpdateNode {
                node,
                predicate: Filter::all(
                    where_filter
                        .into_iter()
                        .chain(authorization.filter)
                        .chain(authorization.before),
                ),
                properties,
                nested,
                after: authorization.after,
            },
        })
    }

    /// `{ where: { node, edge }, delete: { ... } }`
    fn nested_delete(
        &self,
        parent: Variable,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        item: &InputValue,
        path: &str,
    ) -> Result<NestedOperation, TranslationError> {
        ensure_allowed(relationship, NestedOperations::DELETE, "delete")?;

        let fields = object(item, path)?;
        let pattern = self.related_pattern(parent, relationship, target, true, false)?;
        let node = pattern.node;

        let where_filter = self.relationship_where(&pattern, relationship, target, fields.get("where"), path)?;
        let authorization = self.write_authorization(target, AuthOperations::DELETE, node)?;

        let mut nested = Vec::new();
        if let Some(value) = fields.get("delete").filter(|value| !value.is_null()) {
            let delete_path = format!("{path}.delete");

            for (relationship, target, item, path) in self.relationship_items(target, value, &delete_path)? {
                nested.push(self.nested_delete(node, relationship, target, item, &path)?);
            }
        }

        Ok(NestedOperation::Delete {
            pattern,
            delete: DeleteNode {
                node,
                predicate: Filter::all(
                    where_filter
                        .into_iter()
                        .chain(authorization.filter)
                        .chain(authorization.before),
                ),
                nested,
            },
        })
    }

    /// The `{ node, edge }` filter of a nested update, disconnect or delete.
    fn relationship_where(
        &self,
        pattern: &RelatedPattern,
        relationship: Relationship<'_>,
        target: TypeDefinition<'_>,
        value: Option<&InputValue>,
        path: &str,
    ) -> Result<Option<Filter>, TranslationError> {
        let Some(value) = value.filter(|value| !value.is_null()) else {
            return Ok(None);
        };

        let relationship_variable = pattern.relationship.unwrap_or(pattern.node);
        let branch = relationship.target().is_abstract().then_some(target);

        self.connection_filter(
            pattern.node,
            relationship_variable,
            relationship,
            branch,
            value,
            &format!("{path}.where"),
        )
    }

    fn edge_create_properties(
        &self,
        relationship: Relationship<'_>,
        value: Option<&InputValue>,
        path: &str,
    ) -> Result<Properties, TranslationError> {
        let value = value.filter(|value| !value.is_null());

        let Some(properties) = relationship.properties() else {
            return match value {
                Some(_) => Err(TranslationError::invalid_value(
                    format!("{path}.edge"),
                    "the relationship has no properties",
                )),
                None => Ok(Vec::new()),
            };
        };

        let empty = IndexMap::new();
        let fields = match value {
            Some(value) => object(value, &format!("{path}.edge"))?,
            None => &empty,
        };

        Ok(self.create_properties(properties, fields, &format!("{path}.edge"))?.0)
    }

    /// `{ actors: [...], director: {...} }`, flattened to one entry per item.
    fn relationship_items<'s, 'v>(
        &self,
        ty: TypeDefinition<'s>,
        value: &'v InputValue,
        path: &str,
    ) -> Result<Vec<RelationshipItem<'s, 'v>>, TranslationError> {
        let mut items = Vec::new();

        for (key, value) in object(value, path)? {
            let relationship = ty
                .field_by_name(key)
                .and_then(|definition| definition.relationship())
                .ok_or_else(|| TranslationError::unknown_field(ty.name(), key))?;

            for (target, value, path) in per_target(relationship, value, &format!("{path}.{key}"))? {
                for (index, item) in value.items().iter().enumerate() {
                    items.push((relationship, target, item, format!("{path}[{index}]")));
                }
            }
        }

        Ok(items)
    }
}

/// Inputs through a relationship towards an interface or a union are keyed by the concrete
/// type they write, `{ Movie: ..., Series: ... }`.
fn per_target<'s, 'v>(
    relationship: Relationship<'s>,
    value: &'v InputValue,
    path: &str,
) -> Result<Vec<(TypeDefinition<'s>, &'v InputValue, String)>, TranslationError> {
    let target = relationship.target();

    if !target.is_abstract() {
        return Ok(vec![(target, value, path.to_string())]);
    }

    object(value, path)?
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let member = target
                .possible_types()
                .find(|member| member.name() == name)
                .ok_or_else(|| TranslationError::unknown_field(target.name(), name))?;

            Ok((member, value, format!("{path}.{name}")))
        })
        .collect()
}

fn ensure_allowed(
    relationship: Relationship<'_>,
    operation: NestedOperations,
    name: &'static str,
) -> Result<(), TranslationError> {
    if relationship.allows(operation) {
        return Ok(());
    }

    let field = relationship.field();

    Err(TranslationError::NestedOperationNotAllowed {
        ty: field.parent().name().to_string(),
        field: field.name().to_string(),
        operation: name,
    })
}

fn mutation_shape(
    ty: TypeDefinition<'_>,
    field: &BoundField,
    verb: &str,
    nodes_shape: Shape,
    counters: &[&str],
) -> Result<Shape, TranslationError> {
    let typename = format!("{verb}{}MutationResponse", ty.pascal_plural());
    let mut fields = Vec::new();

    for subfield in &field.selection_set {
        let value = match subfield.name.as_str() {
            "info" => MutationField::Info(info_fields(subfield, &format!("{verb}Info"), counters)?),
            "__typename" => MutationField::Typename(typename.clone()),
            name if name == ty.plural => MutationField::Nodes(nodes_shape.clone()),
            name => return Err(TranslationError::unknown_field(&typename, name)),
        };

        fields.push((subfield.response_key.clone(), value));
    }

    Ok(Shape::Mutation(fields))
}

fn info_fields(field: &BoundField, typename: &str, counters: &[&str]) -> Result<Vec<(String, InfoField)>, TranslationError> {
    field
        .selection_set
        .iter()
        .map(|subfield| {
            let value = match subfield.name.as_str() {
                "__typename" => InfoField::Typename(typename.to_string()),
                name if !counters.contains(&name) => return Err(TranslationError::unknown_field(typename, name)),
                "nodesCreated" => InfoField::NodesCreated,
                "nodesDeleted" => InfoField::NodesDeleted,
                "relationshipsCreated" => InfoField::RelationshipsCreated,
                "relationshipsDeleted" => InfoField::RelationshipsDeleted,
                name => return Err(TranslationError::unknown_field(typename, name)),
            };

            Ok((subfield.response_key.clone(), value))
        })
        .collect()
}
