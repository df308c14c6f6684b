mod directives;
mod error;
mod sdl;

use std::collections::{HashMap, HashSet};

use cynic_parser::type_system as ast;

pub use error::*;

use crate::*;
use sdl::*;

const QUERY_TYPE: &str = "Query";
const MUTATION_TYPE: &str = "Mutation";

pub(crate) fn build(sdl: &str) -> Result<Schema, SchemaErrors> {
    let document = cynic_parser::parse_type_system_document(sdl).map_err(|err| {
        SchemaErrors(vec![SchemaError::new(
            Vec::<String>::new(),
            SchemaErrorKind::Parse(err.to_string()),
        )])
    })?;

    let mut builder = SchemaBuilder::default();

    // Types are registered first, so that fields and directives can reference any of them.
    builder.ingest_definitions(&document);
    builder.ingest_fields(&document);
    builder.ingest_type_directives(&document);
    builder.ingest_field_authorization(&document);
    builder.finalize();

    let SchemaBuilder { schema, errors, .. } = builder;

    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "schema build failed");
        return Err(SchemaErrors(errors));
    }

    tracing::debug!(
        types = schema.type_definitions.len(),
        fields = schema.field_definitions.len(),
        relationships = schema.relationships.len(),
        "schema built"
    );

    Ok(schema)
}

pub(crate) struct SchemaBuilder {
    schema: Schema,
    scalars: HashSet<String>,
    errors: Vec<SchemaError>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self {
            schema: Schema {
                type_definitions: Vec::new(),
                field_definitions: Vec::new(),
                argument_definitions: Vec::new(),
                relationships: Vec::new(),
                custom_statements: Vec::new(),
                type_by_name: HashMap::new(),
                enums: HashMap::new(),
                query_fields: HashMap::new(),
                mutation_fields: HashMap::new(),
                jwt_claims: HashMap::new(),
            },
            scalars: HashSet::new(),
            errors: Vec::new(),
        }
    }
}

fn type_definitions(document: &ast::TypeSystemDocument) -> impl Iterator<Item = (ast::TypeDefinition<'_>, bool)> + '_ {
    document.definitions().filter_map(|definition| match definition {
        ast::Definition::Type(ty) => Some((ty, false)),
        ast::Definition::TypeExtension(ty) => Some((ty, true)),
        _ => None,
    })
}

impl SchemaBuilder {
    fn error<S: ToString>(&mut self, path: impl IntoIterator<Item = S>, kind: SchemaErrorKind) {
        self.errors.push(SchemaError::new(path, kind));
    }

    fn ingest_definitions(&mut self, document: &ast::TypeSystemDocument) {
        for (definition, is_extension) in type_definitions(document) {
            if is_extension {
                continue;
            }

            let name = definition.name();

            let kind = match definition {
                ast::TypeDefinition::Enum(enum_type) => {
                    let values = enum_type.values().map(|value| value.value().to_string()).collect();
                    self.schema.enums.insert(name.to_string(), values);
                    continue;
                }
                ast::TypeDefinition::Scalar(_) => {
                    self.scalars.insert(name.to_string());
                    continue;
                }
                ast::TypeDefinition::InputObject(_) => continue,
                ast::TypeDefinition::Object(_) if name == QUERY_TYPE || name == MUTATION_TYPE => TypeKind::Root,
                ast::TypeDefinition::Object(_) => {
                    let directives: Vec<_> = definition.directives().collect();

                    if find_directive(directives.iter().copied(), "relationshipProperties").is_some() {
                        TypeKind::RelationshipProperties
                    } else if find_directive(directives.iter().copied(), "jwt").is_some() {
                        TypeKind::Jwt
                    } else {
                        TypeKind::Node
                    }
                }
                ast::TypeDefinition::Interface(_) => TypeKind::Interface,
                ast::TypeDefinition::Union(_) => TypeKind::Union,
            };

            if self.schema.type_by_name.contains_key(name) {
                self.error(
                    [name],
                    SchemaErrorKind::UnsupportedType(format!("`{name}` is defined more than once")),
                );
                continue;
            }

            let id = TypeDefinitionId::from(self.schema.type_definitions.len());
            self.schema.type_definitions.push(TypeDefinitionRecord {
                name: name.to_string(),
                kind,
                description: definition.description().map(|description| description.to_cow().into_owned()),
                labels: vec![LabelExpression::Literal(name.to_string())],
                field_ids: Vec::new(),
                interface_ids: Vec::new(),
                possible_type_ids: Vec::new(),
                authorization: None,
                authentication: None,
                limit: None,
                fulltext_indexes: Vec::new(),
                vector_indexes: Vec::new(),
                operations: ResolverOperations::default(),
                plural: root_plural(name, None),
            });
            self.schema.type_by_name.insert(name.to_string(), id);
        }
    }

    fn ingest_fields(&mut self, document: &ast::TypeSystemDocument) {
        for (definition, _) in type_definitions(document) {
            let Some(type_id) = self.schema.type_by_name.get(definition.name()).copied() else {
                continue;
            };

            match definition {
                ast::TypeDefinition::Object(object) => {
                    let interfaces: Vec<&str> = object.implements_interfaces().collect();
                    self.ingest_implemented_interfaces(type_id, &interfaces);

                    for field in object.fields() {
                        self.ingest_field(type_id, field);
                    }
                }
                ast::TypeDefinition::Interface(interface) => {
                    let interfaces: Vec<&str> = interface.implements_interfaces().collect();
                    self.ingest_implemented_interfaces(type_id, &interfaces);

                    for field in interface.fields() {
                        self.ingest_field(type_id, field);
                    }
                }
                ast::TypeDefinition::Union(union) => {
                    for member in union.members() {
                        match self.schema.type_by_name.get(member.name()).copied() {
                            Some(member_id) if self.schema[member_id].kind == TypeKind::Node => {
                                self.schema[type_id].possible_type_ids.push(member_id);
                            }
                            Some(_) => self.error(
                                [definition.name()],
                                SchemaErrorKind::UnsupportedType(format!(
                                    "union member `{}` must be a node type",
                                    member.name()
                                )),
                            ),
                            None => self.error(
                                [definition.name()],
                                SchemaErrorKind::UnknownType(member.name().to_string()),
                            ),
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn ingest_implemented_interfaces(&mut self, type_id: TypeDefinitionId, interfaces: &[&str]) {
        for interface in interfaces {
            let Some(interface_id) = self.schema.type_by_name.get(*interface).copied() else {
                let name = self.schema[type_id].name.clone();
                self.error([name], SchemaErrorKind::UnknownType(interface.to_string()));
                continue;
            };

            self.schema[type_id].interface_ids.push(interface_id);

            if self.schema[type_id].kind == TypeKind::Node {
                self.schema[interface_id].possible_type_ids.push(type_id);
            }
        }
    }

    fn ingest_field(&mut self, parent_id: TypeDefinitionId, field: ast::FieldDefinition<'_>) {
        let parent_name = self.schema[parent_id].name.clone();
        let parent_kind = self.schema[parent_id].kind;
        let name = field.name();

        let ty = match field_type(field.ty()) {
            Ok(ty) => ty,
            Err(message) => {
                self.error([parent_name.as_str(), name], SchemaErrorKind::UnsupportedType(message));
                return;
            }
        };

        let directives: Vec<ast::Directive<'_>> = field.directives().collect();
        let field_id = FieldDefinitionId::from(self.schema.field_definitions.len());

        let kind = if let Some(directive) = find_directive(directives.iter().copied(), "relationship") {
            match self.ingest_relationship(field_id, parent_id, name, &ty, directive) {
                Some(relationship_id) => FieldKind::Relationship(relationship_id),
                None => return,
            }
        } else if let Some(directive) = find_directive(directives.iter().copied(), "cypher") {
            match self.ingest_custom_statement(field_id, &parent_name, name, directive) {
                Some(statement_id) => FieldKind::Cypher(statement_id),
                None => return,
            }
        } else if parent_kind == TypeKind::Root {
            tracing::debug!(field = name, "skipping root field without custom statement");
            return;
        } else if let Ok(scalar) = ty.name.parse::<ScalarType>() {
            FieldKind::Scalar(scalar)
        } else if self.schema.enums.contains_key(&ty.name) {
            FieldKind::Enum
        } else if self.scalars.contains(&ty.name) {
            FieldKind::CustomScalar
        } else if self.schema.type_by_name.contains_key(&ty.name) {
            self.error(
                [parent_name.as_str(), name],
                SchemaErrorKind::MissingRelationship(ty.name.clone()),
            );
            return;
        } else {
            self.error([parent_name.as_str(), name], SchemaErrorKind::UnknownType(ty.name.clone()));
            return;
        };

        if parent_kind == TypeKind::RelationshipProperties && !matches!(kind, FieldKind::Scalar(_) | FieldKind::Enum | FieldKind::CustomScalar) {
            self.error(
                [parent_name.as_str(), name],
                SchemaErrorKind::UnsupportedType("relationship properties can only hold scalars".to_string()),
            );
            return;
        }

        let mut argument_ids = Vec::new();
        for argument in field.arguments() {
            match field_type(argument.ty()) {
                Ok(ty) => {
                    argument_ids.push(ArgumentDefinitionId::from(self.schema.argument_definitions.len()));
                    self.schema.argument_definitions.push(ArgumentDefinitionRecord {
                        name: argument.name().to_string(),
                        ty,
                        default: argument.default_value().map(const_value_to_json),
                    });
                }
                Err(message) => self.error(
                    [parent_name.as_str(), name, argument.name()],
                    SchemaErrorKind::UnsupportedType(message),
                ),
            }
        }

        let mut record = FieldDefinitionRecord {
            name: name.to_string(),
            parent_id,
            ty,
            kind,
            description: field.description().map(|description| description.to_cow().into_owned()),
            database_name: name.to_string(),
            argument_ids,
            id: None,
            unique: false,
            default: None,
            populated_by: None,
            timestamp: None,
            authorization: None,
            authentication: None,
        };

        self.ingest_field_directives(&mut record, &parent_name, &directives);

        if parent_kind == TypeKind::Jwt {
            if let Some(directive) = find_directive(directives.iter().copied(), "jwtClaim") {
                let arguments = directive_arguments(directive);
                match arguments.get("path").and_then(|path| path.as_str()) {
                    Some(path) => {
                        self.schema.jwt_claims.insert(name.to_string(), path.to_string());
                    }
                    None => self.error(
                        [parent_name.as_str(), name, "@jwtClaim", "path"],
                        SchemaErrorKind::InvalidDirective {
                            directive: "jwtClaim",
                            message: "`path` must be a string".to_string(),
                        },
                    ),
                }
            }
        }

        self.schema.field_definitions.push(record);
        self.schema[parent_id].field_ids.push(field_id);
    }

    fn ingest_type_directives(&mut self, document: &ast::TypeSystemDocument) {
        for (definition, _) in type_definitions(document) {
            let Some(type_id) = self.schema.type_by_name.get(definition.name()).copied() else {
                continue;
            };

            let directives: Vec<ast::Directive<'_>> = definition.directives().collect();
            self.ingest_type_level_directives(type_id, &directives);
        }
    }

    fn ingest_field_authorization(&mut self, document: &ast::TypeSystemDocument) {
        for (definition, _) in type_definitions(document) {
            let Some(type_id) = self.schema.type_by_name.get(definition.name()).copied() else {
                continue;
            };

            let fields: Vec<ast::FieldDefinition<'_>> = match definition {
                ast::TypeDefinition::Object(object) => object.fields().collect(),
                ast::TypeDefinition::Interface(interface) => interface.fields().collect(),
                _ => continue,
            };

            for field in fields {
                let Some(field_id) = self.schema.walk(type_id).field_by_name(field.name()).map(|field| field.id())
                else {
                    continue;
                };

                let directives: Vec<ast::Directive<'_>> = field.directives().collect();
                self.ingest_field_auth_directives(type_id, field_id, &directives);
            }
        }
    }

    fn finalize(&mut self) {
        for index in 0..self.schema.relationships.len() {
            let id = RelationshipId::from(index);
            let target = self.schema.walk(self.schema[id].target_id);
            let aggregable = target.is_node()
                || (target.is_abstract()
                    && !target.possible_type_ids.is_empty()
                    && target.possible_types().all(|member| member.is_node()));
            self.schema[id].aggregable = aggregable;
        }

        let mut index_names = HashSet::new();
        let mut query_fields = Vec::new();
        let mut mutation_fields = Vec::new();

        for index in 0..self.schema.type_definitions.len() {
            let ty = self.schema.walk(TypeDefinitionId::from(index));
            let id = ty.id();
            let operations = ty.operations;
            let plural = ty.plural.clone();
            let pascal = ty.pascal_plural();

            for name in ty
                .fulltext_indexes
                .iter()
                .map(|index| &index.index_name)
                .chain(ty.vector_indexes.iter().map(|index| &index.index_name))
            {
                if !index_names.insert(name.clone()) {
                    self.errors.push(SchemaError::new(
                        [ty.name()],
                        SchemaErrorKind::DuplicateIndex(name.clone()),
                    ));
                }
            }

            match ty.kind {
                TypeKind::Node => {
                    if operations.contains(ResolverOperations::READ) {
                        query_fields.push((plural.clone(), RootField::Read(id)));
                        query_fields.push((format!("{plural}Connection"), RootField::Connection(id)));

                        for (index, fulltext) in ty.fulltext_indexes.iter().enumerate() {
                            query_fields.push((fulltext.query_name.clone(), RootField::Fulltext { ty: id, index }));
                        }

                        for (index, vector) in ty.vector_indexes.iter().enumerate() {
                            query_fields.push((vector.query_name.clone(), RootField::Vector { ty: id, index }));
                        }
                    }
                    if operations.contains(ResolverOperations::AGGREGATE) {
                        query_fields.push((format!("{plural}Aggregate"), RootField::Aggregate(id)));
                    }
                    if operations.contains(ResolverOperations::CREATE) {
                        mutation_fields.push((format!("create{pascal}"), RootField::Create(id)));
                    }
                    if operations.contains(ResolverOperations::UPDATE) {
                        mutation_fields.push((format!("update{pascal}"), RootField::Update(id)));
                    }
                    if operations.contains(ResolverOperations::DELETE) {
                        mutation_fields.push((format!("delete{pascal}"), RootField::Delete(id)));
                    }
                }
                TypeKind::Interface => {
                    if operations.contains(ResolverOperations::READ) {
                        query_fields.push((plural.clone(), RootField::Read(id)));
                        query_fields.push((format!("{plural}Connection"), RootField::Connection(id)));
                    }
                    if operations.contains(ResolverOperations::AGGREGATE) {
                        query_fields.push((format!("{plural}Aggregate"), RootField::Aggregate(id)));
                    }
                }
                TypeKind::Union => {
                    if operations.contains(ResolverOperations::READ) {
                        query_fields.push((plural.clone(), RootField::Read(id)));
                    }
                }
                TypeKind::Root => {
                    let target = if ty.name() == QUERY_TYPE {
                        &mut query_fields
                    } else {
                        &mut mutation_fields
                    };

                    for field in ty.fields() {
                        target.push((field.name().to_string(), RootField::Custom(field.id())));
                    }
                }
                TypeKind::RelationshipProperties | TypeKind::Jwt => {}
            }
        }

        for (name, field) in query_fields {
            if self.schema.query_fields.insert(name.clone(), field).is_some() {
                self.error([QUERY_TYPE, name.as_str()], SchemaErrorKind::DuplicateRootField(name.clone()));
            }
        }

        for (name, field) in mutation_fields {
            if self.schema.mutation_fields.insert(name.clone(), field).is_some() {
                self.error([MUTATION_TYPE, name.as_str()], SchemaErrorKind::DuplicateRootField(name.clone()));
            }
        }
    }
}
