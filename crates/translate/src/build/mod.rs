//! Tree building: resolves the bound fields of an operation against the schema and produces the
//! intermediate representation of each root field together with the shape of its response.
//!
//! Everything is threaded through a [`BuildContext`], which owns the naming authority of the
//! statement being built and the per-request inputs.

mod aggregate;
mod arguments;
mod authorization;
mod connection;
mod custom;
mod filter;
mod mutation;
mod read;

use std::cell::{Cell, RefCell};

use cypher_builder::{Direction, Names, Param, Value, Variable};
use graphql_cypher_schema::{
    LabelExpression, LimitDirective, QueryDirection, Relationship, RelationshipDirection, RootField, Schema,
    TypeDefinition,
};

use crate::{
    bind::{BoundField, OperationKind},
    response::Shape,
    tree::{Filter, Root, Traversal},
    AccessMode, InputValue, TranslationContext, TranslationError,
};

pub(crate) use read::SelectionSource;

/// A root field ready for code generation.
pub(crate) struct RootPlan {
    pub root: Root,
    pub shape: Shape,
    pub access_mode: AccessMode,
}

pub(crate) struct BuildContext<'a> {
    pub schema: &'a Schema,
    pub ctx: &'a TranslationContext,
    pub names: &'a Names,
    uses_auth: Cell<bool>,
    /// Parameters bound to literals of the operation, keyed by the literal's address. A `where`
    /// compiled once per branch binds each of its literals once.
    input_params: RefCell<Vec<(*const InputValue, Value, Param)>>,
}

impl<'a> BuildContext<'a> {
    pub fn new(schema: &'a Schema, ctx: &'a TranslationContext, names: &'a Names) -> Self {
        Self {
            schema,
            ctx,
            names,
            uses_auth: Cell::new(false),
            input_params: RefCell::new(Vec::new()),
        }
    }

    pub fn param(&self, value: impl Into<Value>) -> Param {
        self.names.param(value)
    }

    /// The parameter bound to a literal of the operation, converted to `value`.
    pub fn input_param(&self, input: &InputValue, value: Value) -> Param {
        let address: *const InputValue = input;
        let mut bound = self.input_params.borrow_mut();

        if let Some((_, _, param)) = bound
            .iter()
            .find(|(bound_address, bound_value, _)| *bound_address == address && *bound_value == value)
        {
            return *param;
        }

        let param = self.names.param(value.clone());
        bound.push((address, value, param));

        param
    }

    /// The statement reads `$jwt` or `$isAuthenticated`.
    pub fn mark_auth(&self) {
        self.uses_auth.set(true);
    }

    pub fn uses_auth(&self) -> bool {
        self.uses_auth.get()
    }

    pub fn root(&self, kind: OperationKind, field: &BoundField) -> Result<RootPlan, TranslationError> {
        let (root_type, root_field) = match kind {
            OperationKind::Query => ("Query", self.schema.query_field(&field.name)),
            OperationKind::Mutation => ("Mutation", self.schema.mutation_field(&field.name)),
        };

        let Some(root_field) = root_field else {
            return Err(TranslationError::unknown_field(root_type, &field.name));
        };

        let read = |root: Root, shape: Shape| RootPlan {
            root,
            shape,
            access_mode: AccessMode::Read,
        };

        match root_field {
            RootField::Read(id) => {
                let (selection, shape) = self.selection(self.schema.walk(id), field, SelectionSource::Root, false)?;
                Ok(read(Root::Read(selection), Shape::Rows(Box::new(shape))))
            }
            RootField::Aggregate(id) => {
                let aggregation = self.root_aggregation(self.schema.walk(id), field)?;
                Ok(read(Root::Aggregate(aggregation), Shape::FirstRow(Box::new(Shape::Value))))
            }
            RootField::Connection(id) => {
                let (connection, shape) = self.connection(self.schema.walk(id), field, SelectionSource::Root, None)?;
                Ok(read(
                    Root::Connection(connection),
                    Shape::FirstRow(Box::new(Shape::Connection(Box::new(shape)))),
                ))
            }
            RootField::Fulltext { ty, index } => {
                let (root, shape) = self.fulltext(self.schema.walk(ty), index, field)?;
                Ok(read(root, shape))
            }
            RootField::Vector { ty, index } => {
                let (connection, shape) = self.vector(self.schema.walk(ty), index, field)?;
                Ok(read(
                    Root::Connection(connection),
                    Shape::FirstRow(Box::new(Shape::Connection(Box::new(shape)))),
                ))
            }
            RootField::Custom(id) => {
                let definition = self.schema.walk(id);
                let (custom, shape) = self.custom_field(definition, field, None)?;

                let shape = if custom.list {
                    Shape::Rows(Box::new(shape))
                } else {
                    Shape::FirstRow(Box::new(shape))
                };

                Ok(RootPlan {
                    root: Root::Custom(custom),
                    shape,
                    access_mode: match kind {
                        OperationKind::Query => AccessMode::Read,
                        OperationKind::Mutation => AccessMode::Write,
                    },
                })
            }
            RootField::Create(id) => self.create(self.schema.walk(id), field),
            RootField::Update(id) => self.update(self.schema.walk(id), field),
            RootField::Delete(id) => self.delete(self.schema.walk(id), field),
        }
    }

    /// Labels of a node type, with the claims and context placeholders resolved.
    pub fn labels(&self, ty: TypeDefinition<'_>) -> Result<Vec<String>, TranslationError> {
        ty.labels
            .iter()
            .map(|label| {
                let (value, placeholder) = match label {
                    LabelExpression::Literal(label) => return Ok(label.clone()),
                    LabelExpression::Jwt(path) => (
                        self.ctx.claim(self.schema.jwt_claim_path(path)),
                        format!("$jwt.{path}"),
                    ),
                    LabelExpression::Context(path) => (self.ctx.context_value(path), format!("$context.{path}")),
                };

                value
                    .and_then(serde_json::Value::as_str)
                    .filter(|label| !label.is_empty())
                    .map(str::to_string)
                    .ok_or(TranslationError::UnresolvedLabel(placeholder))
            })
            .collect()
    }

    /// Label sets of the possible types of an abstract type.
    pub fn alternatives(&self, ty: TypeDefinition<'_>) -> Result<Vec<Vec<String>>, TranslationError> {
        ty.possible_types().map(|member| self.labels(member)).collect()
    }

    /// `(node:A:B OR node:C)` for the possible types of an abstract type.
    pub fn alternatives_filter(&self, node: Variable, ty: TypeDefinition<'_>) -> Result<Option<Filter>, TranslationError> {
        if !ty.is_abstract() {
            return Ok(None);
        }

        let alternatives = self
            .alternatives(ty)?
            .into_iter()
            .map(|labels| Filter::Labels { node, labels })
            .collect::<Vec<_>>();

        // A union without members matches nothing.
        Ok(Some(Filter::any(alternatives).unwrap_or(Filter::Constant(false))))
    }

    /// The limit applied to a selection of `ty`: its `@limit`, or the configured defaults.
    pub fn limit(&self, ty: TypeDefinition<'_>, requested: Option<i64>) -> Option<i64> {
        let directive = ty.limit.unwrap_or(LimitDirective {
            default: self.ctx.limits.default_limit,
            max: self.ctx.limits.max_limit,
        });

        directive.apply(requested)
    }

    /// Reads may ignore the direction of a relationship, writes never do.
    pub fn traversal(&self, parent: Variable, relationship: Relationship<'_>, read: bool) -> Traversal {
        let direction = match (relationship.direction, relationship.query_direction) {
            (_, QueryDirection::Undirected) if read => Direction::Undirected,
            (RelationshipDirection::Out, _) => Direction::Outgoing,
            (RelationshipDirection::In, _) => Direction::Incoming,
        };

        Traversal {
            parent,
            relationship_type: relationship.relationship_type().to_string(),
            direction,
        }
    }

    /// Segments of a claim path, `roles` or `https://example.com/claims.roles`. Keys holding dots
    /// are kept whole when the claims have them.
    pub fn claim_segments(&self, claim: &str) -> Vec<String> {
        let path = self.schema.jwt_claim_path(claim);

        let whole_key = self
            .ctx
            .claims
            .as_ref()
            .is_some_and(|claims| claims.as_map().contains_key(path));

        if whole_key {
            vec![path.to_string()]
        } else {
            path.split('.').map(str::to_string).collect()
        }
    }
}

/// Whether fields selected under `condition` apply to the concrete type `ty`.
pub(crate) fn applies(ty: TypeDefinition<'_>, condition: &str) -> bool {
    condition == ty.name()
        || ty
            .schema()
            .type_definition_by_name(condition)
            .is_some_and(|condition| condition.accepts(ty.id()) || ty.implements(condition.id()))
}
