use crate::{
    ArgumentDefinition, ArgumentDefinitionId, AuthenticationRule, AuthorizationRules, CallbackOperations,
    CustomStatement, CustomStatementId, FieldDefinition, PopulatedBy, Relationship, RelationshipId, TypeDefinition,
    TypeDefinitionId,
};

/// Scalars with a dedicated treatment, everything else is either an enum or a custom scalar
/// stored as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
pub enum ScalarType {
    #[strum(serialize = "ID")]
    Id,
    String,
    Int,
    Float,
    Boolean,
    BigInt,
    DateTime,
    LocalDateTime,
    Date,
    Time,
    LocalTime,
    Duration,
    Point,
    CartesianPoint,
}

impl ScalarType {
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            ScalarType::DateTime
                | ScalarType::LocalDateTime
                | ScalarType::Date
                | ScalarType::Time
                | ScalarType::LocalTime
                | ScalarType::Duration
        )
    }

    pub fn is_spatial(self) -> bool {
        matches!(self, ScalarType::Point | ScalarType::CartesianPoint)
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Int | ScalarType::Float | ScalarType::BigInt)
    }

    pub fn is_string_like(self) -> bool {
        matches!(self, ScalarType::Id | ScalarType::String)
    }
}

/// The GraphQL type of a field or argument. Only a single level of list is supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub name: String,
    pub list: bool,
    pub non_null: bool,
    pub non_null_items: bool,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let items_bang = if self.non_null_items { "!" } else { "" };
        let bang = if self.non_null { "!" } else { "" };

        if self.list {
            write!(f, "[{}{items_bang}]{bang}", self.name)
        } else {
            write!(f, "{}{bang}", self.name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarType),
    Enum,
    CustomScalar,
    Relationship(RelationshipId),
    /// Resolved with a custom statement, `@cypher`.
    Cypher(CustomStatementId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdDirective {
    pub autogenerate: bool,
}

#[derive(Debug)]
pub struct FieldDefinitionRecord {
    pub name: String,
    pub parent_id: TypeDefinitionId,
    pub ty: FieldType,
    pub kind: FieldKind,
    pub description: Option<String>,
    /// Name of the underlying property, differs from `name` with `@alias`.
    pub database_name: String,
    pub argument_ids: Vec<ArgumentDefinitionId>,
    pub id: Option<IdDirective>,
    pub unique: bool,
    pub default: Option<serde_json::Value>,
    pub populated_by: Option<PopulatedBy>,
    pub timestamp: Option<CallbackOperations>,
    pub authorization: Option<AuthorizationRules>,
    pub authentication: Option<AuthenticationRule>,
}

#[derive(Debug)]
pub struct ArgumentDefinitionRecord {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<serde_json::Value>,
}

impl<'a> FieldDefinition<'a> {
    pub fn name(&self) -> &'a str {
        &self.as_ref().name
    }

    pub fn database_name(&self) -> &'a str {
        &self.as_ref().database_name
    }

    pub fn parent(&self) -> TypeDefinition<'a> {
        self.walk(self.parent_id)
    }

    pub fn scalar_type(&self) -> Option<ScalarType> {
        match self.kind {
            FieldKind::Scalar(scalar) => Some(scalar),
            FieldKind::Cypher(_) => self.ty.name.parse().ok(),
            _ => None,
        }
    }

    pub fn relationship(&self) -> Option<Relationship<'a>> {
        match self.kind {
            FieldKind::Relationship(id) => Some(self.walk(id)),
            _ => None,
        }
    }

    pub fn custom_statement(&self) -> Option<CustomStatement<'a>> {
        match self.kind {
            FieldKind::Cypher(id) => Some(self.walk(id)),
            _ => None,
        }
    }

    /// Stored on the node, as opposed to relationships and computed fields.
    pub fn is_property(&self) -> bool {
        matches!(self.kind, FieldKind::Scalar(_) | FieldKind::Enum | FieldKind::CustomScalar)
    }

    /// The node, interface or union type this field leads to, if any.
    pub fn target_type(&self) -> Option<TypeDefinition<'a>> {
        self.schema.type_definition_by_name(&self.ty.name)
    }

    pub fn arguments(&self) -> impl ExactSizeIterator<Item = ArgumentDefinition<'a>> + 'a {
        let walker = *self;
        self.as_ref().argument_ids.iter().map(move |id| walker.walk(*id))
    }
}

impl<'a> ArgumentDefinition<'a> {
    pub fn name(&self) -> &'a str {
        &self.as_ref().name
    }
}
