use crate::{FieldDefinition, FieldDefinitionId, Relationship, TypeDefinition, TypeDefinitionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumString, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RelationshipDirection {
    /// `(parent)<-[:TYPE]-(target)`
    In,
    /// `(parent)-[:TYPE]->(target)`
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::EnumString, strum::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryDirection {
    /// Reads follow the declared direction.
    #[default]
    Directed,
    /// Reads ignore the direction, writes still use the declared one.
    Undirected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    One,
    Many,
}

bitflags::bitflags! {
    /// Which nested operations a mutation may perform through a relationship.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NestedOperations: u8 {
        const CREATE = 1;
        const CONNECT = 1 << 1;
        const UPDATE = 1 << 2;
        const DELETE = 1 << 3;
        const DISCONNECT = 1 << 4;
        const CONNECT_OR_CREATE = 1 << 5;
    }
}

impl Default for NestedOperations {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug)]
pub struct RelationshipRecord {
    pub field_id: FieldDefinitionId,
    /// The relationship type in the graph, `ACTED_IN`.
    pub ty: String,
    pub direction: RelationshipDirection,
    pub query_direction: QueryDirection,
    pub cardinality: Cardinality,
    pub target_id: TypeDefinitionId,
    /// The `@relationshipProperties` type, if any.
    pub properties_id: Option<TypeDefinitionId>,
    pub nested_operations: NestedOperations,
    /// Whether `<field>Aggregate` is generated, `@relationship(aggregate: true)`.
    pub aggregate: bool,
    /// Computed once when building: the target is a node type, or an interface or union whose
    /// members all are node types.
    pub aggregable: bool,
}

impl<'a> Relationship<'a> {
    pub fn field(&self) -> FieldDefinition<'a> {
        self.walk(self.field_id)
    }

    pub fn target(&self) -> TypeDefinition<'a> {
        self.walk(self.target_id)
    }

    pub fn properties(&self) -> Option<TypeDefinition<'a>> {
        self.properties_id.map(|id| self.walk(id))
    }

    pub fn relationship_type(&self) -> &'a str {
        &self.as_ref().ty
    }

    pub fn is_many(&self) -> bool {
        self.cardinality == Cardinality::Many
    }

    pub fn allows(&self, operation: NestedOperations) -> bool {
        self.nested_operations.contains(operation)
    }

    /// `<field>Aggregate` is available.
    pub fn is_aggregable(&self) -> bool {
        self.aggregate && self.aggregable && self.is_many()
    }
}
