use inflector::Inflector;

use crate::{
    AuthenticationRule, AuthorizationRules, FieldDefinition, FieldDefinitionId, FulltextIndex, LabelExpression,
    LimitDirective, ResolverOperations, TypeDefinition, TypeDefinitionId, VectorIndex,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// An object type mapped to nodes of the graph.
    Node,
    Interface,
    Union,
    /// Object type holding the properties of a relationship, `@relationshipProperties`.
    RelationshipProperties,
    /// `Query` or `Mutation`, only holding custom statement fields.
    Root,
    /// The `@jwt` type describing the claims.
    Jwt,
}

#[derive(Debug)]
pub struct TypeDefinitionRecord {
    pub name: String,
    pub kind: TypeKind,
    pub description: Option<String>,
    /// Database labels, the type name unless overridden with `@node(labels: [...])`.
    pub labels: Vec<LabelExpression>,
    pub field_ids: Vec<FieldDefinitionId>,
    /// Interfaces implemented by an object or interface.
    pub interface_ids: Vec<TypeDefinitionId>,
    /// Node types implementing an interface or member of a union, in definition order.
    pub possible_type_ids: Vec<TypeDefinitionId>,
    pub authorization: Option<AuthorizationRules>,
    pub authentication: Option<AuthenticationRule>,
    pub limit: Option<LimitDirective>,
    pub fulltext_indexes: Vec<FulltextIndex>,
    pub vector_indexes: Vec<VectorIndex>,
    pub operations: ResolverOperations,
    /// Plural used to name root fields, `movies` for `Movie`.
    pub plural: String,
}

impl<'a> TypeDefinition<'a> {
    pub fn name(&self) -> &'a str {
        &self.as_ref().name
    }

    pub fn is_node(&self) -> bool {
        self.kind == TypeKind::Node
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDefinition<'a>> + 'a {
        let walker = *self;
        self.as_ref().field_ids.iter().map(move |id| walker.walk(*id))
    }

    pub fn field_by_name(&self, name: &str) -> Option<FieldDefinition<'a>> {
        self.fields().find(|field| field.name() == name)
    }

    /// Concrete node types a value of this type may be. A node type is its own only possible type.
    pub fn possible_types(&self) -> impl Iterator<Item = TypeDefinition<'a>> + 'a {
        let walker = *self;
        let ids: Box<dyn Iterator<Item = TypeDefinitionId> + 'a> = if self.is_abstract() {
            Box::new(self.as_ref().possible_type_ids.iter().copied())
        } else {
            Box::new(std::iter::once(self.id()))
        };

        ids.map(move |id| walker.walk(id))
    }

    pub fn implements(&self, interface: TypeDefinitionId) -> bool {
        self.interface_ids.contains(&interface)
    }

    /// Whether a value of type `other` may be of this type: same type, a member of this
    /// union, or an implementation of this interface.
    pub fn accepts(&self, other: TypeDefinitionId) -> bool {
        self.id() == other || self.possible_type_ids.contains(&other)
    }

    pub fn singular(&self) -> String {
        self.name().to_camel_case()
    }

    pub fn pascal_plural(&self) -> String {
        self.plural.to_pascal_case()
    }

    /// The fields uniquely identifying a node, used by connect `where` inputs among others.
    pub fn unique_fields(&self) -> impl Iterator<Item = FieldDefinition<'a>> + 'a {
        self.fields().filter(|field| field.unique || field.id.is_some())
    }
}
