#![cfg_attr(test, allow(unused_crate_dependencies))]

//! The schema model: node types, relationships, custom statements and authorization rules
//! interpreted from directive-augmented type definitions.
//!
//! Everything lives in flat arenas addressed by ids, walkers give a typed, borrowing view over
//! them. A `Schema` is immutable once built and can be shared across translations.

mod authorization;
mod builder;
mod directives;
mod field;
mod filter_key;
mod ids;
mod naming;
mod relationship;
mod type_definition;
mod walkers;

use std::collections::HashMap;

pub use authorization::*;
pub use builder::{SchemaError, SchemaErrorKind, SchemaErrors};
pub use directives::*;
pub use field::*;
pub use filter_key::*;
pub use ids::*;
pub use naming::*;
pub use relationship::*;
pub use type_definition::*;
pub use walkers::*;

pub struct Schema {
    type_definitions: Vec<TypeDefinitionRecord>,
    field_definitions: Vec<FieldDefinitionRecord>,
    argument_definitions: Vec<ArgumentDefinitionRecord>,
    relationships: Vec<RelationshipRecord>,
    custom_statements: Vec<CustomStatementRecord>,

    type_by_name: HashMap<String, TypeDefinitionId>,
    enums: HashMap<String, Vec<String>>,
    query_fields: HashMap<String, RootField>,
    mutation_fields: HashMap<String, RootField>,
    /// Claim name to its path in the decoded token, from the `@jwt` type.
    jwt_claims: HashMap<String, String>,
}

impl Schema {
    /// Parses and interprets the given SDL. Every problem found is reported, no partially
    /// valid schema is ever returned.
    pub fn build(sdl: &str) -> Result<Schema, SchemaErrors> {
        builder::build(sdl)
    }

    pub fn walk<I>(&self, item: I) -> SchemaWalker<'_, I> {
        SchemaWalker::new(item, self)
    }

    pub fn type_definition_by_name(&self, name: &str) -> Option<TypeDefinition<'_>> {
        self.type_by_name.get(name).map(|id| self.walk(*id))
    }

    pub fn type_definitions(&self) -> impl ExactSizeIterator<Item = TypeDefinition<'_>> + '_ {
        (0..self.type_definitions.len()).map(|index| self.walk(TypeDefinitionId::from(index)))
    }

    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn enum_values(&self, name: &str) -> Option<&[String]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn query_field(&self, name: &str) -> Option<RootField> {
        self.query_fields.get(name).copied()
    }

    pub fn mutation_field(&self, name: &str) -> Option<RootField> {
        self.mutation_fields.get(name).copied()
    }

    pub fn query_field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.query_fields.keys().map(String::as_str)
    }

    pub fn mutation_field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.mutation_fields.keys().map(String::as_str)
    }

    /// The path of a claim inside the decoded token. Claims not declared on the `@jwt` type are
    /// read under their own name.
    pub fn jwt_claim_path<'a>(&'a self, claim: &'a str) -> &'a str {
        self.jwt_claims.get(claim).map(String::as_str).unwrap_or(claim)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("types", &self.type_definitions.len())
            .field("fields", &self.field_definitions.len())
            .field("relationships", &self.relationships.len())
            .finish_non_exhaustive()
    }
}

/// What a root field of the generated API resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootField {
    Read(TypeDefinitionId),
    Aggregate(TypeDefinitionId),
    Connection(TypeDefinitionId),
    Fulltext { ty: TypeDefinitionId, index: usize },
    Vector { ty: TypeDefinitionId, index: usize },
    /// A `Query` or `Mutation` field with a custom statement.
    Custom(FieldDefinitionId),
    Create(TypeDefinitionId),
    Update(TypeDefinitionId),
    Delete(TypeDefinitionId),
}
