use crate::{ArgumentDefinitionId, CustomStatementId, FieldDefinitionId, RelationshipId, Schema, TypeDefinitionId};

pub type TypeDefinition<'a> = SchemaWalker<'a, TypeDefinitionId>;
pub type FieldDefinition<'a> = SchemaWalker<'a, FieldDefinitionId>;
pub type ArgumentDefinition<'a> = SchemaWalker<'a, ArgumentDefinitionId>;
pub type Relationship<'a> = SchemaWalker<'a, RelationshipId>;
pub type CustomStatement<'a> = SchemaWalker<'a, CustomStatementId>;

#[derive(Clone, Copy)]
pub struct SchemaWalker<'a, I = ()> {
    pub(crate) item: I,
    pub(crate) schema: &'a Schema,
}

impl<'a, I> SchemaWalker<'a, I> {
    pub fn new(item: I, schema: &'a Schema) -> Self {
        Self { item, schema }
    }

    pub fn walk<Other>(&self, item: Other) -> SchemaWalker<'a, Other> {
        SchemaWalker {
            item,
            schema: self.schema,
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }
}

impl<'a, Id: Copy> SchemaWalker<'a, Id>
where
    Schema: std::ops::Index<Id>,
{
    // Clippy complains because it's ambiguous with AsRef. But AsRef doesn't allow us to add the 'a
    // lifetime.
    #[allow(clippy::should_implement_trait)]
    pub fn as_ref(&self) -> &'a <Schema as std::ops::Index<Id>>::Output {
        &self.schema[self.item]
    }

    pub fn id(&self) -> Id {
        self.item
    }
}

impl<'a, Id: Copy> std::ops::Deref for SchemaWalker<'a, Id>
where
    Schema: std::ops::Index<Id>,
{
    type Target = <Schema as std::ops::Index<Id>>::Output;

    fn deref(&self) -> &Self::Target {
        &self.schema[self.item]
    }
}

impl<Id: PartialEq> PartialEq for SchemaWalker<'_, Id> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item && std::ptr::eq(self.schema, other.schema)
    }
}

impl<Id: Eq> Eq for SchemaWalker<'_, Id> {}

impl<Id: std::fmt::Debug> std::fmt::Debug for SchemaWalker<'_, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SchemaWalker").field(&self.item).finish()
    }
}
