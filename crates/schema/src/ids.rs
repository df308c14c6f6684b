/// Isolating ids from the rest to prevent misuse of the NonZeroU32.
/// They can only be created by From<usize>
use crate::{
    ArgumentDefinitionRecord, CustomStatementRecord, FieldDefinitionRecord, RelationshipRecord, Schema,
    TypeDefinitionRecord,
};

/// Reserving the upper bits, it still leaves 268 million possible values.
const MAX_ID: usize = (1 << 28) - 1;

macro_rules! id_newtypes {
    ($($ty:ident.$field:ident[$name:ident] => $out:ident unless $msg:literal,)*) => {
        $(
            #[derive(Debug, Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash)]
            pub struct $name(std::num::NonZeroU32);

            impl std::ops::Index<$name> for $ty {
                type Output = $out;

                fn index(&self, index: $name) -> &$out {
                    &self.$field[(index.0.get() - 1) as usize]
                }
            }

            impl std::ops::IndexMut<$name> for $ty {
                fn index_mut(&mut self, index: $name) -> &mut $out {
                    &mut self.$field[(index.0.get() - 1) as usize]
                }
            }

            impl From<usize> for $name {
                fn from(index: usize) -> Self {
                    assert!(index <= MAX_ID, $msg);
                    Self(std::num::NonZeroU32::new((index + 1) as u32).unwrap())
                }
            }

            impl From<$name> for usize {
                fn from(id: $name) -> Self {
                    (id.0.get() - 1) as usize
                }
            }
        )*
    }
}

id_newtypes! {
    Schema.type_definitions[TypeDefinitionId] => TypeDefinitionRecord unless "Too many types",
    Schema.field_definitions[FieldDefinitionId] => FieldDefinitionRecord unless "Too many fields",
    Schema.argument_definitions[ArgumentDefinitionId] => ArgumentDefinitionRecord unless "Too many arguments",
    Schema.relationships[RelationshipId] => RelationshipRecord unless "Too many relationships",
    Schema.custom_statements[CustomStatementId] => CustomStatementRecord unless "Too many custom statements",
}
