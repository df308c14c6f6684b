/// A problem found while building the schema, located by its path: type, field, directive and
/// argument, as far as it applies.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{}: {kind}", .path.join("."))]
pub struct SchemaError {
    pub path: Vec<String>,
    pub kind: SchemaErrorKind,
}

impl SchemaError {
    pub(crate) fn new<S: ToString>(path: impl IntoIterator<Item = S>, kind: SchemaErrorKind) -> Self {
        Self {
            path: path.into_iter().map(|segment| segment.to_string()).collect(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaErrorKind {
    #[error("Could not parse the type definitions: {0}")]
    Parse(String),
    #[error("Unknown type `{0}`")]
    UnknownType(String),
    #[error("The relationship properties type `{0}` must be annotated with @relationshipProperties")]
    MissingRelationshipProperties(String),
    #[error("Field of type `{0}` must be a relationship or a custom statement")]
    MissingRelationship(String),
    #[error("Unsupported field type: {0}")]
    UnsupportedType(String),
    #[error("Invalid @limit: {0}")]
    InvalidLimit(String),
    #[error("Invalid @{directive}: {message}")]
    InvalidDirective { directive: &'static str, message: String },
    #[error("Invalid operation `{value}` for @{directive}")]
    InvalidOperation { directive: &'static str, value: String },
    #[error("Invalid authorization rule: {0}")]
    InvalidAuthorization(String),
    #[error("Duplicate root field `{0}`")]
    DuplicateRootField(String),
    #[error("Duplicate index name `{0}`")]
    DuplicateIndex(String),
}

/// All the problems of a schema, the build aborts if there is any.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaErrors(pub Vec<SchemaError>);

impl SchemaErrors {
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &SchemaError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}
