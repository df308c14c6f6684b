/// Aborts the translation of one operation. Nothing is ever partially translated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TranslationError {
    #[error("Could not parse the operation: {0}")]
    Parse(String),
    #[error("Unknown operation named '{0}'")]
    UnknownOperation(String),
    #[error("The document contains several operations, an operation name is required")]
    MissingOperationName,
    #[error("The document does not contain any operation")]
    NoOperation,
    #[error("Subscriptions are not supported")]
    Subscription,
    #[error("Unknown fragment '{0}'")]
    UnknownFragment(String),
    #[error("Fragment '{0}' spreads itself")]
    FragmentCycle(String),
    #[error("Variable ${0} is not defined by the operation")]
    UndefinedVariable(String),
    #[error("Variable ${name} of non-null type {ty} was not provided")]
    MissingVariable { name: String, ty: String },
    #[error("Cannot query field '{field}' on type '{ty}'")]
    UnknownField { ty: String, field: String },
    #[error("Missing argument '{argument}' on field '{field}'")]
    MissingArgument { field: String, argument: String },
    #[error("Invalid value at '{path}': {message}")]
    InvalidValue { path: String, message: String },
    #[error("Unknown filter '{key}' on type '{ty}'")]
    InvalidFilter { ty: String, key: String },
    #[error("Nested {operation} is not allowed through '{ty}.{field}'")]
    NestedOperationNotAllowed {
        ty: String,
        field: String,
        operation: &'static str,
    },
    #[error("Could not resolve the label '{0}' of the request")]
    UnresolvedLabel(String),
    #[error("Invalid cursor '{0}'")]
    InvalidCursor(String),
    #[error("Unknown callback '{0}'")]
    UnknownCallback(String),
}

impl TranslationError {
    pub(crate) fn invalid_value(path: impl Into<String>, message: impl Into<String>) -> Self {
        TranslationError::InvalidValue {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_field(ty: &str, field: &str) -> Self {
        TranslationError::UnknownField {
            ty: ty.to_string(),
            field: field.to_string(),
        }
    }
}
