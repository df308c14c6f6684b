use crate::{FieldDefinitionId, Quantifier, ScalarOperator};

bitflags::bitflags! {
    /// Operations an authorization rule applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AuthOperations: u8 {
        const READ = 1;
        const AGGREGATE = 1 << 1;
        const CREATE = 1 << 2;
        const UPDATE = 1 << 3;
        const DELETE = 1 << 4;
        const CONNECT = 1 << 5;
        const DISCONNECT = 1 << 6;
    }
}

impl AuthOperations {
    /// Accepts both the short names and the `CREATE_RELATIONSHIP`/`DELETE_RELATIONSHIP` aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "CREATE_RELATIONSHIP" => Some(Self::CONNECT),
            "DELETE_RELATIONSHIP" => Some(Self::DISCONNECT),
            other => Self::from_name(other),
        }
    }

    pub fn filter_default() -> Self {
        Self::READ | Self::AGGREGATE | Self::UPDATE | Self::DELETE | Self::CONNECT | Self::DISCONNECT
    }
}

bitflags::bitflags! {
    /// When a validation rule is checked relative to the guarded write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct When: u8 {
        const BEFORE = 1;
        const AFTER = 1 << 1;
    }
}

/// The value side of a rule comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthValue {
    Literal(serde_json::Value),
    /// `"$jwt.<claim>"`, read from the claims at execution time.
    Jwt(String),
    /// `"$context.<path>"`, read from the request context at translation time.
    Context(String),
}

impl AuthValue {
    pub fn parse(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) if s.starts_with("$jwt.") => AuthValue::Jwt(s["$jwt.".len()..].to_string()),
            serde_json::Value::String(s) if s.starts_with("$context.") => {
                AuthValue::Context(s["$context.".len()..].to_string())
            }
            other => AuthValue::Literal(other),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AuthValue::Literal(serde_json::Value::Null))
    }
}

/// A rule predicate. Node leaves are relative to the node the rule is attached to.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPredicate {
    And(Vec<AuthPredicate>),
    Or(Vec<AuthPredicate>),
    Not(Box<AuthPredicate>),
    Property {
        field_id: FieldDefinitionId,
        operator: ScalarOperator,
        value: AuthValue,
    },
    /// Quantified over the nodes reached through a relationship field.
    Relationship {
        field_id: FieldDefinitionId,
        quantifier: Quantifier,
        predicate: Box<AuthPredicate>,
    },
    /// `field: null` on a relationship, no node is connected.
    RelationshipIsNull { field_id: FieldDefinitionId },
    /// A comparison over the claims only, `jwt: { roles_INCLUDES: "admin" }`.
    Claim {
        path: String,
        operator: ScalarOperator,
        value: AuthValue,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterRule {
    pub operations: AuthOperations,
    pub require_authentication: bool,
    pub predicate: Option<AuthPredicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidateRule {
    pub operations: AuthOperations,
    pub when: When,
    pub require_authentication: bool,
    pub predicate: Option<AuthPredicate>,
}

/// `@authorization(filter: [...], validate: [...])`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorizationRules {
    pub filter: Vec<FilterRule>,
    pub validate: Vec<ValidateRule>,
}

impl AuthorizationRules {
    pub fn filters_for(&self, operation: AuthOperations) -> impl Iterator<Item = &FilterRule> + '_ {
        self.filter
            .iter()
            .filter(move |rule| rule.operations.intersects(operation))
    }

    pub fn validations_for(&self, operation: AuthOperations, when: When) -> impl Iterator<Item = &ValidateRule> + '_ {
        self.validate
            .iter()
            .filter(move |rule| rule.operations.intersects(operation) && rule.when.intersects(when))
    }
}

/// `@authentication(operations: [...], jwt: {...})`
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticationRule {
    pub operations: AuthOperations,
    /// Only claim predicates.
    pub jwt: Option<AuthPredicate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deferred_values() {
        assert_eq!(
            AuthValue::parse(serde_json::json!("$jwt.sub")),
            AuthValue::Jwt("sub".into())
        );
        assert_eq!(
            AuthValue::parse(serde_json::json!("$context.tenant.id")),
            AuthValue::Context("tenant.id".into())
        );
        assert_eq!(
            AuthValue::parse(serde_json::json!("plain")),
            AuthValue::Literal(serde_json::json!("plain"))
        );
    }

    #[test]
    fn operation_aliases() {
        assert_eq!(AuthOperations::parse("CREATE_RELATIONSHIP"), Some(AuthOperations::CONNECT));
        assert_eq!(AuthOperations::parse("READ"), Some(AuthOperations::READ));
        assert_eq!(AuthOperations::parse("SUBSCRIBE"), None);
    }
}
