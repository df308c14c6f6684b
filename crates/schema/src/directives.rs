use crate::{CustomStatement, FieldDefinitionId};

/// One label of a node type. Claims and context placeholders are resolved per request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LabelExpression {
    Literal(String),
    /// `$jwt.<path>`
    Jwt(String),
    /// `$context.<path>`
    Context(String),
}

impl LabelExpression {
    pub fn parse(label: &str) -> Self {
        if let Some(path) = label.strip_prefix("$jwt.") {
            LabelExpression::Jwt(path.to_string())
        } else if let Some(path) = label.strip_prefix("$context.") {
            LabelExpression::Context(path.to_string())
        } else {
            LabelExpression::Literal(label.to_string())
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            LabelExpression::Literal(label) => Some(label),
            _ => None,
        }
    }
}

/// `@limit(default: Int, max: Int)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LimitDirective {
    pub default: Option<u32>,
    pub max: Option<u32>,
}

impl LimitDirective {
    /// The limit to apply for a requested one: the default when nothing is requested, capped by
    /// the maximum in any case.
    pub fn apply(&self, requested: Option<i64>) -> Option<i64> {
        let limit = requested.or(self.default.map(i64::from));

        match (limit, self.max.map(i64::from)) {
            (Some(limit), Some(max)) => Some(limit.min(max)),
            (None, Some(max)) => Some(max),
            (limit, None) => limit,
        }
    }
}

/// `@cypher(statement: String!, columnName: String!)`
#[derive(Debug)]
pub struct CustomStatementRecord {
    pub field_id: FieldDefinitionId,
    pub statement: String,
    pub column_name: String,
}

impl<'a> CustomStatement<'a> {
    pub fn statement(&self) -> &'a str {
        &self.as_ref().statement
    }

    pub fn column_name(&self) -> &'a str {
        &self.as_ref().column_name
    }
}

/// One index of `@fulltext(indexes: [...])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulltextIndex {
    pub index_name: String,
    pub query_name: String,
    pub field_ids: Vec<FieldDefinitionId>,
}

/// One index of `@vector(indexes: [...])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorIndex {
    pub index_name: String,
    pub query_name: String,
    pub embedding_property: String,
}

bitflags::bitflags! {
    /// The root fields generated for a type, restricted by `@exclude`, `@query` and `@mutation`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResolverOperations: u8 {
        const READ = 1;
        const AGGREGATE = 1 << 1;
        const CREATE = 1 << 2;
        const UPDATE = 1 << 3;
        const DELETE = 1 << 4;
    }
}

impl Default for ResolverOperations {
    fn default() -> Self {
        Self::all()
    }
}

bitflags::bitflags! {
    /// When a generated value is written, for `@timestamp` and `@populatedBy`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CallbackOperations: u8 {
        const CREATE = 1;
        const UPDATE = 1 << 1;
    }
}

impl Default for CallbackOperations {
    fn default() -> Self {
        Self::all()
    }
}

/// `@populatedBy(callback: String!, operations: [CREATE, UPDATE])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulatedBy {
    pub callback: String,
    pub operations: CallbackOperations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_placeholders() {
        assert_eq!(LabelExpression::parse("Movie"), LabelExpression::Literal("Movie".into()));
        assert_eq!(LabelExpression::parse("$jwt.tenant"), LabelExpression::Jwt("tenant".into()));
        assert_eq!(
            LabelExpression::parse("$context.region"),
            LabelExpression::Context("region".into())
        );
    }

    #[test]
    fn limit_application() {
        let limit = LimitDirective {
            default: Some(10),
            max: Some(100),
        };

        assert_eq!(limit.apply(None), Some(10));
        assert_eq!(limit.apply(Some(5)), Some(5));
        assert_eq!(limit.apply(Some(500)), Some(100));

        let max_only = LimitDirective {
            default: None,
            max: Some(3),
        };
        assert_eq!(max_only.apply(None), Some(3));
        assert_eq!(LimitDirective::default().apply(None), None);
    }
}
