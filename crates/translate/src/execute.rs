use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{tree::GuardKind, CompiledOperation, CompiledProgram};

/// One row returned by the store, column name to value.
pub type Row = Map<String, Value>;

/// Update counters reported by the store for a write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Counters {
    pub nodes_created: u64,
    pub nodes_deleted: u64,
    pub relationships_created: u64,
    pub relationships_deleted: u64,
    pub properties_set: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    pub rows: Vec<Row>,
    pub counters: Counters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Forbidden")]
    Forbidden,
    #[error("Unauthenticated")]
    Unauthenticated,
    #[error("{0}")]
    Store(String),
}

impl ExecutionError {
    /// Failed validation guards surface as store errors carrying the guard message.
    pub fn from_store_message(message: impl Into<String>) -> Self {
        let message = message.into();

        if message.contains(GuardKind::Unauthenticated.message()) {
            ExecutionError::Unauthenticated
        } else if message.contains(GuardKind::Forbidden.message()) {
            ExecutionError::Forbidden
        } else {
            ExecutionError::Store(message)
        }
    }
}

/// Runs compiled programs against the store, one round trip per program. Implementations own
/// sessions and transactions.
pub trait Executor: Send + Sync {
    fn execute<'a>(&'a self, program: &'a CompiledProgram) -> BoxFuture<'a, Result<ExecutionResult, ExecutionError>>;
}

impl CompiledOperation {
    /// Executes every program in order and assembles the `data` of the response. The first
    /// failure aborts the remaining programs.
    pub async fn execute(&self, executor: &dyn Executor) -> Result<Value, ExecutionError> {
        let mut data = Map::new();

        for (response_key, program) in &self.programs {
            let result = executor.execute(program).await?;

            tracing::debug!(
                response_key,
                rows = result.rows.len(),
                nodes_created = result.counters.nodes_created,
                "program executed"
            );

            data.insert(
                response_key.clone(),
                program.shape.to_response(&result.rows, &result.counters),
            );
        }

        Ok(Value::Object(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_messages() {
        let forbidden = "Failed to invoke function `apoc.util.validatePredicate`: Caused by: java.lang.RuntimeException: @graphql-cypher/FORBIDDEN";
        assert_eq!(ExecutionError::from_store_message(forbidden), ExecutionError::Forbidden);

        assert_eq!(
            ExecutionError::from_store_message("java.lang.RuntimeException: @graphql-cypher/UNAUTHENTICATED"),
            ExecutionError::Unauthenticated
        );

        assert_eq!(
            ExecutionError::from_store_message("Neo.ClientError.Statement.SyntaxError"),
            ExecutionError::Store("Neo.ClientError.Statement.SyntaxError".into())
        );
    }

    #[test]
    fn store_errors_naming_the_guard_words() {
        let message = "Neo.ClientError.Statement.SyntaxError: Variable `isForbiddenZone` not defined";
        assert_eq!(
            ExecutionError::from_store_message(message),
            ExecutionError::Store(message.into())
        );

        let message = "Neo.ClientError.Security.Unauthenticated: The client is unauthorized";
        assert_eq!(
            ExecutionError::from_store_message(message),
            ExecutionError::Store(message.into())
        );
    }

    #[test]
    fn counters_from_driver_summary() {
        let counters: Counters = serde_json::from_value(serde_json::json!({
            "nodesCreated": 1,
            "relationshipsCreated": 2
        }))
        .unwrap();

        assert_eq!(counters.nodes_created, 1);
        assert_eq!(counters.relationships_created, 2);
        assert_eq!(counters.nodes_deleted, 0);
    }
}
