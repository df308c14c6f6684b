#![cfg_attr(test, allow(unused_crate_dependencies))]

//! Translation of GraphQL operations into parameterized Cypher programs.
//!
//! Each root field of an operation compiles to one [`CompiledProgram`]: a single statement, its
//! parameters and the shape turning the rows returned by the store into the response. The
//! translation is purely synchronous, claims are resolved before and programs executed after.
//!
//! ```text
//! operation ──bind──> bound fields ──build──> tree ──codegen──> clauses ──render──> program
//! ```

mod bind;
mod build;
mod codegen;
mod context;
mod error;
mod execute;
mod handle;
mod input;
mod response;
mod tree;

use cypher_builder::{Names, Params, Statement, Value};
use graphql_cypher_schema::Schema;
use serde_json::{Map, Value as JsonValue};

pub use context::{Callback, TranslationContext};
pub use error::TranslationError;
pub use execute::{AccessMode, Counters, ExecutionError, ExecutionResult, Executor, Row};
pub use handle::SchemaHandle;
pub use input::InputValue;
pub use response::{
    decode_cursor, encode_cursor, ConnectionField, ConnectionShape, EdgeField, InfoField, MutationField,
    PageInfoField, Shape,
};

/// One statement and everything needed to run it and shape its result.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProgram {
    pub statement: String,
    pub params: Params,
    pub access_mode: AccessMode,
    pub shape: Shape,
}

/// The programs of an operation, one per root field in selection order, keyed by response key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledOperation {
    pub programs: Vec<(String, CompiledProgram)>,
}

impl CompiledOperation {
    /// Programs of a mutation run in a write transaction.
    pub fn access_mode(&self) -> AccessMode {
        if self
            .programs
            .iter()
            .any(|(_, program)| program.access_mode == AccessMode::Write)
        {
            AccessMode::Write
        } else {
            AccessMode::Read
        }
    }
}

/// Translates an operation against the schema. Translating the same inputs twice yields the same
/// programs.
#[tracing::instrument(skip_all, fields(operation_name = operation_name.unwrap_or_default()))]
pub fn translate(
    schema: &Schema,
    query: &str,
    operation_name: Option<&str>,
    variables: &Map<String, JsonValue>,
    ctx: &TranslationContext,
) -> Result<CompiledOperation, TranslationError> {
    let operation = bind::bind(query, operation_name, variables)?;
    let mut programs = Vec::with_capacity(operation.fields.len());

    for field in &operation.fields {
        let names = Names::new();
        let builder = build::BuildContext::new(schema, ctx, &names);

        let plan = builder.root(operation.kind, field)?;
        let clauses = codegen::generate(&plan.root, &names);
        let (statement, mut params) = Statement::new(clauses).build(&names);

        if builder.uses_auth() {
            params.insert("isAuthenticated".to_string(), Value::Boolean(ctx.is_authenticated()));
            params.insert("jwt".to_string(), jwt_param(ctx));
        }

        tracing::debug!(
            response_key = %field.response_key,
            statement_length = statement.len(),
            params = params.len(),
            "compiled program"
        );

        programs.push((
            field.response_key.clone(),
            CompiledProgram {
                statement,
                params,
                access_mode: plan.access_mode,
                shape: plan.shape,
            },
        ));
    }

    Ok(CompiledOperation { programs })
}

/// The claims of the caller, an empty map for anonymous callers so `$jwt.<claim>` reads null.
fn jwt_param(ctx: &TranslationContext) -> Value {
    let claims = ctx
        .claims
        .as_ref()
        .map(|claims| claims.as_map().clone())
        .unwrap_or_default();

    Value::from(JsonValue::Object(claims))
}
