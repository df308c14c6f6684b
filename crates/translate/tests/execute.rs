#![allow(unused_crate_dependencies)]

use std::sync::Mutex;

use futures_util::future::BoxFuture;
use graphql_cypher::{
    AccessMode, CompiledProgram, Counters, ExecutionError, ExecutionResult, Executor, SchemaHandle, TranslationContext,
};
use serde_json::{json, Map, Value};

#[ctor::ctor]
fn setup_logging() {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .parse(std::env::var("RUST_LOG").unwrap_or("graphql_cypher=debug".to_string()))
        .unwrap();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .init();
}

const MOVIES: &str = r#"
    type Movie {
        title: String!
        released: Int
    }
"#;

/// Answers each program with the next canned result and records what it ran.
struct FakeStore {
    results: Mutex<Vec<Result<ExecutionResult, ExecutionError>>>,
    executed: Mutex<Vec<AccessMode>>,
}

impl FakeStore {
    fn new(results: Vec<Result<ExecutionResult, ExecutionError>>) -> Self {
        Self {
            results: Mutex::new(results.into_iter().rev().collect()),
            executed: Mutex::default(),
        }
    }
}

impl Executor for FakeStore {
    fn execute<'a>(&'a self, program: &'a CompiledProgram) -> BoxFuture<'a, Result<ExecutionResult, ExecutionError>> {
        Box::pin(async move {
            self.executed.lock().unwrap().push(program.access_mode);
            self.results.lock().unwrap().pop().unwrap_or_else(|| Ok(ExecutionResult::default()))
        })
    }
}

fn row(value: Value) -> Map<String, Value> {
    let mut row = Map::new();
    row.insert("this".into(), value);
    row
}

#[tokio::test]
async fn reads_assemble_the_response() {
    let handle = SchemaHandle::build(MOVIES).unwrap();
    let operation = handle
        .translate(
            "{ films: movies { title } total: moviesAggregate { count } }",
            None,
            &Map::new(),
            &TranslationContext::new(),
        )
        .unwrap();

    let store = FakeStore::new(vec![
        Ok(ExecutionResult {
            rows: vec![row(json!({ "title": "Heat" })), row(json!({ "title": "Ronin" }))],
            counters: Counters::default(),
        }),
        Ok(ExecutionResult {
            rows: vec![row(json!({ "count": 2 }))],
            counters: Counters::default(),
        }),
    ]);

    let data = operation.execute(&store).await.unwrap();

    insta::assert_json_snapshot!(data, @r###"
    {
      "films": [
        {
          "title": "Heat"
        },
        {
          "title": "Ronin"
        }
      ],
      "total": {
        "count": 2
      }
    }
    "###);
    assert_eq!(*store.executed.lock().unwrap(), vec![AccessMode::Read, AccessMode::Read]);
}

#[tokio::test]
async fn mutations_report_counters() {
    let handle = SchemaHandle::build(MOVIES).unwrap();
    let operation = handle
        .translate(
            r#"mutation { createMovies(input: [{ title: "Heat" }]) { info { nodesCreated } movies { title } } }"#,
            None,
            &Map::new(),
            &TranslationContext::new(),
        )
        .unwrap();

    assert_eq!(operation.access_mode(), AccessMode::Write);

    let store = FakeStore::new(vec![Ok(ExecutionResult {
        rows: vec![row(json!([{ "title": "Heat" }]))],
        counters: Counters {
            nodes_created: 1,
            properties_set: 1,
            ..Default::default()
        },
    })]);

    let data = operation.execute(&store).await.unwrap();

    assert_eq!(
        data,
        json!({
            "createMovies": {
                "info": { "nodesCreated": 1 },
                "movies": [{ "title": "Heat" }]
            }
        })
    );
}

#[tokio::test]
async fn first_failure_aborts_the_operation() {
    let handle = SchemaHandle::build(MOVIES).unwrap();
    let operation = handle
        .translate(
            "{ first: movies { title } second: movies { released } }",
            None,
            &Map::new(),
            &TranslationContext::new(),
        )
        .unwrap();

    let store = FakeStore::new(vec![Err(ExecutionError::from_store_message(
        "java.lang.RuntimeException: @graphql-cypher/FORBIDDEN",
    ))]);

    let error = operation.execute(&store).await.unwrap_err();

    assert_eq!(error, ExecutionError::Forbidden);
    assert_eq!(store.executed.lock().unwrap().len(), 1);
}
