#![allow(unused_crate_dependencies)]

use cypher_builder::Value;
use graphql_cypher::{translate, AccessMode, CompiledOperation, CompiledProgram, TranslationContext, TranslationError};
use graphql_cypher_auth::Claims;
use graphql_cypher_schema::Schema;
use pretty_assertions::assert_eq;
use serde_json::{json, Map};

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
        actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN)
        director: Person @relationship(type: "DIRECTED", direction: IN, nestedOperations: [CONNECT])
        similar(limit: Int = 3): [Movie!]!
            @cypher(statement: "MATCH (this)-[:SIMILAR]->(m:Movie) RETURN m LIMIT $limit", columnName: "m")
    }

    type Actor @node(labels: ["Actor", "Person"]) {
        name: String! @alias(property: "fullName")
        movies: [Movie!]! @relationship(type: "ACTED_IN", direction: OUT)
    }

    type Person {
        id: ID! @id
        name: String!
    }
"#;

fn compile_with(sdl: &str, query: &str, ctx: &TranslationContext) -> Result<CompiledOperation, TranslationError> {
    let schema = Schema::build(sdl).unwrap();
    translate(&schema, query, None, &Map::new(), ctx)
}

fn compile(sdl: &str, query: &str) -> CompiledProgram {
    let operation = compile_with(sdl, query, &TranslationContext::new()).unwrap();
    assert_eq!(operation.programs.len(), 1);

    operation.programs.into_iter().next().map(|(_, program)| program).unwrap()
}

#[test]
fn nested_aggregate_scoped_to_the_filtered_parent() {
    let program = compile(
        MOVIES,
        r#"{ movies(where: { title: "X" }) { title actorsAggregate { count } } }"#,
    );

    insta::assert_snapshot!(program.statement, @r###"
    MATCH (this:Movie)
    WHERE this.title = $param0
    CALL {
        WITH this
        MATCH (this)<-[this0:ACTED_IN]-(this1:Actor:Person)
        RETURN count(this1) AS var2
    }
    RETURN this { .title, actorsAggregate: { count: var2 } } AS this
    "###);

    assert_eq!(program.params.len(), 1);
    assert_eq!(program.params["param0"], Value::String("X".into()));
    assert_eq!(program.access_mode, AccessMode::Read);
}

#[test]
fn translation_is_deterministic() {
    let query = r#"{ movies(where: { released_GT: 1990 }) { title actors { name } director { name } } }"#;

    let first = compile_with(MOVIES, query, &TranslationContext::new()).unwrap();
    let second = compile_with(MOVIES, query, &TranslationContext::new()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn variables_bind_like_literals() {
    let schema = Schema::build(MOVIES).unwrap();
    let ctx = TranslationContext::new();

    let literal = translate(&schema, r#"{ movies(where: { title: "X" }) { title } }"#, None, &Map::new(), &ctx).unwrap();

    let mut variables = Map::new();
    variables.insert("title".into(), json!("X"));
    let bound = translate(
        &schema,
        "query Movies($title: String) { movies(where: { title: $title }) { title } }",
        None,
        &variables,
        &ctx,
    )
    .unwrap();

    assert_eq!(literal, bound);
}

#[test]
fn aliased_fields_read_their_database_property() {
    let program = compile(MOVIES, r#"{ actors(where: { name: "Keanu" }) { name } }"#);

    assert!(program.statement.contains("MATCH (this:Actor:Person)"));
    assert!(program.statement.contains("this.fullName = $param0"));
    assert!(program.statement.contains("name: this.fullName"));
    assert!(!program.statement.contains(".name"));
}

#[test]
fn null_relationship_filter_matches_nodes_without_relationship() {
    let program = compile(MOVIES, "{ movies(where: { director: null }) { title } }");

    assert!(program.statement.contains("NOT (EXISTS {"));
    assert!(program.statement.contains(":DIRECTED]-("));
    assert!(program.statement.contains(":Person)"));
    assert!(program.params.is_empty());
}

#[test]
fn custom_field_arguments_become_params() {
    let program = compile(MOVIES, "{ movies { similar(limit: 5) { title } } }");

    assert!(program.statement.contains("MATCH (this)-[:SIMILAR]->(m:Movie) RETURN m LIMIT $param0"));
    assert!(!program.statement.contains("$limit"));
    assert_eq!(program.params["param0"], Value::Integer(5));

    let defaulted = compile(MOVIES, "{ movies { similar { title } } }");
    assert_eq!(defaulted.params["param0"], Value::Integer(3));
}

#[rstest::rstest]
#[case::default_limit("{ movies { title } }", 10)]
#[case::requested_limit("{ movies(limit: 20) { title } }", 20)]
#[case::capped_limit("{ movies(limit: 500) { title } }", 100)]
#[case::capped_options("{ movies(options: { limit: 500 }) { title } }", 100)]
fn limits(#[case] query: &str, #[case] expected: i64) {
    let program = compile("type Movie @limit(default: 10, max: 100) { title: String }", query);

    assert!(program.statement.contains("LIMIT $param0"));
    assert_eq!(program.params.len(), 1);
    assert_eq!(program.params["param0"], Value::Integer(expected));
}

#[test]
fn labels_from_the_request_context() {
    let sdl = r#"type Movie @node(labels: ["Movie", "$context.tenant"]) { title: String }"#;
    let query = "{ movies { title } }";

    let error = compile_with(sdl, query, &TranslationContext::new()).unwrap_err();
    assert_eq!(error, TranslationError::UnresolvedLabel("$context.tenant".into()));

    let ctx = TranslationContext::new().with_value("tenant", json!("Acme"));
    let operation = compile_with(sdl, query, &ctx).unwrap();
    assert!(operation.programs[0].1.statement.starts_with("MATCH (this:Movie:Acme)"));
}

#[test]
fn nested_operations_respect_the_relationship() {
    let create = r#"
        mutation {
            createMovies(input: [{ title: "Heat", director: { create: { node: { name: "Mann" } } } }]) {
                movies { title }
            }
        }
    "#;

    let error = compile_with(MOVIES, create, &TranslationContext::new()).unwrap_err();
    assert_eq!(
        error,
        TranslationError::NestedOperationNotAllowed {
            ty: "Movie".into(),
            field: "director".into(),
            operation: "create",
        }
    );

    let connect = r#"
        mutation {
            createMovies(input: [{ title: "Heat", director: { connect: { where: { node: { name: "Mann" } } } } }]) {
                movies { title }
            }
        }
    "#;

    let program = compile(MOVIES, connect);
    assert_eq!(program.access_mode, AccessMode::Write);
    assert!(program.statement.contains("CREATE (this0:Movie)"));
    assert!(program.statement.contains("MERGE (this0)<-["));
    assert!(program.statement.contains("UNWIND [this0] AS this"));
}

const POSTS: &str = r#"
    type Post @authorization(filter: [{ where: { node: { owner: "$jwt.sub" } } }]) {
        title: String
        owner: String
    }

    type Note @authorization(validate: [{ where: { node: { owner: "$jwt.sub" } } }]) {
        title: String
        owner: String
    }
"#;

#[test]
fn filter_rules_exclude_nodes() {
    let mut claims = Map::new();
    claims.insert("sub".into(), json!("alice"));
    let ctx = TranslationContext::new().with_claims(Some(Claims::new(claims)));

    let operation = compile_with(POSTS, "{ posts { title } }", &ctx).unwrap();
    let program = &operation.programs[0].1;

    assert!(program.statement.contains("this.owner = $jwt.sub"));
    assert!(!program.statement.contains("validatePredicate"));
    assert_eq!(program.params["isAuthenticated"], Value::Boolean(true));
    assert_eq!(program.params["jwt"], Value::from(json!({ "sub": "alice" })));
}

#[test]
fn validation_rules_raise_errors() {
    let program = compile(POSTS, "{ notes { title } }");

    assert!(program.statement.contains("apoc.util.validatePredicate(NOT ("));
    assert!(program.statement.contains(r#""@graphql-cypher/FORBIDDEN", [0])"#));
    assert!(program.statement.contains("this.owner = $jwt.sub"));
    assert_eq!(program.params["isAuthenticated"], Value::Boolean(false));
    assert_eq!(program.params["jwt"], Value::from(json!({})));
}

const PRODUCTIONS: &str = r#"
    interface Production {
        title: String!
    }

    type Movie implements Production {
        title: String!
    }

    type Series implements Production {
        title: String!
        episodes: Int
    }
"#;

#[test]
fn abstract_selections_union_their_members() {
    let program = compile(PRODUCTIONS, "{ productions { title ... on Series { episodes } } }");

    assert!(program.statement.starts_with("CALL {"));
    assert!(program.statement.contains("MATCH (this0:Movie)"));
    assert!(program.statement.contains("UNION"));
    assert!(program.statement.contains("MATCH (this1:Series)"));
    assert!(program.statement.contains(".episodes"));
}

#[test]
fn total_count_precedes_pagination() {
    let program = compile(
        MOVIES,
        "{ moviesConnection(first: 2) { totalCount edges { node { title } } } }",
    );

    let total = program.statement.find("size(edges)").unwrap();
    let limit = program.statement.find("LIMIT").unwrap();
    assert!(total < limit);
    assert!(program.params.values().any(|value| *value == Value::Integer(2)));
}

#[test]
fn one_program_per_root_field() {
    let operation = compile_with(
        MOVIES,
        "{ movies { title } people: people { name } }",
        &TranslationContext::new(),
    )
    .unwrap();

    let keys = operation.programs.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["movies", "people"]);
    assert_eq!(operation.access_mode(), AccessMode::Read);
}

#[test]
fn unknown_fields_are_rejected() {
    let error = compile_with(MOVIES, "{ movies { rating } }", &TranslationContext::new()).unwrap_err();

    assert_eq!(
        error,
        TranslationError::UnknownField {
            ty: "Movie".into(),
            field: "rating".into()
        }
    );
}

#[test]
fn interface_filters_bind_each_literal_once() {
    let program = compile(PRODUCTIONS, r#"{ productions(where: { title: "X" }) { title } }"#);

    assert!(program.statement.contains("MATCH (this0:Movie)\n    WHERE this0.title = $param0"));
    assert!(program.statement.contains("MATCH (this1:Series)\n    WHERE this1.title = $param0"));
    assert_eq!(program.params.len(), 1);
    assert_eq!(program.params["param0"], Value::String("X".into()));
}

#[test]
fn type_narrowing_applies_to_its_branch_only() {
    let program = compile(
        PRODUCTIONS,
        r#"{ productions(where: { title: "X", _on: { Series: { episodes_GT: 2 } } }) { title } }"#,
    );

    assert!(program.statement.contains("MATCH (this0:Movie)\n    WHERE this0.title = $param0\n"));
    assert!(program
        .statement
        .contains("MATCH (this1:Series)\n    WHERE (this1.title = $param0 AND this1.episodes > $param1)"));
    assert_eq!(program.params["param1"], Value::Integer(2));

    let program = compile(PRODUCTIONS, "{ productions(where: { typename_IN: [Series] }) { title } }");

    assert!(program.statement.contains("MATCH (this0:Movie)\n    WHERE false"));
    assert!(program.statement.contains("MATCH (this1:Series)\n    RETURN"));
}

#[test]
fn failing_validation_empties_only_its_branch() {
    let sdl = r#"
        interface Production {
            title: String!
        }

        type Movie implements Production @authorization(validate: [{ where: { node: { title: "Heat" } } }]) {
            title: String!
        }

        type Series implements Production {
            title: String!
        }
    "#;

    let program = compile(sdl, "{ productions { title } }");

    insta::assert_snapshot!(program.statement, @r###"
    CALL {
        CALL {
            MATCH (this0:Movie)
            WHERE NOT (($isAuthenticated = true AND this0.title = $param0))
            RETURN count(*) AS var1
        }
        MATCH (this0:Movie)
        WHERE var1 = 0
        RETURN this0 { __resolveType: "Movie", .title } AS this
        UNION
        MATCH (this2:Series)
        RETURN this2 { __resolveType: "Series", .title } AS this
    }
    RETURN this
    "###);

    assert!(!program.statement.contains("validatePredicate"));
    assert_eq!(program.params["param0"], Value::String("Heat".into()));
}

#[test]
fn null_to_many_filter_matches_nodes_without_related_nodes() {
    let program = compile(MOVIES, "{ movies(where: { actors: null }) { title } }");

    insta::assert_snapshot!(program.statement, @r###"
    MATCH (this:Movie)
    WHERE NOT (EXISTS {
        MATCH (this)<-[:ACTED_IN]-(this0:Actor:Person)
    })
    RETURN this { .title } AS this
    "###);
    assert!(program.params.is_empty());
}

#[rstest::rstest]
#[case::some("actors_SOME", &["EXISTS {", "WHERE this0.fullName = $param0"])]
#[case::none("actors_NONE", &["NOT (EXISTS {", "WHERE this0.fullName = $param0"])]
#[case::single("actors_SINGLE", &["COUNT {", "} = 1"])]
#[case::all("actors_ALL", &["EXISTS {", "NOT (EXISTS {", "WHERE NOT (this0.fullName = $param0)"])]
fn relationship_quantifiers(#[case] key: &str, #[case] fragments: &[&str]) {
    let program = compile(MOVIES, &format!(r#"{{ movies(where: {{ {key}: {{ name: "Keanu" }} }}) {{ title }} }}"#));

    for fragment in fragments {
        assert!(program.statement.contains(fragment), "{fragment} in {}", program.statement);
    }
    assert_eq!(program.params["param0"], Value::String("Keanu".into()));
}

#[test]
fn negation_wraps_the_whole_filter() {
    let program = compile(MOVIES, r#"{ movies(where: { NOT: { title: "A", released: 1999 } }) { title } }"#);

    assert!(program
        .statement
        .contains("WHERE NOT ((this.title = $param0 AND this.released = $param1))"));
    assert_eq!(program.params["param1"], Value::Integer(1999));
}

#[test]
fn aggregate_filters_count_and_compare_related_fields() {
    let program = compile(
        MOVIES,
        "{ movies(where: { actorsAggregate: { count_GT: 1, node: { name_SHORTEST_LENGTH_LT: 5 } } }) { title } }",
    );

    assert!(program
        .statement
        .contains("MATCH (this)<-[this0:ACTED_IN]-(this1:Actor:Person)"));
    assert!(program
        .statement
        .contains("RETURN (count(this1) > $param0 AND min(size(this1.fullName)) < $param1) AS var2"));
    assert!(program.statement.contains("var2 = true"));
    assert_eq!(program.params["param0"], Value::Integer(1));
    assert_eq!(program.params["param1"], Value::Integer(5));
}

#[test]
fn longest_and_shortest_order_by_length() {
    let program = compile(MOVIES, "{ moviesAggregate { title { longest shortest } } }");

    let statement = &program.statement;
    assert!(statement.contains("ORDER BY size("), "{statement}");
    assert!(statement.contains(".title) DESC, "), "{statement}");
    assert!(statement.contains(".title ASC"), "{statement}");
    assert!(statement.contains("longest: head(var"), "{statement}");
    assert!(statement.contains("shortest: last(var"), "{statement}");
}

#[test]
fn after_rules_see_the_created_node() {
    let sdl = r#"
        type Post @authorization(validate: [{ operations: [CREATE], when: [AFTER], where: { node: { owner: "$jwt.sub" } } }]) {
            title: String
            owner: String
        }
    "#;

    let program = compile(
        sdl,
        r#"mutation { createPosts(input: [{ title: "A", owner: "alice" }]) { posts { title } } }"#,
    );

    let statement = &program.statement;
    let created = statement.find("CREATE (this0:Post)").unwrap();
    let set = statement.find("SET this0.").unwrap();
    let guard = statement.find("apoc.util.validatePredicate").unwrap();

    assert!(created < set && set < guard, "{statement}");
    assert!(statement[guard..].contains("this0.owner = $jwt.sub"), "{statement}");
}

#[test]
fn computed_sort_keys_run_before_ordering() {
    let sdl = r#"
        type Movie {
            title: String!
            rating: Float @cypher(statement: "MATCH (this)<-[r:RATED]-() RETURN avg(r.score) AS rating", columnName: "rating")
        }
    "#;

    let program = compile(sdl, "{ movies(sort: [{ rating: DESC }]) { title } }");

    let statement = &program.statement;
    let computed = statement.find("RETURN avg(r.score) AS rating").unwrap();
    let order = statement.find("ORDER BY").unwrap();

    assert!(computed < order, "{statement}");
    assert!(statement[order..].contains(" DESC"), "{statement}");
}

#[test]
fn connection_filters_on_relationship_properties() {
    let sdl = r#"
        type Movie {
            title: String!
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
        }

        type Actor {
            name: String!
        }

        type ActedIn @relationshipProperties {
            role: String
        }
    "#;

    let program = compile(
        sdl,
        r#"{ movies { actorsConnection(where: { edge: { role: "Neo" } }) { edges { node { name } } } } }"#,
    );

    let statement = &program.statement;
    assert!(statement.contains("MATCH (this)<-[this0:ACTED_IN]-(this1:Actor)"), "{statement}");
    assert!(statement.contains("WHERE this0.role = $param0"), "{statement}");
    assert_eq!(program.params["param0"], Value::String("Neo".into()));
}

#[test]
fn custom_statements_reading_claims_bind_the_token() {
    let sdl = r#"
        type Movie {
            title: String!
            mine: Boolean @cypher(statement: "RETURN this.owner = $jwt.sub AS mine", columnName: "mine")
        }
    "#;

    let program = compile(sdl, "{ movies { mine } }");
    assert!(program.statement.contains("RETURN this.owner = $jwt.sub AS mine"));
    assert_eq!(program.params["jwt"], Value::from(json!({})));

    let program = compile(sdl, "{ movies { title } }");
    assert!(!program.params.contains_key("jwt"));
}
