#![allow(unused_crate_dependencies)]

use graphql_cypher_schema::*;
use pretty_assertions::assert_eq;

#[ctor::ctor]
fn setup_logging() {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .parse(std::env::var("RUST_LOG").unwrap_or("graphql_cypher_schema=debug".to_string()))
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
        actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
        director: Person @relationship(type: "DIRECTED", direction: IN, nestedOperations: [CONNECT])
    }

    type Actor @node(labels: ["Actor", "Person"]) {
        name: String! @alias(property: "fullName")
        movies: [Movie!]! @relationship(type: "ACTED_IN", direction: OUT, properties: "ActedIn")
    }

    type Person {
        id: ID! @id
        name: String!
    }

    type ActedIn @relationshipProperties {
        screenTime: Int
    }
"#;

fn paths(errors: &SchemaErrors) -> Vec<String> {
    errors.iter().map(|error| error.path.join(".")).collect()
}

#[test]
fn node_types_and_root_fields() {
    let schema = Schema::build(MOVIES).unwrap();
    let movie = schema.type_definition_by_name("Movie").unwrap();

    assert!(movie.is_node());
    assert_eq!(schema.query_field("movies"), Some(RootField::Read(movie.id())));
    assert_eq!(schema.query_field("moviesAggregate"), Some(RootField::Aggregate(movie.id())));
    assert_eq!(schema.query_field("moviesConnection"), Some(RootField::Connection(movie.id())));
    assert_eq!(schema.mutation_field("createMovies"), Some(RootField::Create(movie.id())));
    assert_eq!(schema.mutation_field("updateMovies"), Some(RootField::Update(movie.id())));
    assert_eq!(schema.mutation_field("deleteMovies"), Some(RootField::Delete(movie.id())));
    assert!(schema.query_field("people").is_some());

    let acted_in = schema.type_definition_by_name("ActedIn").unwrap();
    assert_eq!(acted_in.kind, TypeKind::RelationshipProperties);
    assert_eq!(schema.query_field("actedIns"), None);
}

#[test]
fn relationships() {
    let schema = Schema::build(MOVIES).unwrap();
    let movie = schema.type_definition_by_name("Movie").unwrap();

    let actors = movie.field_by_name("actors").and_then(|field| field.relationship()).unwrap();
    assert_eq!(actors.relationship_type(), "ACTED_IN");
    assert_eq!(actors.direction, RelationshipDirection::In);
    assert_eq!(actors.target().name(), "Actor");
    assert_eq!(actors.properties().map(|properties| properties.name()), Some("ActedIn"));
    assert!(actors.is_many());
    assert!(actors.is_aggregable());
    assert!(actors.allows(NestedOperations::CONNECT_OR_CREATE));

    let director = movie.field_by_name("director").and_then(|field| field.relationship()).unwrap();
    assert!(!director.is_many());
    assert!(!director.is_aggregable());
    assert!(director.allows(NestedOperations::CONNECT));
    assert!(!director.allows(NestedOperations::CREATE));
}

#[test]
fn labels_and_aliases() {
    let schema = Schema::build(MOVIES).unwrap();
    let actor = schema.type_definition_by_name("Actor").unwrap();

    assert_eq!(
        actor.labels,
        vec![
            LabelExpression::Literal("Actor".into()),
            LabelExpression::Literal("Person".into())
        ]
    );
    assert_eq!(actor.field_by_name("name").unwrap().database_name(), "fullName");

    let person = schema.type_definition_by_name("Person").unwrap();
    assert_eq!(
        person.field_by_name("id").unwrap().id,
        Some(IdDirective { autogenerate: true })
    );
    assert_eq!(
        person.unique_fields().map(|field| field.name()).collect::<Vec<_>>(),
        vec!["id"]
    );
}

#[test]
fn one_error_per_field_without_relationship_properties() {
    let sdl = r#"
        type Movie {
            title: String!
            actors: [Actor!]! @relationship(type: "ACTED_IN", direction: IN, properties: "ActedIn")
        }

        type Actor {
            name: String!
            movies: [Movie!]! @relationship(type: "ACTED_IN", direction: OUT, properties: "ActedIn")
        }

        type ActedIn {
            screenTime: Int
        }
    "#;

    let errors = Schema::build(sdl).unwrap_err();

    assert_eq!(
        paths(&errors),
        vec![
            "Movie.actors.@relationship.properties",
            "Actor.movies.@relationship.properties"
        ]
    );
    assert!(errors
        .iter()
        .all(|error| error.kind == SchemaErrorKind::MissingRelationshipProperties("ActedIn".into())));
    assert_eq!(
        errors.iter().next().unwrap().to_string(),
        "Movie.actors.@relationship.properties: The relationship properties type `ActedIn` must be annotated with @relationshipProperties"
    );
}

#[rstest::rstest]
#[case::default_above_max("@limit(default: 10, max: 5)")]
#[case::negative("@limit(default: -1)")]
#[case::zero("@limit(max: 0)")]
#[case::non_integral("@limit(max: 2.5)")]
#[case::above_u32("@limit(max: 5000000000)")]
fn invalid_limits(#[case] directive: &str) {
    let sdl = format!("type Movie {directive} {{ title: String }}");
    let errors = Schema::build(&sdl).unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors.iter().next().unwrap().kind, SchemaErrorKind::InvalidLimit(_)));
    assert_eq!(errors.iter().next().unwrap().path[..2], ["Movie", "@limit"]);
}

#[test]
fn limits() {
    let schema = Schema::build("type Movie @limit(default: 10, max: 100) { title: String }").unwrap();
    let movie = schema.type_definition_by_name("Movie").unwrap();

    assert_eq!(
        movie.limit,
        Some(LimitDirective {
            default: Some(10),
            max: Some(100)
        })
    );
}

#[test]
fn resolver_exclusions() {
    let sdl = r#"
        type Movie @exclude(operations: [CREATE, DELETE]) @query(read: true, aggregate: false) {
            title: String
        }

        type Secret @exclude {
            value: String
        }

        type Genre @mutation(operations: [UPDATE]) {
            name: String
        }
    "#;

    let schema = Schema::build(sdl).unwrap();

    assert!(schema.query_field("movies").is_some());
    assert!(schema.query_field("moviesAggregate").is_none());
    assert!(schema.mutation_field("createMovies").is_none());
    assert!(schema.mutation_field("updateMovies").is_some());
    assert!(schema.mutation_field("deleteMovies").is_none());

    assert!(schema.query_field("secrets").is_none());
    assert!(schema.mutation_field("createSecrets").is_none());

    assert!(schema.query_field("genres").is_some());
    assert!(schema.mutation_field("createGenres").is_none());
    assert!(schema.mutation_field("updateGenres").is_some());
}

#[test]
fn invalid_exclusion_literal() {
    let errors = Schema::build("type Movie @exclude(operations: [SUBSCRIBE]) { title: String }").unwrap_err();

    assert_eq!(
        errors.iter().map(|error| error.kind.clone()).collect::<Vec<_>>(),
        vec![SchemaErrorKind::InvalidOperation {
            directive: "exclude",
            value: "SUBSCRIBE".into()
        }]
    );
}

#[test]
fn authorization_rules() {
    let sdl = r#"
        type JWT @jwt {
            roles: [String!]! @jwtClaim(path: "realm_access.roles")
        }

        type User {
            id: ID! @id
            name: String
        }

        type Post
            @authorization(
                filter: [{ where: { node: { author: { id: "$jwt.sub" } } } }]
                validate: [{ operations: [CREATE], when: [AFTER], where: { jwt: { roles_INCLUDES: "admin" } } }]
            ) {
            title: String
            author: User! @relationship(type: "WROTE", direction: IN)
        }
    "#;

    let schema = Schema::build(sdl).unwrap();
    let post = schema.type_definition_by_name("Post").unwrap();
    let user = schema.type_definition_by_name("User").unwrap();
    let rules = post.authorization.clone().unwrap();

    assert_eq!(
        rules.filter,
        vec![FilterRule {
            operations: AuthOperations::filter_default(),
            require_authentication: true,
            predicate: Some(AuthPredicate::Relationship {
                field_id: post.field_by_name("author").unwrap().id(),
                quantifier: Quantifier::Some,
                predicate: Box::new(AuthPredicate::Property {
                    field_id: user.field_by_name("id").unwrap().id(),
                    operator: ScalarOperator::EQUAL,
                    value: AuthValue::Jwt("sub".into()),
                }),
            }),
        }]
    );

    assert_eq!(
        rules.validate,
        vec![ValidateRule {
            operations: AuthOperations::CREATE,
            when: When::AFTER,
            require_authentication: true,
            predicate: Some(AuthPredicate::Claim {
                path: "realm_access.roles".into(),
                operator: ScalarOperator {
                    comparison: ComparisonOperator::Includes,
                    negated: false,
                },
                value: AuthValue::Literal(serde_json::json!("admin")),
            }),
        }]
    );

    assert_eq!(schema.type_definition_by_name("JWT").unwrap().kind, TypeKind::Jwt);
    assert_eq!(schema.jwt_claim_path("roles"), "realm_access.roles");
    assert_eq!(schema.jwt_claim_path("sub"), "sub");
}

#[test]
fn unknown_field_in_authorization_rule() {
    let sdl = r#"
        type Post @authorization(filter: [{ where: { node: { owner: "$jwt.sub" } } }]) {
            title: String
        }
    "#;

    let errors = Schema::build(sdl).unwrap_err();

    assert_eq!(paths(&errors), vec!["Post.@authorization.filter[0]"]);
    assert!(matches!(
        errors.iter().next().unwrap().kind,
        SchemaErrorKind::InvalidAuthorization(_)
    ));
}

#[test]
fn custom_statements_on_root_types() {
    let sdl = r#"
        type Movie {
            title: String
        }

        type Query {
            topMovies(limit: Int = 3): [Movie!]!
                @cypher(statement: "MATCH (m:Movie) RETURN m LIMIT $limit", columnName: "m")
            ignored: Int
        }
    "#;

    let schema = Schema::build(sdl).unwrap();
    let Some(RootField::Custom(field_id)) = schema.query_field("topMovies") else {
        unreachable!("topMovies is a custom root field")
    };

    let field = schema.walk(field_id);
    let statement = field.custom_statement().unwrap();
    assert_eq!(statement.statement(), "MATCH (m:Movie) RETURN m LIMIT $limit");
    assert_eq!(statement.column_name(), "m");
    assert_eq!(field.target_type().map(|ty| ty.name()), Some("Movie"));
    assert_eq!(
        field.arguments().map(|argument| argument.default.clone()).collect::<Vec<_>>(),
        vec![Some(serde_json::json!(3))]
    );
    assert_eq!(schema.query_field("ignored"), None);
}

#[test]
fn object_field_without_relationship() {
    let sdl = r#"
        type Movie {
            title: String
            sequel: Movie
        }
    "#;

    let errors = Schema::build(sdl).unwrap_err();

    assert_eq!(paths(&errors), vec!["Movie.sequel"]);
    assert_eq!(
        errors.iter().next().unwrap().kind,
        SchemaErrorKind::MissingRelationship("Movie".into())
    );
}

#[test]
fn indexes_and_plurals() {
    let sdl = r#"
        type Movie
            @plural(value: "films")
            @fulltext(indexes: [{ indexName: "movieTitles", fields: ["title"] }])
            @vector(indexes: [{ indexName: "moviePlots", embeddingProperty: "plotEmbedding", queryName: "similarFilms" }]) {
            title: String
        }
    "#;

    let schema = Schema::build(sdl).unwrap();
    let movie = schema.type_definition_by_name("Movie").unwrap();

    assert_eq!(schema.query_field("films"), Some(RootField::Read(movie.id())));
    assert_eq!(
        schema.query_field("filmsFulltextMovieTitles"),
        Some(RootField::Fulltext { ty: movie.id(), index: 0 })
    );
    assert_eq!(
        schema.query_field("similarFilms"),
        Some(RootField::Vector { ty: movie.id(), index: 0 })
    );
    assert_eq!(schema.mutation_field("createFilms"), Some(RootField::Create(movie.id())));
}

#[test]
fn fulltext_over_non_string_field() {
    let sdl = r#"
        type Movie @fulltext(indexes: [{ indexName: "byYear", fields: ["released"] }]) {
            released: Int
        }
    "#;

    let errors = Schema::build(sdl).unwrap_err();
    assert_eq!(paths(&errors), vec!["Movie.@fulltext.indexes[0]"]);
}

#[test]
fn interfaces_and_unions() {
    let sdl = r#"
        interface Production {
            title: String!
        }

        type Movie implements Production {
            title: String!
        }

        type Series implements Production {
            title: String!
        }

        union SearchResult = Movie | Series

        type Actor {
            name: String!
            actedIn: [Production!]! @relationship(type: "ACTED_IN", direction: OUT)
        }
    "#;

    let schema = Schema::build(sdl).unwrap();
    let production = schema.type_definition_by_name("Production").unwrap();

    assert!(production.is_abstract());
    assert_eq!(
        production.possible_types().map(|ty| ty.name()).collect::<Vec<_>>(),
        vec!["Movie", "Series"]
    );
    assert_eq!(
        schema
            .type_definition_by_name("SearchResult")
            .unwrap()
            .possible_types()
            .map(|ty| ty.name())
            .collect::<Vec<_>>(),
        vec!["Movie", "Series"]
    );

    assert_eq!(schema.query_field("productions"), Some(RootField::Read(production.id())));
    assert!(schema.query_field("series").is_some());
    assert!(schema.query_field("seriesConnection").is_some());

    let acted_in = schema
        .type_definition_by_name("Actor")
        .and_then(|actor| actor.field_by_name("actedIn"))
        .and_then(|field| field.relationship())
        .unwrap();
    assert!(acted_in.is_aggregable());
}

#[test]
fn parse_errors() {
    let errors = Schema::build("type Movie {").unwrap_err();

    assert_eq!(errors.len(), 1);
    assert!(matches!(errors.iter().next().unwrap().kind, SchemaErrorKind::Parse(_)));
}
