use cynic_parser::type_system as ast;
use serde_json::Value;

use super::super::{sdl::*, SchemaBuilder, SchemaErrorKind};
use crate::*;

impl SchemaBuilder {
    /// `@authorization(filter: [...], validate: [...])`, predicates are relative to `type_id`.
    pub(in crate::builder) fn ingest_authorization(
        &mut self,
        type_id: TypeDefinitionId,
        path: &[&str],
        directive: ast::Directive<'_>,
    ) -> Option<AuthorizationRules> {
        let arguments = directive_arguments(directive);
        let mut rules = AuthorizationRules::default();
        let mut errors = Vec::new();

        for (index, rule) in list(arguments.get("filter")).iter().enumerate() {
            match parse_filter_rule(&self.schema, type_id, rule) {
                Ok(rule) => rules.filter.push(rule),
                Err(message) => errors.push((format!("filter[{index}]"), message)),
            }
        }

        for (index, rule) in list(arguments.get("validate")).iter().enumerate() {
            match parse_validate_rule(&self.schema, type_id, rule) {
                Ok(rule) => rules.validate.push(rule),
                Err(message) => errors.push((format!("validate[{index}]"), message)),
            }
        }

        if errors.is_empty() {
            return Some(rules);
        }

        for (location, message) in errors {
            let path = path.iter().copied().chain(["@authorization", location.as_str()]);
            self.error(path, SchemaErrorKind::InvalidAuthorization(message));
        }

        None
    }

    /// `@authentication(operations: [...], jwt: {...})`
    pub(in crate::builder) fn ingest_authentication(
        &mut self,
        path: &[&str],
        directive: ast::Directive<'_>,
    ) -> Option<AuthenticationRule> {
        let arguments = directive_arguments(directive);

        let result = operations(arguments.get("operations"), AuthOperations::all()).and_then(|operations| {
            let jwt = arguments
                .get("jwt")
                .map(|jwt| parse_claim_predicate(&self.schema, jwt))
                .transpose()?;

            Ok(AuthenticationRule { operations, jwt })
        });

        match result {
            Ok(rule) => Some(rule),
            Err(message) => {
                let path = path.iter().copied().chain(["@authentication"]);
                self.error(path, SchemaErrorKind::InvalidAuthorization(message));
                None
            }
        }
    }

    pub(in crate::builder) fn ingest_field_auth_directives(
        &mut self,
        type_id: TypeDefinitionId,
        field_id: FieldDefinitionId,
        directives: &[ast::Directive<'_>],
    ) {
        let type_name = self.schema[type_id].name.clone();
        let field_name = self.schema[field_id].name.clone();
        let path = [type_name.as_str(), field_name.as_str()];

        if let Some(directive) = find_directive(directives.iter().copied(), "authorization") {
            let rules = self.ingest_authorization(type_id, &path, directive);
            self.schema[field_id].authorization = rules;
        }

        if let Some(directive) = find_directive(directives.iter().copied(), "authentication") {
            let rule = self.ingest_authentication(&path, directive);
            self.schema[field_id].authentication = rule;
        }
    }
}

fn list(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other.clone()],
    }
}

fn operations(value: Option<&Value>, default: AuthOperations) -> Result<AuthOperations, String> {
    let Some(value) = value else {
        return Ok(default);
    };

    let names = string_list(value).ok_or_else(|| "`operations` must be a list of operations".to_string())?;

    names.iter().try_fold(AuthOperations::empty(), |operations, name| {
        AuthOperations::parse(name)
            .map(|operation| operations | operation)
            .ok_or_else(|| format!("unknown operation `{name}`"))
    })
}

fn require_authentication(rule: &serde_json::Map<String, Value>) -> bool {
    rule.get("requireAuthentication")
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

fn parse_filter_rule(schema: &Schema, type_id: TypeDefinitionId, rule: &Value) -> Result<FilterRule, String> {
    let rule = rule.as_object().ok_or("a rule must be an object")?;

    Ok(FilterRule {
        operations: operations(rule.get("operations"), AuthOperations::filter_default())?,
        require_authentication: require_authentication(rule),
        predicate: rule
            .get("where")
            .map(|where_| parse_rule_where(schema, type_id, where_))
            .transpose()?,
    })
}

fn parse_validate_rule(schema: &Schema, type_id: TypeDefinitionId, rule: &Value) -> Result<ValidateRule, String> {
    let rule = rule.as_object().ok_or("a rule must be an object")?;

    let when = match rule.get("when") {
        None => When::all(),
        Some(value) => {
            let names = string_list(value).ok_or("`when` must be a list of BEFORE and AFTER")?;
            names.iter().try_fold(When::empty(), |when, name| {
                When::from_name(name)
                    .map(|flag| when | flag)
                    .ok_or_else(|| format!("unknown `when` value `{name}`"))
            })?
        }
    };

    Ok(ValidateRule {
        operations: operations(rule.get("operations"), AuthOperations::all())?,
        when,
        require_authentication: require_authentication(rule),
        predicate: rule
            .get("where")
            .map(|where_| parse_rule_where(schema, type_id, where_))
            .transpose()?,
    })
}

/// `{ node: {...}, jwt: {...}, AND: [...], OR: [...], NOT: {...} }`
fn parse_rule_where(schema: &Schema, type_id: TypeDefinitionId, value: &Value) -> Result<AuthPredicate, String> {
    let object = value.as_object().ok_or("`where` must be an object")?;
    let mut predicates = Vec::with_capacity(object.len());

    for (key, value) in object {
        let predicate = match key.as_str() {
            "AND" => AuthPredicate::And(
                list(Some(value))
                    .iter()
                    .map(|value| parse_rule_where(schema, type_id, value))
                    .collect::<Result<_, _>>()?,
            ),
            "OR" => AuthPredicate::Or(
                list(Some(value))
                    .iter()
                    .map(|value| parse_rule_where(schema, type_id, value))
                    .collect::<Result<_, _>>()?,
            ),
            "NOT" => AuthPredicate::Not(Box::new(parse_rule_where(schema, type_id, value)?)),
            "node" => parse_node_predicate(schema.walk(type_id), value)?,
            "jwt" => parse_claim_predicate(schema, value)?,
            other => return Err(format!("unknown key `{other}` in `where`")),
        };

        predicates.push(predicate);
    }

    Ok(collapse(predicates))
}

fn collapse(mut predicates: Vec<AuthPredicate>) -> AuthPredicate {
    if predicates.len() == 1 {
        predicates.remove(0)
    } else {
        AuthPredicate::And(predicates)
    }
}

fn parse_node_predicate(ty: TypeDefinition<'_>, value: &Value) -> Result<AuthPredicate, String> {
    let object = value.as_object().ok_or("`node` must be an object")?;
    let mut predicates = Vec::with_capacity(object.len());

    for (key, value) in object {
        let Some(filter_key) = FilterKey::parse(key, ty) else {
            return Err(format!("`{key}` is not a field of `{}`", ty.name()));
        };

        let predicate = match filter_key {
            FilterKey::And => AuthPredicate::And(
                list(Some(value))
                    .iter()
                    .map(|value| parse_node_predicate(ty, value))
                    .collect::<Result<_, _>>()?,
            ),
            FilterKey::Or => AuthPredicate::Or(
                list(Some(value))
                    .iter()
                    .map(|value| parse_node_predicate(ty, value))
                    .collect::<Result<_, _>>()?,
            ),
            FilterKey::Not => AuthPredicate::Not(Box::new(parse_node_predicate(ty, value)?)),
            FilterKey::Scalar { field_id, operator } => AuthPredicate::Property {
                field_id,
                operator,
                value: AuthValue::parse(value.clone()),
            },
            FilterKey::Relationship {
                field_id,
                quantifier: None,
            } if value.is_null() => AuthPredicate::RelationshipIsNull { field_id },
            FilterKey::Relationship { field_id, quantifier } => {
                let target = ty
                    .walk(field_id)
                    .relationship()
                    .map(|relationship| relationship.target())
                    .filter(|target| target.kind != TypeKind::Union)
                    .ok_or_else(|| format!("`{key}` cannot be used in an authorization rule"))?;

                AuthPredicate::Relationship {
                    field_id,
                    quantifier: quantifier.unwrap_or(Quantifier::Some),
                    predicate: Box::new(parse_node_predicate(target, value)?),
                }
            }
            FilterKey::On | FilterKey::TypenameIn | FilterKey::Connection { .. } | FilterKey::Aggregate { .. } => {
                return Err(format!("`{key}` cannot be used in an authorization rule"));
            }
        };

        predicates.push(predicate);
    }

    Ok(collapse(predicates))
}

/// Claim comparisons, `{ roles_INCLUDES: "admin", AND: [...] }`. Claim names are resolved to
/// their path through the `@jwt` type.
fn parse_claim_predicate(schema: &Schema, value: &Value) -> Result<AuthPredicate, String> {
    let object = value.as_object().ok_or("`jwt` must be an object")?;
    let mut predicates = Vec::with_capacity(object.len());

    for (key, value) in object {
        let predicate = match key.as_str() {
            "AND" => AuthPredicate::And(
                list(Some(value))
                    .iter()
                    .map(|value| parse_claim_predicate(schema, value))
                    .collect::<Result<_, _>>()?,
            ),
            "OR" => AuthPredicate::Or(
                list(Some(value))
                    .iter()
                    .map(|value| parse_claim_predicate(schema, value))
                    .collect::<Result<_, _>>()?,
            ),
            "NOT" => AuthPredicate::Not(Box::new(parse_claim_predicate(schema, value)?)),
            key => {
                let (claim, operator) = ScalarOperator::split_key(key);

                AuthPredicate::Claim {
                    path: schema.jwt_claim_path(claim).to_string(),
                    operator,
                    value: AuthValue::parse(value.clone()),
                }
            }
        };

        predicates.push(predicate);
    }

    Ok(collapse(predicates))
}
