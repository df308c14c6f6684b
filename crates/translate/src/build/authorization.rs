use cypher_builder::Variable;
use graphql_cypher_schema::{
    AuthOperations, AuthPredicate, AuthValue, AuthenticationRule, AuthorizationRules, FieldDefinition,
    FieldDefinitionId, Quantifier, Relationship, ScalarType, TypeDefinition, When,
};

use super::{filter::comparison, BuildContext};
use crate::{
    tree::{Filter, GuardKind, Operand, RelatedFilter},
    InputValue, TranslationError,
};

/// The authorization of a write on one node.
#[derive(Debug, Default)]
pub(super) struct Authorization {
    /// Silently excludes the nodes the caller may not write.
    pub filter: Option<Filter>,
    /// Guards checked before writing.
    pub before: Option<Filter>,
    /// Guards checked once written.
    pub after: Option<Filter>,
}

/// The authorization of one branch of an interface or union.
#[derive(Debug, Default)]
pub(super) struct BranchAuthorization {
    pub filter: Option<Filter>,
    /// Must hold for every node of the branch.
    pub gate: Option<Filter>,
}

impl BuildContext<'_> {
    /// Filter rules, validations and authentication of a read or an aggregation.
    pub fn read_authorization(
        &self,
        ty: TypeDefinition<'_>,
        operation: AuthOperations,
        node: Variable,
    ) -> Result<Option<Filter>, TranslationError> {
        let mut filters = Vec::new();

        filters.extend(self.filter_rules(ty.authorization.as_ref(), operation, node)?);
        filters.extend(
            self.validations(ty.authorization.as_ref(), operation, When::all(), node)?
                .map(|validation| Filter::guard(validation, GuardKind::Forbidden)),
        );
        filters.extend(self.authentication(ty.authentication.as_ref(), operation, node)?);

        Ok(Filter::all(filters))
    }

    /// The authorization of one branch of an abstract selection, the rules of the member and of
    /// `parent`, its interface or union. Validations do not fail the operation, they form the gate
    /// of the branch: a violating node empties the branch and leaves its siblings untouched.
    pub(super) fn branch_authorization(
        &self,
        ty: TypeDefinition<'_>,
        parent: TypeDefinition<'_>,
        operation: AuthOperations,
        node: Variable,
    ) -> Result<BranchAuthorization, TranslationError> {
        let mut filters = Vec::new();
        let mut validations = Vec::new();

        for owner in [ty, parent] {
            filters.extend(self.filter_rules(owner.authorization.as_ref(), operation, node)?);
            validations.extend(self.validations(owner.authorization.as_ref(), operation, When::all(), node)?);
            filters.extend(self.authentication(owner.authentication.as_ref(), operation, node)?);
        }

        Ok(BranchAuthorization {
            filter: Filter::all(filters),
            gate: Filter::all(validations),
        })
    }

    pub(super) fn write_authorization(
        &self,
        ty: TypeDefinition<'_>,
        operation: AuthOperations,
        node: Variable,
    ) -> Result<Authorization, TranslationError> {
        let rules = ty.authorization.as_ref();

        let filter = self.filter_rules(rules, operation, node)?;
        let before = self
            .validations(rules, operation, When::BEFORE, node)?
            .map(|validation| Filter::guard(validation, GuardKind::Forbidden));
        let authentication = self.authentication(ty.authentication.as_ref(), operation, node)?;
        let after = self
            .validations(rules, operation, When::AFTER, node)?
            .map(|validation| Filter::guard(validation, GuardKind::Forbidden));

        Ok(Authorization {
            filter,
            before: Filter::all(authentication.into_iter().chain(before)),
            after,
        })
    }

    /// Guards of a selected field. Filter rules of fields are not applied, a field has no rows
    /// to exclude.
    pub(super) fn field_guards(
        &self,
        definition: FieldDefinition<'_>,
        node: Variable,
    ) -> Result<Vec<Filter>, TranslationError> {
        let mut guards = Vec::new();

        let validation = self.validations(
            definition.authorization.as_ref(),
            AuthOperations::READ,
            When::all(),
            node,
        )?;
        guards.extend(validation.map(|validation| Filter::guard(validation, GuardKind::Forbidden)));
        guards.extend(self.authentication(definition.authentication.as_ref(), AuthOperations::READ, node)?);

        Ok(guards)
    }

    /// Filter rules are alternatives, any of them grants access.
    fn filter_rules(
        &self,
        rules: Option<&AuthorizationRules>,
        operation: AuthOperations,
        node: Variable,
    ) -> Result<Option<Filter>, TranslationError> {
        let Some(rules) = rules else {
            return Ok(None);
        };

        let alternatives = rules
            .filters_for(operation)
            .map(|rule| self.rule(rule.require_authentication, rule.predicate.as_ref(), node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Filter::any(alternatives))
    }

    fn validations(
        &self,
        rules: Option<&AuthorizationRules>,
        operation: AuthOperations,
        when: When,
        node: Variable,
    ) -> Result<Option<Filter>, TranslationError> {
        let Some(rules) = rules else {
            return Ok(None);
        };

        let alternatives = rules
            .validations_for(operation, when)
            .map(|rule| self.rule(rule.require_authentication, rule.predicate.as_ref(), node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Filter::any(alternatives))
    }

    fn authentication(
        &self,
        rule: Option<&AuthenticationRule>,
        operation: AuthOperations,
        node: Variable,
    ) -> Result<Option<Filter>, TranslationError> {
        let Some(rule) = rule.filter(|rule| rule.operations.intersects(operation)) else {
            return Ok(None);
        };

        self.mark_auth();

        let jwt = match &rule.jwt {
            Some(predicate) => self.auth_predicate(predicate, node)?,
            None => None,
        };

        let predicate = Filter::all(std::iter::once(Filter::Authenticated).chain(jwt)).unwrap_or(Filter::Authenticated);

        Ok(Some(Filter::guard(predicate, GuardKind::Unauthenticated)))
    }

    fn rule(
        &self,
        require_authentication: bool,
        predicate: Option<&AuthPredicate>,
        node: Variable,
    ) -> Result<Filter, TranslationError> {
        let predicate = match predicate {
            Some(predicate) => self.auth_predicate(predicate, node)?,
            None => None,
        };

        if require_authentication {
            self.mark_auth();
        }

        let authenticated = require_authentication.then_some(Filter::Authenticated);

        Ok(Filter::all(authenticated.into_iter().chain(predicate)).unwrap_or(Filter::Constant(true)))
    }

    fn auth_predicate(&self, predicate: &AuthPredicate, node: Variable) -> Result<Option<Filter>, TranslationError> {
        let filter = match predicate {
            AuthPredicate::And(items) => {
                let mut filters = Vec::new();
                for item in items {
                    filters.extend(self.auth_predicate(item, node)?);
                }
                Filter::all(filters)
            }
            AuthPredicate::Or(items) => {
                let mut filters = Vec::new();
                for item in items {
                    filters.push(self.auth_predicate(item, node)?.unwrap_or(Filter::Constant(true)));
                }
                Filter::any(filters)
            }
            AuthPredicate::Not(inner) => self.auth_predicate(inner, node)?.map(Filter::negate),
            AuthPredicate::Property {
                field_id,
                operator,
                value,
            } => {
                let definition = self.schema.walk(*field_id);
                let left = Operand::Property(node, definition.database_name().to_string());
                let right = self.auth_value(value, definition.scalar_type());
                let guard = right.as_ref().and_then(claim_present);

                let compared = comparison(left, *operator, right).unwrap_or(Filter::Constant(false));
                Filter::all(guard.into_iter().chain(Some(compared)))
            }
            AuthPredicate::Claim { path, operator, value } => {
                self.mark_auth();

                let left = Operand::Claim(self.claim_segments(path));
                let guard = claim_present(&left).filter(|_| !value.is_null());
                let right = self.auth_value(value, None);

                let compared = comparison(left, *operator, right).unwrap_or(Filter::Constant(false));
                Filter::all(guard.into_iter().chain(Some(compared)))
            }
            AuthPredicate::Relationship {
                field_id,
                quantifier,
                predicate,
            } => {
                let relationship = self.rule_relationship(*field_id)?;
                let pattern = self.related_pattern(node, relationship, relationship.target(), false, true)?;
                let predicate = self.auth_predicate(predicate, pattern.node)?;

                Some(Filter::Related(Box::new(RelatedFilter {
                    pattern,
                    quantifier: *quantifier,
                    predicate,
                })))
            }
            AuthPredicate::RelationshipIsNull { field_id } => {
                let relationship = self.rule_relationship(*field_id)?;
                let pattern = self.related_pattern(node, relationship, relationship.target(), false, true)?;

                Some(Filter::Related(Box::new(RelatedFilter {
                    pattern,
                    quantifier: Quantifier::None,
                    predicate: None,
                })))
            }
        };

        Ok(filter)
    }

    fn rule_relationship(&self, field_id: FieldDefinitionId) -> Result<Relationship<'_>, TranslationError> {
        let definition = self.schema.walk(field_id);

        definition.relationship().ok_or_else(|| TranslationError::InvalidFilter {
            ty: definition.parent().name().to_string(),
            key: definition.name().to_string(),
        })
    }

    /// The right side of a rule comparison, `None` for null. Context values are read now,
    /// claims when the statement runs.
    fn auth_value(&self, value: &AuthValue, scalar: Option<ScalarType>) -> Option<Operand> {
        let literal = match value {
            AuthValue::Literal(literal) => Some(literal),
            AuthValue::Jwt(path) => {
                self.mark_auth();
                return Some(Operand::Claim(self.claim_segments(path)));
            }
            AuthValue::Context(path) => self.ctx.context_value(path),
        };

        literal
            .filter(|literal| !literal.is_null())
            .map(|literal| Operand::Param(self.param(InputValue::from(literal.clone()).to_param(scalar))))
    }
}

/// `$jwt.<claim> IS NOT NULL`, comparisons against absent claims never hold.
fn claim_present(operand: &Operand) -> Option<Filter> {
    match operand {
        Operand::Claim(segments) => Some(Filter::IsNull(Operand::Claim(segments.clone())).negate()),
        _ => None,
    }
}
