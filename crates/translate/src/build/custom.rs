use cypher_builder::{Value, Variable};
use graphql_cypher_schema::{AuthOperations, FieldDefinition, ScalarType};

use super::{arguments::Pagination, read::property_format, BuildContext};
use crate::{
    bind::BoundField,
    response::Shape,
    tree::{CustomField, CustomOutput, Filter, PropertyFormat, SortItem, SortKey},
    InputValue, TranslationError,
};

/// Arguments that, once declared by a custom field, belong to its statement rather than to the
/// pagination of its result.
const PAGINATION_ARGUMENTS: &[&str] = &["sort", "limit", "offset", "options"];

impl BuildContext<'_> {
    /// A selected `@cypher` field. Without `parent` it is a root field of `Query` or `Mutation`.
    pub(super) fn custom_field(
        &self,
        definition: FieldDefinition<'_>,
        field: &BoundField,
        parent: Option<Variable>,
    ) -> Result<(CustomField, Shape), TranslationError> {
        let mut custom = self.custom_statement(definition, Some(field), parent)?;

        let target = definition
            .target_type()
            .filter(|target| target.is_node() || target.is_abstract());

        let Some(target) = target else {
            let format = property_format(definition, field)?;
            custom.output = CustomOutput::Scalar(format);
            return Ok((custom, Shape::Value));
        };

        let plan = self.projection(target, field, custom.value)?;
        let authorization = self.read_authorization(target, AuthOperations::READ, custom.value)?;

        let declares_pagination = definition
            .arguments()
            .any(|argument| PAGINATION_ARGUMENTS.contains(&argument.name()));
        let pagination = if declares_pagination || !custom.list {
            Pagination::default()
        } else {
            Pagination::from_field(field)?
        };

        let mut sort = Vec::new();
        for argument in &pagination.sort {
            let property = target
                .field_by_name(&argument.field)
                .filter(|definition| definition.is_property())
                .ok_or_else(|| TranslationError::unknown_field(target.name(), &argument.field))?;

            sort.push(SortItem {
                key: SortKey::Property(property.database_name().to_string()),
                order: argument.order,
            });
        }

        custom.output = CustomOutput::Nodes {
            predicate: Filter::all(authorization.into_iter().chain(plan.guards)),
            projection: plan.projection,
            sort,
            offset: pagination.offset.map(|offset| self.param(offset)),
            limit: pagination.limit.map(|limit| self.param(limit)),
        };

        Ok((custom, Shape::Object(plan.shape)))
    }

    /// A custom field used in a filter or a sort: its arguments take their default values.
    pub(super) fn custom_operand(
        &self,
        definition: FieldDefinition<'_>,
        node: Variable,
    ) -> Result<CustomField, TranslationError> {
        if definition.ty.list || definition.scalar_type().is_none() {
            return Err(TranslationError::invalid_value(
                definition.name(),
                "only custom fields returning a single scalar filter or sort",
            ));
        }

        self.custom_statement(definition, None, Some(node))
    }

    fn custom_statement(
        &self,
        definition: FieldDefinition<'_>,
        field: Option<&BoundField>,
        parent: Option<Variable>,
    ) -> Result<CustomField, TranslationError> {
        let statement = definition
            .custom_statement()
            .ok_or_else(|| TranslationError::unknown_field(definition.parent().name(), definition.name()))?;

        let mut substitutions = Vec::new();

        for argument in definition.arguments() {
            let scalar = argument.ty.name.parse::<ScalarType>().ok();
            let provided = field
                .and_then(|field| field.argument(argument.name()))
                .filter(|value| !value.is_null());

            let value = match (provided, &argument.default) {
                (Some(value), _) => value.to_param(scalar),
                (None, Some(default)) => InputValue::from(default.clone()).to_param(scalar),
                (None, None) => Value::Null,
            };

            substitutions.push((argument.name().to_string(), self.param(value)));
        }

        let text = statement.statement();

        if text.contains("$context") {
            let context = serde_json::Value::Object(self.ctx.values.clone());
            substitutions.push(("context".to_string(), self.param(context)));
        }

        if text.contains("$jwt") {
            self.mark_auth();
        }

        let returns_nodes = definition
            .target_type()
            .is_some_and(|target| target.is_node() || target.is_abstract());

        let value = match parent {
            None => Variable::root(),
            Some(_) if returns_nodes => self.names.node(),
            Some(_) => self.names.plain(),
        };

        Ok(CustomField {
            statement: text.to_string(),
            column: statement.column_name().to_string(),
            parent,
            substitutions,
            value,
            result: self.names.plain(),
            list: definition.ty.list,
            output: CustomOutput::Scalar(PropertyFormat::Plain),
        })
    }
}
