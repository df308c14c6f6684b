use std::collections::HashMap;

use cynic_parser::{common::WrappingType, executable::OperationDefinition, Value};
use indexmap::IndexMap;

use crate::{InputValue, TranslationError};

/// Values of the variables defined by the operation. `None` for a nullable variable that was
/// neither provided nor defaulted: arguments referencing it are treated as absent.
#[derive(Default)]
pub(super) struct Variables(HashMap<String, Option<InputValue>>);

impl Variables {
    pub fn coerce(
        operation: OperationDefinition<'_>,
        provided: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, TranslationError> {
        let mut variables = HashMap::new();

        for definition in operation.variable_definitions() {
            let name = definition.name();

            let value = match provided.get(name) {
                Some(value) => Some(InputValue::from(value.clone())),
                None => definition
                    .default_value()
                    .map(|value| Variables::default().resolve(value.into()))
                    .transpose()?
                    .flatten(),
            };

            let non_null = definition.ty().wrappers().next() == Some(WrappingType::NonNull);

            if non_null && value.as_ref().map_or(true, InputValue::is_null) {
                return Err(TranslationError::MissingVariable {
                    name: name.to_string(),
                    ty: definition.ty().to_string(),
                });
            }

            variables.insert(name.to_string(), value);
        }

        Ok(Variables(variables))
    }

    /// Substitutes variables in an argument value. Absent variables are dropped from objects
    /// and become `null` inside lists.
    pub fn resolve(&self, value: Value<'_>) -> Result<Option<InputValue>, TranslationError> {
        let resolved = match value {
            Value::Variable(variable) => {
                return self
                    .0
                    .get(variable.name())
                    .cloned()
                    .ok_or_else(|| TranslationError::UndefinedVariable(variable.name().to_string()));
            }
            Value::Null(_) => InputValue::Null,
            Value::Int(n) => InputValue::Int(n.as_i64()),
            Value::Float(n) => InputValue::Float(n.as_f64()),
            Value::String(s) => InputValue::String(s.as_str().to_string()),
            Value::Boolean(b) => InputValue::Boolean(b.value()),
            Value::Enum(e) => InputValue::Enum(e.name().to_string()),
            Value::List(list) => {
                let mut items = Vec::new();
                for item in list.items() {
                    items.push(self.resolve(item)?.unwrap_or(InputValue::Null));
                }
                InputValue::List(items)
            }
            Value::Object(object) => {
                let mut fields = IndexMap::new();
                for field in object.fields() {
                    if let Some(value) = self.resolve(field.value())? {
                        fields.insert(field.name().to_string(), value);
                    }
                }
                InputValue::Object(fields)
            }
        };

        Ok(Some(resolved))
    }
}
