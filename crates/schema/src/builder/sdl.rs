use cynic_parser::{common::WrappingType, type_system as ast, ConstValue};

use crate::FieldType;

pub(super) type Arguments = serde_json::Map<String, serde_json::Value>;

pub(super) fn const_value_to_json(value: ConstValue<'_>) -> serde_json::Value {
    match value {
        ConstValue::Null(_) => serde_json::Value::Null,
        ConstValue::Int(n) => serde_json::Value::from(n.as_i64()),
        ConstValue::Float(n) => serde_json::Number::from_f64(n.as_f64())
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ConstValue::String(s) => serde_json::Value::String(s.as_str().to_string()),
        ConstValue::Boolean(b) => serde_json::Value::Bool(b.value()),
        ConstValue::Enum(e) => serde_json::Value::String(e.name().to_string()),
        ConstValue::List(list) => serde_json::Value::Array(list.items().map(const_value_to_json).collect()),
        ConstValue::Object(object) => serde_json::Value::Object(
            object
                .fields()
                .map(|field| (field.name().to_string(), const_value_to_json(field.value())))
                .collect(),
        ),
    }
}

pub(super) fn directive_arguments(directive: ast::Directive<'_>) -> Arguments {
    directive
        .arguments()
        .map(|argument| (argument.name().to_string(), const_value_to_json(argument.value())))
        .collect()
}

pub(super) fn find_directive<'a>(
    directives: impl IntoIterator<Item = ast::Directive<'a>>,
    name: &str,
) -> Option<ast::Directive<'a>> {
    directives.into_iter().find(|directive| directive.name() == name)
}

/// Converts a wrapped type, outermost wrapper first. Nested lists are rejected.
pub(super) fn field_type(ty: ast::Type<'_>) -> Result<FieldType, String> {
    let wrappers: Vec<WrappingType> = ty.wrappers().collect();
    let mut wrappers = wrappers.into_iter().peekable();

    let mut field_type = FieldType {
        name: ty.name().to_string(),
        list: false,
        non_null: false,
        non_null_items: false,
    };

    if wrappers.next_if_eq(&WrappingType::NonNull).is_some() {
        field_type.non_null = true;
    }

    if wrappers.next_if_eq(&WrappingType::List).is_some() {
        field_type.list = true;

        if wrappers.next_if_eq(&WrappingType::NonNull).is_some() {
            field_type.non_null_items = true;
        }
    }

    if wrappers.next().is_some() {
        return Err(format!("nested lists are not supported, found `{field_type}` wrapped further"));
    }

    Ok(field_type)
}

pub(super) fn string_list(value: &serde_json::Value) -> Option<Vec<String>> {
    match value {
        serde_json::Value::String(s) => Some(vec![s.clone()]),
        serde_json::Value::Array(items) => items.iter().map(|item| item.as_str().map(str::to_string)).collect(),
        _ => None,
    }
}
