use serde_json::{Map, Value};

/// Decoded claims of an authenticated caller.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Reads a claim by path. A key containing dots, such as a namespaced claim, is found
    /// before the path is split into nested keys: `realm_access.roles` reads
    /// `{"realm_access": {"roles": [...]}}`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = self.0.get(segments.next()?)?;

        segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn claims(value: Value) -> Claims {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn nested_paths() {
        let claims = claims(json!({
            "sub": "user-1",
            "realm_access": { "roles": ["admin"] },
            "https://example.com/tenant": "acme",
        }));

        assert_eq!(claims.get("sub"), Some(&json!("user-1")));
        assert_eq!(claims.get("realm_access.roles"), Some(&json!(["admin"])));
        assert_eq!(claims.get("https://example.com/tenant"), Some(&json!("acme")));
        assert_eq!(claims.get("realm_access.missing"), None);
        assert_eq!(claims.get("sub.inner"), None);
    }
}
