use std::{collections::HashMap, sync::Arc};

use graphql_cypher_auth::Claims;
use graphql_cypher_config::TranslationConfig;
use serde_json::{Map, Value};

/// Computes the value of a `@populatedBy` field from the input of the node being written.
pub type Callback = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Per-request inputs of a translation.
#[derive(Clone, Default)]
pub struct TranslationContext {
    pub claims: Option<Claims>,
    /// Read by `$context.<path>` placeholders of labels and authorization rules.
    pub values: Map<String, Value>,
    callbacks: HashMap<String, Callback>,
    pub(crate) limits: TranslationConfig,
}

impl TranslationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claims(mut self, claims: Option<Claims>) -> Self {
        self.claims = claims;
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn with_callback(mut self, name: impl Into<String>, callback: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.callbacks.insert(name.into(), Arc::new(callback));
        self
    }

    /// Fallback limits of the types without `@limit`.
    pub fn with_limits(mut self, limits: TranslationConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }

    pub(crate) fn claim(&self, path: &str) -> Option<&Value> {
        self.claims.as_ref()?.get(path)
    }

    pub(crate) fn context_value(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(path) {
            return Some(value);
        }

        let mut segments = path.split('.');
        let first = self.values.get(segments.next()?)?;

        segments.try_fold(first, |value, segment| value.as_object()?.get(segment))
    }

    pub(crate) fn callback(&self, name: &str) -> Option<&Callback> {
        self.callbacks.get(name)
    }
}

impl std::fmt::Debug for TranslationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationContext")
            .field("authenticated", &self.is_authenticated())
            .field("values", &self.values)
            .field("callbacks", &self.callbacks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
