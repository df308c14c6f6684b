use std::sync::Arc;

use graphql_cypher_schema::{Schema, SchemaErrors};
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::{CompiledOperation, TranslationContext, TranslationError};

/// The active schema. A reload builds the new schema completely before publishing it, a failed
/// build leaves the active one in place. Translations in flight keep the schema they started
/// with.
#[derive(Clone)]
pub struct SchemaHandle {
    sender: Arc<watch::Sender<Arc<Schema>>>,
}

impl SchemaHandle {
    pub fn new(schema: Schema) -> Self {
        let (sender, _) = watch::channel(Arc::new(schema));

        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn build(sdl: &str) -> Result<Self, SchemaErrors> {
        Schema::build(sdl).map(Self::new)
    }

    pub fn current(&self) -> Arc<Schema> {
        self.sender.borrow().clone()
    }

    /// Notified on every successful reload.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Schema>> {
        self.sender.subscribe()
    }

    pub fn reload(&self, sdl: &str) -> Result<(), SchemaErrors> {
        let schema = match Schema::build(sdl) {
            Ok(schema) => schema,
            Err(errors) => {
                tracing::warn!(errors = errors.len(), "schema reload failed, keeping the active schema");
                return Err(errors);
            }
        };

        self.sender.send_replace(Arc::new(schema));
        tracing::debug!("schema reloaded");

        Ok(())
    }

    /// Translates against the schema active when called.
    pub fn translate(
        &self,
        query: &str,
        operation_name: Option<&str>,
        variables: &Map<String, Value>,
        ctx: &TranslationContext,
    ) -> Result<CompiledOperation, TranslationError> {
        let schema = self.current();
        crate::translate(&schema, query, operation_name, variables, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIES: &str = "type Movie { title: String }";
    const SHOWS: &str = "type Show { title: String }";

    #[tokio::test]
    async fn reload_publishes_the_new_schema() {
        let handle = SchemaHandle::build(MOVIES).unwrap();
        let mut receiver = handle.subscribe();

        assert!(handle.current().query_field("movies").is_some());

        handle.reload(SHOWS).unwrap();
        receiver.changed().await.unwrap();

        let schema = receiver.borrow_and_update().clone();
        assert!(schema.query_field("shows").is_some());
        assert!(schema.query_field("movies").is_none());
        assert!(handle.current().query_field("shows").is_some());
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_active_schema() {
        let handle = SchemaHandle::build(MOVIES).unwrap();
        let receiver = handle.subscribe();

        let errors = handle.reload("type Movie { actors: [Actor!]! }").unwrap_err();
        assert!(!errors.is_empty());

        assert!(!receiver.has_changed().unwrap());
        assert!(handle.current().query_field("movies").is_some());
    }

    #[tokio::test]
    async fn in_flight_translations_keep_their_schema() {
        let handle = SchemaHandle::build(MOVIES).unwrap();
        let before = handle.current();

        handle.reload(SHOWS).unwrap();

        assert!(before.query_field("movies").is_some());
        assert!(handle
            .translate("{ movies { title } }", None, &Map::new(), &TranslationContext::new())
            .is_err());
        assert!(handle
            .translate("{ shows { title } }", None, &Map::new(), &TranslationContext::new())
            .is_ok());
    }
}
