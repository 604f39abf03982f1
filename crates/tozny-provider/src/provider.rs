//! Resource and data source registry.
//!
//! Handlers implement the typed [`Resource`] / [`DataSource`] traits. The
//! registry stores them behind object-safe wrappers that take and return JSON
//! attribute documents, decoding them through the handler's schema first.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tozny_core::{CoreError, ID_ATTRIBUTE, Schema};

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::session::Session;
use crate::{data_sources, resources};

/// A managed remote object with a create/read/delete lifecycle.
///
/// Implementations receive values already validated and decoded into
/// [`Resource::Model`]. Models carry the state `id` alongside their attributes.
#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    const TYPE_NAME: &'static str;

    /// Whether [`Resource::update`] can apply changes in place.
    const UPDATABLE: bool = false;

    fn schema() -> Schema;

    async fn create(&self, session: &Session, planned: Self::Model) -> Result<Self::Model>;

    /// Refresh state from the server. `None` means the object is gone.
    async fn read(&self, session: &Session, state: Self::Model) -> Result<Option<Self::Model>>;

    async fn update(
        &self,
        _session: &Session,
        _prior: Self::Model,
        _planned: Self::Model,
    ) -> Result<Self::Model> {
        Err(ProviderError::requires_replacement(Self::TYPE_NAME, Vec::new()))
    }

    async fn delete(&self, session: &Session, state: Self::Model) -> Result<()>;
}

/// A read-only lookup.
#[async_trait]
pub trait DataSource: Send + Sync + 'static {
    type Model: Serialize + DeserializeOwned + Send + Sync;

    const TYPE_NAME: &'static str;

    fn schema() -> Schema;

    async fn read(&self, session: &Session, config: Self::Model) -> Result<Self::Model>;
}

/// Object-safe view of a [`Resource`] working on JSON documents.
#[async_trait]
pub trait DynResource: Send + Sync {
    async fn create_document(&self, session: &Session, config: &Value) -> Result<Value>;
    async fn read_document(&self, session: &Session, state: &Value) -> Result<Option<Value>>;
    async fn update_document(
        &self,
        session: &Session,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value>;
    async fn delete_document(&self, session: &Session, state: &Value) -> Result<()>;
}

#[async_trait]
pub trait DynDataSource: Send + Sync {
    async fn read_document(&self, session: &Session, config: &Value) -> Result<Value>;
}

#[async_trait]
impl<R: Resource> DynResource for R {
    async fn create_document(&self, session: &Session, config: &Value) -> Result<Value> {
        let planned: R::Model = R::schema().decode(config)?;
        let created = self.create(session, planned).await?;
        let document = encode(&created)?;
        tracing::info!(resource = R::TYPE_NAME, id = %state_id(&document), "created");
        Ok(document)
    }

    async fn read_document(&self, session: &Session, state: &Value) -> Result<Option<Value>> {
        let current: R::Model = R::schema().decode(state)?;
        match self.read(session, current).await {
            Ok(Some(refreshed)) => Ok(Some(encode(&refreshed)?)),
            Ok(None) => {
                tracing::warn!(resource = R::TYPE_NAME, id = %state_id(state), "object no longer exists");
                Ok(None)
            }
            Err(err) if err.is_not_found() => {
                tracing::warn!(resource = R::TYPE_NAME, id = %state_id(state), error = %err, "object no longer exists");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    async fn update_document(
        &self,
        session: &Session,
        prior: &Value,
        planned: &Value,
    ) -> Result<Value> {
        let schema = R::schema();
        let triggers = schema.replacement_triggers(prior, planned);
        if !triggers.is_empty() {
            return Err(ProviderError::requires_replacement(R::TYPE_NAME, triggers));
        }

        let merged = merge_documents(&schema, prior, planned)?;
        if !R::UPDATABLE {
            let unchanged: R::Model = schema.decode(&merged)?;
            return encode(&unchanged);
        }

        let prior_model: R::Model = schema.decode(prior)?;
        let planned_model: R::Model = schema.decode(&merged)?;
        let updated = self.update(session, prior_model, planned_model).await?;
        let document = encode(&updated)?;
        tracing::info!(resource = R::TYPE_NAME, id = %state_id(&document), "updated");
        Ok(document)
    }

    async fn delete_document(&self, session: &Session, state: &Value) -> Result<()> {
        let current: R::Model = R::schema().decode(state)?;
        self.delete(session, current).await?;
        tracing::info!(resource = R::TYPE_NAME, id = %state_id(state), "deleted");
        Ok(())
    }
}

#[async_trait]
impl<D: DataSource> DynDataSource for D {
    async fn read_document(&self, session: &Session, config: &Value) -> Result<Value> {
        let lookup: D::Model = D::schema().decode(config)?;
        let found = self.read(session, lookup).await?;
        encode(&found)
    }
}

fn encode<T: Serialize>(model: &T) -> Result<Value> {
    Ok(serde_json::to_value(model).map_err(CoreError::from)?)
}

fn state_id(document: &Value) -> &str {
    document
        .get(ID_ATTRIBUTE)
        .and_then(Value::as_str)
        .unwrap_or("-")
}

/// Planned values with defaults applied, plus the prior ID and computed
/// attributes the plan leaves unset.
fn merge_documents(schema: &Schema, prior: &Value, planned: &Value) -> Result<Value> {
    let not_object = |what: &str| ProviderError::from(CoreError::NotAnObject(what.into()));
    let prior = prior.as_object().ok_or_else(|| not_object("prior state"))?;
    let mut merged: Map<String, Value> = planned
        .as_object()
        .ok_or_else(|| not_object("planned state"))?
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    schema.apply_defaults(&mut merged);

    for (key, value) in prior {
        let carried = key == ID_ATTRIBUTE
            || schema
                .attribute(key)
                .is_some_and(|attribute| attribute.computed);
        if carried && !merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

struct Registered<T: ?Sized> {
    schema: Schema,
    handler: Box<T>,
}

/// Every schema the provider exposes.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: IndexMap<String, Schema>,
    pub data_sources: IndexMap<String, Schema>,
}

/// Registered handlers plus the configured session they run against.
pub struct Provider {
    session: Session,
    resources: IndexMap<&'static str, Registered<dyn DynResource>>,
    data_sources: IndexMap<&'static str, Registered<dyn DynDataSource>>,
}

impl Provider {
    /// Provider with every built-in resource and data source registered.
    pub fn new(session: Session) -> Self {
        let mut provider = Self::empty(session);
        resources::register(&mut provider);
        data_sources::register(&mut provider);
        provider
    }

    /// Resolve credentials from `config` and build a provider.
    pub async fn configure(config: ProviderConfig) -> Result<Self> {
        Ok(Self::new(Session::configure(config).await?))
    }

    fn empty(session: Session) -> Self {
        Self {
            session,
            resources: IndexMap::new(),
            data_sources: IndexMap::new(),
        }
    }

    pub fn register_resource<R: Resource>(&mut self, resource: R) {
        self.resources.insert(
            R::TYPE_NAME,
            Registered {
                schema: R::schema(),
                handler: Box::new(resource),
            },
        );
    }

    pub fn register_data_source<D: DataSource>(&mut self, data_source: D) {
        self.data_sources.insert(
            D::TYPE_NAME,
            Registered {
                schema: D::schema(),
                handler: Box::new(data_source),
            },
        );
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn data_source_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.data_sources.keys().copied()
    }

    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: ProviderConfig::schema(),
            resources: self
                .resources
                .iter()
                .map(|(name, entry)| (name.to_string(), entry.schema.clone()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, entry)| (name.to_string(), entry.schema.clone()))
                .collect(),
        }
    }

    pub fn resource_schema(&self, type_name: &str) -> Result<&Schema> {
        Ok(&self.resource(type_name)?.schema)
    }

    pub fn data_source_schema(&self, type_name: &str) -> Result<&Schema> {
        Ok(&self.data_source(type_name)?.schema)
    }

    fn resource(&self, type_name: &str) -> Result<&Registered<dyn DynResource>> {
        self.resources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }

    fn data_source(&self, type_name: &str) -> Result<&Registered<dyn DynDataSource>> {
        self.data_sources
            .get(type_name)
            .ok_or_else(|| ProviderError::UnknownDataSource(type_name.to_string()))
    }

    pub async fn create(&self, type_name: &str, config: &Value) -> Result<Value> {
        self.resource(type_name)?
            .handler
            .create_document(&self.session, config)
            .await
    }

    pub async fn read(&self, type_name: &str, state: &Value) -> Result<Option<Value>> {
        self.resource(type_name)?
            .handler
            .read_document(&self.session, state)
            .await
    }

    pub async fn update(&self, type_name: &str, prior: &Value, planned: &Value) -> Result<Value> {
        self.resource(type_name)?
            .handler
            .update_document(&self.session, prior, planned)
            .await
    }

    pub async fn delete(&self, type_name: &str, state: &Value) -> Result<()> {
        self.resource(type_name)?
            .handler
            .delete_document(&self.session, state)
            .await
    }

    pub async fn read_data_source(&self, type_name: &str, config: &Value) -> Result<Value> {
        self.data_source(type_name)?
            .handler
            .read_document(&self.session, config)
            .await
    }
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("session", &self.session)
            .field("resources", &self.resources.keys().collect::<Vec<_>>())
            .field("data_sources", &self.data_sources.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;
    use tozny_core::Attribute;

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct NoteModel {
        #[serde(default)]
        id: String,
        title: String,
        #[serde(default)]
        body: String,
        #[serde(default)]
        revision: i64,
    }

    struct Note;

    #[async_trait]
    impl Resource for Note {
        type Model = NoteModel;
        const TYPE_NAME: &'static str = "test_note";

        fn schema() -> Schema {
            Schema::new("note")
                .with_attribute("title", Attribute::required_string("title").force_new())
                .with_attribute("body", Attribute::optional_string("body").with_default(""))
                .with_attribute(
                    "revision",
                    Attribute::computed(tozny_core::AttributeType::Int, "revision"),
                )
        }

        async fn create(&self, _session: &Session, mut planned: NoteModel) -> Result<NoteModel> {
            planned.id = format!("note-{}", planned.title);
            planned.revision = 1;
            Ok(planned)
        }

        async fn read(&self, _session: &Session, state: NoteModel) -> Result<Option<NoteModel>> {
            if state.title == "gone" {
                return Err(tozny_client::ClientError::NotFound("note".into()).into());
            }
            Ok(Some(state))
        }

        async fn delete(&self, _session: &Session, _state: NoteModel) -> Result<()> {
            Ok(())
        }
    }

    fn provider() -> Provider {
        let mut provider = Provider::empty(Session::unconfigured(
            ProviderConfig::default(),
            "not needed",
        ));
        provider.register_resource(Note);
        provider
    }

    #[tokio::test]
    async fn test_create_decodes_and_encodes() {
        let state = provider()
            .create("test_note", &json!({"title": "hello"}))
            .await
            .unwrap();
        assert_eq!(state["id"], "note-hello");
        assert_eq!(state["body"], "");
        assert_eq!(state["revision"], 1);
    }

    #[tokio::test]
    async fn test_unknown_type() {
        let err = provider()
            .create("test_missing", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResourceType(name) if name == "test_missing"));
    }

    #[tokio::test]
    async fn test_read_not_found_clears_state() {
        let refreshed = provider()
            .read("test_note", &json!({"id": "note-gone", "title": "gone"}))
            .await
            .unwrap();
        assert!(refreshed.is_none());
    }

    #[tokio::test]
    async fn test_update_force_new_requires_replacement() {
        let err = provider()
            .update(
                "test_note",
                &json!({"id": "note-a", "title": "a", "revision": 1}),
                &json!({"title": "b"}),
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, ProviderError::RequiresReplacement { attributes, .. } if attributes == vec!["title"])
        );
    }

    #[tokio::test]
    async fn test_update_without_handler_keeps_prior_computed_values() {
        let state = provider()
            .update(
                "test_note",
                &json!({"id": "note-a", "title": "a", "body": "", "revision": 3}),
                &json!({"title": "a", "body": "edited"}),
            )
            .await
            .unwrap();
        assert_eq!(state["id"], "note-a");
        assert_eq!(state["body"], "edited");
        assert_eq!(state["revision"], 3);
    }

    #[tokio::test]
    async fn test_schema_is_rejected_before_handler() {
        let err = provider()
            .create("test_note", &json!({"body": "no title"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Schema(CoreError::MissingAttribute(_))));
    }

    #[test]
    fn test_delete_dispatches_to_handler() {
        tokio_test::block_on(async {
            provider()
                .delete("test_note", &json!({"id": "note-a", "title": "a"}))
                .await
                .unwrap();
            let err = provider()
                .delete("test_note", &json!({"id": "note-a"}))
                .await
                .unwrap_err();
            assert!(matches!(err, ProviderError::Schema(_)));
        });
    }

    #[test]
    fn test_builtin_registry() {
        let provider = Provider::new(Session::unconfigured(ProviderConfig::default(), "unused"));
        let types: Vec<_> = provider.resource_types().collect();
        assert!(types.contains(&"tozny_realm_group_role_mappings"));
        assert!(types.contains(&"tozny_account"));
        assert_eq!(types.len(), 18);
        assert_eq!(provider.data_source_types().count(), 4);
    }
}
