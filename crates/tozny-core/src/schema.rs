//! Attribute schemas and the typed decoding layer.
//!
//! A [`Schema`] lists the attributes a resource, data source or the provider
//! itself accepts. Documents arrive as untyped JSON objects; [`Schema::decode`]
//! applies defaults, validates presence, types and conflicts, then hands the
//! document to serde so each handler works with its own typed model.

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// Attribute name every state document may carry.
pub const ID_ATTRIBUTE: &str = "id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Bool,
    Int,
    StringList,
    /// A list of nested objects described by [`Attribute::block`].
    Block,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<Box<Schema>>,
}

impl Attribute {
    fn new(kind: AttributeType, description: &str) -> Self {
        Self {
            kind,
            description: description.to_string(),
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            conflicts_with: Vec::new(),
            max_items: None,
            block: None,
        }
    }

    pub fn required(kind: AttributeType, description: &str) -> Self {
        Self {
            required: true,
            ..Self::new(kind, description)
        }
    }

    pub fn optional(kind: AttributeType, description: &str) -> Self {
        Self {
            optional: true,
            ..Self::new(kind, description)
        }
    }

    pub fn computed(kind: AttributeType, description: &str) -> Self {
        Self {
            computed: true,
            ..Self::new(kind, description)
        }
    }

    pub fn required_string(description: &str) -> Self {
        Self::required(AttributeType::String, description)
    }

    pub fn optional_string(description: &str) -> Self {
        Self::optional(AttributeType::String, description)
    }

    pub fn computed_string(description: &str) -> Self {
        Self::computed(AttributeType::String, description)
    }

    pub fn optional_bool(description: &str) -> Self {
        Self::optional(AttributeType::Bool, description)
    }

    pub fn required_block(description: &str, block: Schema) -> Self {
        Self {
            block: Some(Box::new(block)),
            ..Self::required(AttributeType::Block, description)
        }
    }

    pub fn optional_block(description: &str, block: Schema) -> Self {
        Self {
            block: Some(Box::new(block)),
            ..Self::optional(AttributeType::Block, description)
        }
    }

    pub fn computed_block(description: &str, block: Schema) -> Self {
        Self {
            block: Some(Box::new(block)),
            ..Self::computed(AttributeType::Block, description)
        }
    }

    /// Optional attribute that the server fills in when left unset.
    pub fn and_computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn conflicts_with(mut self, other: &str) -> Self {
        self.conflicts_with.push(other.to_string());
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    fn check_type(&self, path: &str, value: &Value) -> Result<()> {
        let ok = match self.kind {
            AttributeType::String => value.is_string(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::Int => value.is_i64() || value.is_u64(),
            AttributeType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            AttributeType::Block => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        };
        if ok {
            Ok(())
        } else {
            Err(CoreError::invalid(
                path,
                format!("expected {}", type_label(self.kind)),
            ))
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn type_label(kind: AttributeType) -> &'static str {
    match kind {
        AttributeType::String => "a string",
        AttributeType::Bool => "a boolean",
        AttributeType::Int => "an integer",
        AttributeType::StringList => "a list of strings",
        AttributeType::Block => "a list of objects",
    }
}

/// True when an attribute carries a value worth treating as configured.
/// Empty strings, empty lists and `false` count as unset.
fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    pub description: String,
    pub attributes: IndexMap<String, Attribute>,
}

impl Schema {
    pub fn new(description: &str) -> Self {
        Self {
            description: description.to_string(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Fill in defaults for attributes that are absent or null, recursing into blocks.
    pub fn apply_defaults(&self, object: &mut Map<String, Value>) {
        for (name, attribute) in &self.attributes {
            let missing = matches!(object.get(name), None | Some(Value::Null));
            if missing {
                if let Some(default) = &attribute.default {
                    object.insert(name.clone(), default.clone());
                }
                continue;
            }
            if let (Some(block), Some(Value::Array(items))) =
                (&attribute.block, object.get_mut(name))
            {
                for item in items.iter_mut() {
                    if let Value::Object(nested) = item {
                        block.apply_defaults(nested);
                    }
                }
            }
        }
    }

    /// Validate a document against this schema without decoding it.
    pub fn validate(&self, document: &Value) -> Result<()> {
        let object = document
            .as_object()
            .ok_or_else(|| CoreError::NotAnObject("document".into()))?;
        self.validate_object("", object, true)
    }

    fn validate_object(&self, prefix: &str, object: &Map<String, Value>, root: bool) -> Result<()> {
        let path = |name: &String| join_path(prefix, name);

        for key in object.keys() {
            if root && key == ID_ATTRIBUTE {
                continue;
            }
            if !self.attributes.contains_key(key) {
                return Err(CoreError::UnknownAttribute(path(key)));
            }
        }

        for (name, attribute) in &self.attributes {
            let value = object.get(name);
            match value {
                None | Some(Value::Null) => {
                    if attribute.required {
                        return Err(CoreError::missing(path(name)));
                    }
                    continue;
                }
                Some(value) => attribute.check_type(&path(name), value)?,
            }

            if let Some(max) = attribute.max_items {
                let len = value.and_then(Value::as_array).map_or(0, Vec::len);
                if len > max {
                    return Err(CoreError::invalid(
                        path(name),
                        format!("at most {max} item(s) allowed, got {len}"),
                    ));
                }
            }

            if is_set(value) {
                for other in &attribute.conflicts_with {
                    if is_set(object.get(other)) {
                        return Err(CoreError::conflicting(path(name), path(other)));
                    }
                }
            }

            if let (Some(block), Some(Value::Array(items))) = (&attribute.block, value) {
                for (index, item) in items.iter().enumerate() {
                    let nested = item
                        .as_object()
                        .ok_or_else(|| CoreError::NotAnObject(path(name)))?;
                    block.validate_object(&format!("{}.{index}", path(name)), nested, false)?;
                }
            }
        }
        Ok(())
    }

    /// Apply defaults, validate, then decode into the handler's typed model.
    pub fn decode<T: DeserializeOwned>(&self, document: &Value) -> Result<T> {
        let mut object = document
            .as_object()
            .cloned()
            .ok_or_else(|| CoreError::NotAnObject("document".into()))?;
        self.apply_defaults(&mut object);
        self.validate_object("", &object, true)?;
        Ok(serde_json::from_value(Value::Object(object))?)
    }

    /// Names of force-new attributes whose value differs between two documents.
    ///
    /// Defaults are applied to both documents first. Computed values are not
    /// compared, and an optional computed attribute left out of `planned`
    /// keeps its prior value.
    pub fn replacement_triggers(&self, prior: &Value, planned: &Value) -> Vec<String> {
        let mut prior = prior.as_object().cloned().unwrap_or_default();
        let mut planned = planned.as_object().cloned().unwrap_or_default();
        self.apply_defaults(&mut prior);
        self.apply_defaults(&mut planned);

        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.force_new)
            .filter(|(name, attribute)| {
                attribute.changed(prior.get(name.as_str()), planned.get(name.as_str()))
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Attribute names marked sensitive, for redacting output.
    pub fn sensitive_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, attribute)| attribute.sensitive)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

impl Attribute {
    fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Whether a configured value differs between prior and planned documents.
    fn changed(&self, prior: Option<&Value>, planned: Option<&Value>) -> bool {
        if self.is_computed_only() {
            return false;
        }
        let (prior, planned) = (normalized(prior), normalized(planned));
        if planned.is_none() && self.computed {
            return false;
        }
        match (&self.block, prior, planned) {
            (Some(block), Some(Value::Array(before)), Some(Value::Array(after))) => {
                before.len() != after.len()
                    || before.iter().zip(after).any(|(before, after)| {
                        block.attributes.iter().any(|(name, attribute)| {
                            attribute.changed(before.get(name.as_str()), after.get(name.as_str()))
                        })
                    })
            }
            _ => prior != planned,
        }
    }
}

fn normalized(value: Option<&Value>) -> Option<&Value> {
    match value {
        Some(Value::Null) | None => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    fn group_schema() -> Schema {
        Schema::new("test group")
            .with_attribute(
                "client_credentials_filepath",
                Attribute::optional_string("file")
                    .with_default("")
                    .conflicts_with("client_credentials_config"),
            )
            .with_attribute(
                "client_credentials_config",
                Attribute::optional_string("inline")
                    .with_default("")
                    .sensitive()
                    .conflicts_with("client_credentials_filepath"),
            )
            .with_attribute(
                "realm_name",
                Attribute::required_string("realm").force_new(),
            )
            .with_attribute(
                "enabled",
                Attribute::optional_bool("enabled").with_default(true),
            )
            .with_attribute(
                "group",
                Attribute::optional_block(
                    "groups",
                    Schema::new("group")
                        .with_attribute("group_id", Attribute::required_string("id"))
                        .with_attribute(
                            "extend_to_children",
                            Attribute::optional_bool("children").with_default(false),
                        ),
                ),
            )
            .with_attribute("group_id", Attribute::computed_string("server id"))
    }

    #[derive(Debug, Deserialize)]
    struct Decoded {
        realm_name: String,
        enabled: bool,
        #[serde(default)]
        group: Vec<DecodedGroup>,
    }

    #[derive(Debug, Deserialize)]
    struct DecodedGroup {
        group_id: String,
        extend_to_children: bool,
    }

    #[test]
    fn test_decode_applies_defaults_recursively() {
        let decoded: Decoded = group_schema()
            .decode(&json!({
                "realm_name": "Acme",
                "group": [{"group_id": "g1"}]
            }))
            .unwrap();
        assert_eq!(decoded.realm_name, "Acme");
        assert!(decoded.enabled);
        assert_eq!(decoded.group.len(), 1);
        assert_eq!(decoded.group[0].group_id, "g1");
        assert!(!decoded.group[0].extend_to_children);
    }

    #[test]
    fn test_missing_required_attribute() {
        let err = group_schema().validate(&json!({"enabled": true})).unwrap_err();
        assert!(matches!(err, CoreError::MissingAttribute(name) if name == "realm_name"));
    }

    #[test]
    fn test_missing_nested_attribute_reports_path() {
        let err = group_schema()
            .validate(&json!({"realm_name": "a", "group": [{"extend_to_children": true}]}))
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingAttribute(name) if name == "group.0.group_id"));
    }

    #[test]
    fn test_conflicting_credentials() {
        let err = group_schema()
            .validate(&json!({
                "realm_name": "a",
                "client_credentials_filepath": "/tmp/creds.json",
                "client_credentials_config": "{}"
            }))
            .unwrap_err();
        assert!(matches!(err, CoreError::ConflictingAttributes { .. }));
    }

    #[test]
    fn test_empty_string_does_not_conflict() {
        group_schema()
            .validate(&json!({
                "realm_name": "a",
                "client_credentials_filepath": "/tmp/creds.json",
                "client_credentials_config": ""
            }))
            .unwrap();
    }

    #[test]
    fn test_false_flag_does_not_conflict() {
        let schema = Schema::new("account")
            .with_attribute(
                "autogenerate",
                Attribute::optional_bool("auto")
                    .with_default(false)
                    .conflicts_with("profile"),
            )
            .with_attribute("profile", Attribute::optional_string("profile"));
        schema
            .decode::<serde_json::Value>(&json!({"profile": "p"}))
            .unwrap();
        let err = schema
            .validate(&json!({"autogenerate": true, "profile": "p"}))
            .unwrap_err();
        assert!(matches!(err, CoreError::ConflictingAttributes { .. }));
    }

    #[test]
    fn test_type_mismatch() {
        let err = group_schema()
            .validate(&json!({"realm_name": 42}))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAttribute { name, .. } if name == "realm_name"));
    }

    #[test]
    fn test_unknown_attribute_rejected_but_id_allowed() {
        group_schema()
            .validate(&json!({"id": "x", "realm_name": "a"}))
            .unwrap();
        let err = group_schema()
            .validate(&json!({"realm_name": "a", "colour": "blue"}))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownAttribute(name) if name == "colour"));
    }

    #[test]
    fn test_max_items() {
        let schema = Schema::new("s").with_attribute(
            "profile",
            Attribute::optional_block("p", Schema::new("p")).max_items(1),
        );
        let err = schema
            .validate(&json!({"profile": [{}, {}]}))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_replacement_triggers_ignore_computed() {
        let schema = group_schema();
        let prior = json!({"realm_name": "a", "group_id": "g1", "enabled": true});
        let planned = json!({"realm_name": "b", "group_id": null, "enabled": false});
        assert_eq!(schema.replacement_triggers(&prior, &planned), vec!["realm_name"]);
    }

    #[test]
    fn test_unset_optional_computed_keeps_prior() {
        let schema = Schema::new("s").with_attribute(
            "primary_realm_name",
            Attribute::optional_string("primary").and_computed().force_new(),
        );
        let prior = json!({"primary_realm_name": "shadow"});
        assert!(schema.replacement_triggers(&prior, &json!({})).is_empty());
        assert_eq!(
            schema.replacement_triggers(&prior, &json!({"primary_realm_name": "other"})),
            vec!["primary_realm_name"]
        );
    }

    #[test]
    fn test_replacement_ignores_defaults_and_nested_computed() {
        let schema = Schema::new("s")
            .with_attribute(
                "path",
                Attribute::optional_string("path").with_default("").force_new(),
            )
            .with_attribute(
                "profile",
                Attribute::optional_block(
                    "profile",
                    Schema::new("p")
                        .with_attribute("email", Attribute::required_string("email").force_new())
                        .with_attribute("account_id", Attribute::computed_string("id")),
                )
                .force_new(),
            );
        let prior = json!({"path": "", "profile": [{"email": "a@x", "account_id": "acc-1"}]});
        assert!(
            schema
                .replacement_triggers(&prior, &json!({"profile": [{"email": "a@x"}]}))
                .is_empty()
        );
        assert_eq!(
            schema.replacement_triggers(&prior, &json!({"profile": [{"email": "b@x"}]})),
            vec!["profile"]
        );
        let prior_without_default = json!({"profile": [{"email": "a@x"}]});
        assert!(
            schema
                .replacement_triggers(&prior_without_default, &json!({"path": "", "profile": [{"email": "a@x"}]}))
                .is_empty()
        );
    }

    #[test]
    fn test_sensitive_attributes() {
        assert_eq!(
            group_schema().sensitive_attributes(),
            vec!["client_credentials_config"]
        );
    }
}
