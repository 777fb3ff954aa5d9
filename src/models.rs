//! Data structures for the TV guide store
//!
//! Shapes of the data fetched from the guide endpoints:
//! - **Catalog**: ordered categories, each with an ordered channel list
//! - **Channel**: an identifier plus arbitrary descriptive fields
//! - **Epg**: program guide blob, kept opaque
//!
//! Field names follow the lowercase layout (`categories`, `name`,
//! `channels`, `id`). The capitalised upstream layout (`Categories`, `Name`,
//! `Channels`, `Vid`) is accepted on input as well.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// =============================================================================
// Channel
// =============================================================================

/// A single channel in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Catalog-wide unique identifier, empty when the endpoint sent none
    #[serde(
        default,
        alias = "Vid",
        deserialize_with = "string_or_number",
        skip_serializing_if = "String::is_empty"
    )]
    pub id: String,

    /// Owning category name, filled in by the derived views
    #[serde(
        default,
        alias = "Category",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,

    /// Every other field of the channel, kept verbatim
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Channel {
    /// Create a channel with no descriptive fields
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: None,
            fields: Map::new(),
        }
    }

    /// Builder-style helper to attach a descriptive field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a string field, checking both `key` and its capitalised form
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .or_else(|| self.fields.get(&capitalize(key)))
            .and_then(Value::as_str)
    }

    /// Whether the channel can be looked up by id
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// Display name of the channel, falling back to its id
    pub fn display_name(&self) -> &str {
        self.field_str("name").unwrap_or(&self.id)
    }

    /// Copy of this channel annotated with its owning category
    pub fn annotated(&self, category: &str) -> Self {
        let mut channel = self.clone();
        channel.category = Some(category.to_string());
        channel
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{} [{}] ({})", self.display_name(), self.id, category),
            None => write!(f, "{} [{}]", self.display_name(), self.id),
        }
    }
}

// =============================================================================
// Category / Catalog
// =============================================================================

/// A named group of channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(default, alias = "Channels")]
    pub channels: Vec<Channel>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Category {
    pub fn new(name: impl Into<String>, channels: Vec<Channel>) -> Self {
        Self {
            name: name.into(),
            channels,
            fields: Map::new(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} channels)", self.name, self.channels.len())
    }
}

/// The full channel listing, categories in source order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default, alias = "Categories")]
    pub categories: Vec<Category>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// =============================================================================
// EPG
// =============================================================================

/// Program guide data, stored exactly as the endpoint returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epg(pub Value);

impl Default for Epg {
    fn default() -> Self {
        Epg(Value::Object(Map::new()))
    }
}

impl Epg {
    /// Guide entry stored under a channel id, when the blob is keyed that way
    pub fn for_channel(&self, channel_id: &str) -> Option<&Value> {
        self.0.as_object().and_then(|map| map.get(channel_id))
    }

    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Accept channel ids sent either as JSON strings or numbers; null reads as no id
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for channel id, got {}",
            other
        ))),
    }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_lowercase_catalog() {
        let catalog: Catalog = serde_json::from_value(json!({
            "categories": [
                {"name": "News", "channels": [{"id": "1", "name": "A"}]}
            ]
        }))
        .unwrap();

        assert_eq!(catalog.categories.len(), 1);
        assert_eq!(catalog.categories[0].name, "News");
        let channel = &catalog.categories[0].channels[0];
        assert_eq!(channel.id, "1");
        assert_eq!(channel.category, None);
        assert_eq!(channel.fields.get("name"), Some(&json!("A")));
    }

    #[test]
    fn test_parse_capitalised_catalog() {
        let catalog: Catalog = serde_json::from_value(json!({
            "Categories": [
                {"Name": "Sports", "Channels": [{"Vid": 42, "Name": "ESPN"}]}
            ]
        }))
        .unwrap();

        let channel = &catalog.categories[0].channels[0];
        assert_eq!(catalog.categories[0].name, "Sports");
        assert_eq!(channel.id, "42");
        assert_eq!(channel.display_name(), "ESPN");
    }

    #[test]
    fn test_channel_without_id_still_parses() {
        let catalog: Catalog = serde_json::from_value(json!({
            "categories": [
                {"name": "News", "channels": [{"id": "1"}, {"name": "no id"}]}
            ]
        }))
        .unwrap();

        let channels = &catalog.categories[0].channels;
        assert_eq!(channels.len(), 2);
        assert!(channels[0].has_id());
        assert!(!channels[1].has_id());
        assert_eq!(
            serde_json::to_value(&channels[1]).unwrap(),
            json!({"name": "no id"})
        );
    }

    #[test]
    fn test_channel_id_rejects_objects() {
        let result: Result<Channel, _> = serde_json::from_value(json!({"id": {"x": 1}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_channel_serializes_flat() {
        let channel = Channel::new("2").with_field("name", "B").annotated("Sports");
        let value = serde_json::to_value(&channel).unwrap();
        assert_eq!(value, json!({"id": "2", "name": "B", "category": "Sports"}));
    }

    #[test]
    fn test_channel_without_category_omits_field() {
        let value = serde_json::to_value(Channel::new("7")).unwrap();
        assert_eq!(value, json!({"id": "7"}));
    }

    #[test]
    fn test_missing_categories_defaults_to_empty() {
        let catalog: Catalog = serde_json::from_str("{}").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_epg_default_is_empty_object() {
        let epg = Epg::default();
        assert!(epg.is_empty());
        assert_eq!(serde_json::to_string(&epg).unwrap(), "{}");
    }

    #[test]
    fn test_epg_for_channel() {
        let epg = Epg(json!({"1": [{"title": "Morning News"}]}));
        assert_eq!(epg.for_channel("1"), Some(&json!([{"title": "Morning News"}])));
        assert_eq!(epg.for_channel("2"), None);

        let list = Epg(json!([1, 2, 3]));
        assert_eq!(list.for_channel("1"), None);
    }

    #[test]
    fn test_display() {
        let channel = Channel::new("9").with_field("name", "Nine");
        assert_eq!(channel.to_string(), "Nine [9]");
        assert_eq!(channel.annotated("News").to_string(), "Nine [9] (News)");
        assert_eq!(
            Category::new("News", vec![channel]).to_string(),
            "News (1 channels)"
        );
    }
}
