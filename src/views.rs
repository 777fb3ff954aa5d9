//! Derived views over the store state
//!
//! Pure functions of `&StoreState`, recomputed on every call. Channels
//! returned from here are fresh copies annotated with their category; the
//! catalog held by the state is never modified.

use std::collections::HashMap;

use crate::models::{Category, Channel};
use crate::store::StoreState;

/// First category in catalog order
pub fn default_category(state: &StoreState) -> Option<&Category> {
    state.channels.categories.first()
}

/// Category with exactly this name; the first one wins on duplicates
pub fn category_by_name<'a>(state: &'a StoreState, name: &str) -> Option<&'a Category> {
    state.channels.categories.iter().find(|c| c.name == name)
}

/// Channels of a category, annotated; empty if the category is unknown
pub fn channels_in_category(state: &StoreState, name: &str) -> Vec<Channel> {
    category_by_name(state, name)
        .map(|category| {
            category
                .channels
                .iter()
                .map(|ch| ch.annotated(&category.name))
                .collect()
        })
        .unwrap_or_default()
}

pub fn has_category(state: &StoreState, name: &str) -> bool {
    category_by_name(state, name).is_some()
}

/// Every channel keyed by id, annotated with its category
///
/// On duplicate ids the channel from the later category wins. Channels
/// without an id are left out.
pub fn channel_map(state: &StoreState) -> HashMap<String, Channel> {
    let mut map = HashMap::new();
    for category in &state.channels.categories {
        for channel in category.channels.iter().filter(|ch| ch.has_id()) {
            map.insert(channel.id.clone(), channel.annotated(&category.name));
        }
    }
    map
}

/// Channel with this id, resolved the same way as `channel_map`
pub fn channel_by_id(state: &StoreState, id: &str) -> Option<Channel> {
    if id.is_empty() {
        return None;
    }
    // Walk backwards so the last occurrence wins without building the map
    state
        .channels
        .categories
        .iter()
        .rev()
        .find_map(|category| {
            category
                .channels
                .iter()
                .rev()
                .find(|ch| ch.id == id)
                .map(|ch| ch.annotated(&category.name))
        })
}

pub fn has_channel(state: &StoreState, id: &str) -> bool {
    channel_by_id(state, id).is_some()
}

pub fn is_starred(state: &StoreState, id: &str) -> bool {
    state.starred_ids.iter().any(|s| s == id)
}

/// Starred channels in starred order, skipping ids missing from the catalog
pub fn starred_channels(state: &StoreState) -> Vec<Channel> {
    let map = channel_map(state);
    state
        .starred_ids
        .iter()
        .filter_map(|id| map.get(id).cloned())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Catalog;
    use serde_json::json;

    fn news_sports() -> Catalog {
        serde_json::from_value(json!({
            "categories": [
                {"name": "News", "channels": [{"id": "1", "name": "A"}]},
                {"name": "Sports", "channels": [{"id": "2", "name": "B"}]}
            ]
        }))
        .unwrap()
    }

    fn state_with(catalog: Catalog, starred: &[&str]) -> StoreState {
        let mut state = StoreState::new(starred.iter().map(|s| s.to_string()).collect());
        state.set_channels(catalog);
        state
    }

    #[test]
    fn test_default_category() {
        let empty = StoreState::default();
        assert!(default_category(&empty).is_none());

        let state = state_with(news_sports(), &[]);
        assert_eq!(default_category(&state).map(|c| c.name.as_str()), Some("News"));
    }

    #[test]
    fn test_channels_in_category_annotates() {
        let state = state_with(news_sports(), &[]);
        let sports = channels_in_category(&state, "Sports");
        assert_eq!(
            serde_json::to_value(&sports).unwrap(),
            json!([{"id": "2", "name": "B", "category": "Sports"}])
        );

        // The stored catalog is left as fetched
        assert_eq!(state.channels.categories[1].channels[0].category, None);
    }

    #[test]
    fn test_unknown_category() {
        let state = state_with(news_sports(), &[]);
        assert!(!has_category(&state, "Movies"));
        assert!(category_by_name(&state, "Movies").is_none());
        assert!(channels_in_category(&state, "Movies").is_empty());
        assert!(has_category(&state, "News"));
    }

    #[test]
    fn test_category_lookup_is_exact() {
        let state = state_with(news_sports(), &[]);
        assert!(!has_category(&state, "news"));
        assert!(!has_category(&state, "News "));
    }

    #[test]
    fn test_duplicate_category_first_match_wins() {
        let catalog = Catalog::new(vec![
            Category::new("News", vec![Channel::new("1")]),
            Category::new("News", vec![Channel::new("9")]),
        ]);
        let state = state_with(catalog, &[]);
        let channels = channels_in_category(&state, "News");
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "1");
    }

    #[test]
    fn test_channel_map_is_union_with_later_override() {
        let catalog = Catalog::new(vec![
            Category::new(
                "News",
                vec![Channel::new("1").with_field("name", "A"), Channel::new("3")],
            ),
            Category::new("Sports", vec![Channel::new("1").with_field("name", "A2")]),
            Category::new("Kids", vec![Channel::new("4")]),
        ]);
        let state = state_with(catalog, &[]);
        let map = channel_map(&state);

        let mut ids: Vec<_> = map.keys().cloned().collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert_eq!(map["1"].category.as_deref(), Some("Sports"));
        assert_eq!(map["1"].display_name(), "A2");
        assert_eq!(map["3"].category.as_deref(), Some("News"));

        // Single lookups agree with the map
        for (id, channel) in &map {
            assert_eq!(channel_by_id(&state, id).as_ref(), Some(channel));
        }
    }

    #[test]
    fn test_channels_without_id_are_not_addressable() {
        let catalog = Catalog::new(vec![Category::new(
            "News",
            vec![Channel::new("1"), Channel::new("").with_field("name", "no id")],
        )]);
        let state = state_with(catalog, &[""]);

        assert_eq!(channels_in_category(&state, "News").len(), 2);
        assert_eq!(channel_map(&state).len(), 1);
        assert!(!has_channel(&state, ""));
        assert!(starred_channels(&state).is_empty());
    }

    #[test]
    fn test_channel_lookup() {
        let state = state_with(news_sports(), &[]);
        assert!(has_channel(&state, "1"));
        assert!(!has_channel(&state, "99"));
        assert_eq!(
            channel_by_id(&state, "1").and_then(|c| c.category),
            Some("News".to_string())
        );
    }

    #[test]
    fn test_starred_channels_resolves_in_order() {
        let state = state_with(news_sports(), &["2", "missing", "1"]);
        let starred = starred_channels(&state);
        let ids: Vec<_> = starred.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
        assert!(is_starred(&state, "missing"));
        assert!(starred.iter().all(|c| has_channel(&state, &c.id)));
    }

    #[test]
    fn test_starred_channels_scenario() {
        let state = state_with(news_sports(), &["2"]);
        assert_eq!(
            serde_json::to_value(starred_channels(&state)).unwrap(),
            json!([{"id": "2", "name": "B", "category": "Sports"}])
        );
    }

    #[test]
    fn test_starred_channels_empty_catalog() {
        let state = state_with(Catalog::default(), &["1", "2"]);
        assert!(starred_channels(&state).is_empty());
    }
}
