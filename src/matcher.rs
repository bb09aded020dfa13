//! Filter matching shared by every backend.
//!
//! Present dimensions are ANDed, absent or empty ones are ignored. Prefix and
//! substring tests are byte-wise and case-sensitive.

use crate::{event::Event, filter::Filter};

/// Returns true if `event` satisfies every dimension of `filter`.
pub fn matches(event: &Event, filter: &Filter) -> bool {
    any_prefix(filter.ids.as_deref(), &event.id)
        && any_prefix(filter.authors.as_deref(), &event.pubkey)
        && kind_allowed(filter.kinds.as_deref(), event.kind)
        && filter.since.map_or(true, |s| event.created_at >= s)
        && filter.until.map_or(true, |u| event.created_at <= u)
        && tags_match(event, filter)
        && filter
            .search
            .as_deref()
            .map_or(true, |needle| event.content.contains(needle))
}

/// OR across filters. An empty slice matches nothing.
pub fn matches_any(event: &Event, filters: &[Filter]) -> bool {
    filters.iter().any(|f| matches(event, f))
}

fn any_prefix(prefixes: Option<&[String]>, value: &str) -> bool {
    match prefixes {
        None | Some([]) => true,
        Some(prefixes) => prefixes.iter().any(|p| value.starts_with(p.as_str())),
    }
}

fn kind_allowed(kinds: Option<&[u32]>, kind: u32) -> bool {
    match kinds {
        None | Some([]) => true,
        Some(kinds) => kinds.contains(&kind),
    }
}

/// Every `(name, values)` pair needs one tag named `name` with a value in `values`.
fn tags_match(event: &Event, filter: &Filter) -> bool {
    filter.tags.iter().all(|(name, values)| {
        values.is_empty()
            || event.tags.iter().any(|tag| {
                tag.name() == Some(name.as_str()) && tag.values().iter().any(|v| values.contains(v))
            })
    })
}
