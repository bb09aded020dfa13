//! Nostr filter model and its JSON wire form.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declarative predicate over event fields.
///
/// Every dimension is optional and an empty set counts as absent, so
/// `Filter::default()` matches every event.
///
/// ```json
/// { "authors": ["ab12"], "kinds": [1, 30023], "#t": ["news"],
///   "since": 1700000000, "limit": 20 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Filter {
    /// Event id prefixes.
    pub ids: Option<Vec<String>>,
    /// Author pubkey prefixes.
    pub authors: Option<Vec<String>>,
    pub kinds: Option<Vec<u32>>,
    /// Tag name (without `#`) to accepted values.
    pub tags: BTreeMap<String, Vec<String>>,
    /// Inclusive lower bound on `created_at`.
    pub since: Option<u64>,
    /// Inclusive upper bound on `created_at`.
    pub until: Option<u64>,
    /// `Some(0)` asks for nothing; `None` defers to the backend default.
    pub limit: Option<usize>,
    /// Case-sensitive substring of `content`.
    pub search: Option<String>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    pub fn kinds(mut self, kinds: impl IntoIterator<Item = u32>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    /// Require a tag named `name` carrying one of `values`.
    pub fn tag<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .entry(name.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn since(mut self, since: u64) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: u64) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Build a `Filter` from a Nostr filter JSON object.
    ///
    /// Parsing is total: members of the wrong type are ignored and the
    /// corresponding dimension stays unconstrained.
    pub fn from_value(val: &Value) -> Self {
        let strings = |key: &str| {
            val.get(key).and_then(|v| v.as_array()).map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(|s| s.to_string()))
                    .collect::<Vec<_>>()
            })
        };
        let ids = strings("ids");
        let authors = strings("authors");
        let kinds = val.get("kinds").and_then(|v| v.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_u64().and_then(|u| u32::try_from(u).ok()))
                .collect()
        });
        // Tag queries use `#<name>` keys holding an array of values.
        let mut tags = BTreeMap::new();
        if let Some(obj) = val.as_object() {
            for (key, v) in obj {
                let Some(name) = key.strip_prefix('#') else {
                    continue;
                };
                if let Some(values) = strings(key.as_str()) {
                    tags.insert(name.to_string(), values);
                } else if let Some(single) = v.as_str() {
                    tags.insert(name.to_string(), vec![single.to_string()]);
                }
            }
        }
        let since = val.get("since").and_then(|v| v.as_u64());
        let until = val.get("until").and_then(|v| v.as_u64());
        let limit = val
            .get("limit")
            .and_then(|v| v.as_u64())
            .map(|v| usize::try_from(v).unwrap_or(usize::MAX));
        let search = val
            .get("search")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        Filter {
            ids,
            authors,
            kinds,
            tags,
            since,
            until,
            limit,
            search,
        }
    }

    /// Render as a Nostr filter JSON object, omitting absent members.
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        if let Some(ids) = &self.ids {
            obj.insert("ids".into(), Value::from(ids.clone()));
        }
        if let Some(authors) = &self.authors {
            obj.insert("authors".into(), Value::from(authors.clone()));
        }
        if let Some(kinds) = &self.kinds {
            obj.insert("kinds".into(), Value::from(kinds.clone()));
        }
        for (name, values) in &self.tags {
            obj.insert(format!("#{name}"), Value::from(values.clone()));
        }
        if let Some(s) = self.since {
            obj.insert("since".into(), Value::from(s));
        }
        if let Some(u) = self.until {
            obj.insert("until".into(), Value::from(u));
        }
        if let Some(l) = self.limit {
            obj.insert("limit".into(), Value::from(l as u64));
        }
        if let Some(s) = &self.search {
            obj.insert("search".into(), Value::String(s.clone()));
        }
        Value::Object(obj)
    }
}

impl TryFrom<Value> for Filter {
    type Error = String;

    fn try_from(val: Value) -> Result<Self, Self::Error> {
        if !val.is_object() {
            return Err(format!("filter must be a JSON object, got {val}"));
        }
        Ok(Filter::from_value(&val))
    }
}

impl From<Filter> for Value {
    fn from(filter: Filter) -> Self {
        filter.to_value()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
