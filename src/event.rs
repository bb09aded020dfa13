//! Nostr event model.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Wrapper for a Nostr tag expressed as an array of strings.
///
/// Tags appear as small arrays where the first element denotes the type and the
/// following elements hold data. Common examples include:
///
/// - `p` – references another author's public key
/// - `e` – links to another event ID
/// - `d` – identifier of an addressable event
/// - `t` – free-form topic or hashtag
///
/// Each tag is stored verbatim so uncommon or custom tags are preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag(pub Vec<String>);

impl Tag {
    /// Tag name, i.e. the first element.
    pub fn name(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Every element after the name.
    pub fn values(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }
}

/// Core Nostr event as stored and returned by queries.
///
/// ```json
/// {
///   "id": "aa11",
///   "pubkey": "npub...",
///   "kind": 1,
///   "created_at": 1700000000,
///   "tags": [["t", "news"], ["d", "slug"]],
///   "content": "hello",
///   "sig": "deadbeef"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Event identifier (hex of SHA-256 hash).
    pub id: String,
    /// Author public key (hex).
    pub pubkey: String,
    /// Kind number, e.g. `1` or `30023`.
    pub kind: u32,
    /// Unix timestamp of creation.
    pub created_at: u64,
    /// Arbitrary tags such as `d` (identifier) or `t` (topic).
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Event content body.
    #[serde(default)]
    pub content: String,
    /// Schnorr signature over the event hash. Never verified here.
    #[serde(default)]
    pub sig: String,
}

/// Storage class of a kind as defined by NIP-01.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindClass {
    Regular,
    /// Only the latest event per `(pubkey, kind)` is kept.
    Replaceable,
    Ephemeral,
    /// Carries a `d` identifier tag; replace still keys on `(pubkey, kind)`.
    Addressable,
}

impl KindClass {
    pub fn of(kind: u32) -> Self {
        match kind {
            0 | 3 | 10_000..=19_999 => KindClass::Replaceable,
            20_000..=29_999 => KindClass::Ephemeral,
            30_000..=39_999 => KindClass::Addressable,
            _ => KindClass::Regular,
        }
    }
}

/// Logical last-write-wins key used by replace: `(pubkey, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReplaceKey {
    pub pubkey: String,
    pub kind: u32,
}

impl Event {
    pub fn kind_class(&self) -> KindClass {
        KindClass::of(self.kind)
    }

    /// First value of the first tag named `name`.
    pub fn tag_value(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name() == Some(name))
            .and_then(|t| t.values().first())
            .map(String::as_str)
    }

    /// Key under which replace keeps a single live event.
    ///
    /// The `d` tag plays no part, so addressable kinds also keep one live
    /// event per `(pubkey, kind)`.
    pub fn replace_key(&self) -> ReplaceKey {
        ReplaceKey {
            pubkey: self.pubkey.clone(),
            kind: self.kind,
        }
    }
}

/// Compute the NIP-01 event hash from its fields.
pub fn event_hash(ev: &Event) -> [u8; 32] {
    let arr = serde_json::json!([0, ev.pubkey, ev.created_at, ev.kind, ev.tags, ev.content]);
    let hash = Sha256::digest(arr.to_string().as_bytes());
    hash.into()
}

/// Hex form of [`event_hash`], i.e. the id an honest client would assign.
pub fn compute_id(ev: &Event) -> String {
    hex::encode(event_hash(ev))
}
