//! Event corpora: loading from disk and synthetic generation.

use std::{
    fs,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::event::{compute_id, Event, Tag};

/// Read a corpus stored either as a JSON array of events or as
/// newline-delimited JSON (one event per line, blank lines skipped).
pub fn load(path: &Path) -> Result<Vec<Event>> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&data).with_context(|| format!("parsing {}", path.display()))
}

/// Parse corpus text, detecting the format from the first non-blank byte.
pub fn parse(data: &str) -> Result<Vec<Event>> {
    if data.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(data)?);
    }
    data.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("line {}", n + 1))
        })
        .collect()
}

/// Write events as newline-delimited JSON.
pub fn write_ndjson(path: &Path, events: &[Event]) -> Result<()> {
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for ev in events {
        serde_json::to_writer(&mut out, ev)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

const KINDS: [u32; 6] = [0, 1, 3, 5, 7, 30023];
const TOPICS: [&str; 5] = ["nostr", "bitcoin", "rust", "news", "art"];
const WORDS: [&str; 8] = ["gm", "hello", "relay", "zap", "note", "world", "pura", "vida"];

/// Deterministic synthetic corpus of `count` events from `authors` keys.
///
/// Ids are real NIP-01 hashes; signatures are random bytes since nothing
/// here verifies them.
pub fn generate(count: usize, authors: usize, seed: u64) -> Vec<Event> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pubkeys: Vec<String> = (0..authors.max(1))
        .map(|_| hex::encode(rng.gen::<[u8; 32]>()))
        .collect();
    let base = 1_700_000_000u64;
    let mut events: Vec<Event> = Vec::with_capacity(count);
    for i in 0..count {
        let pubkey = pubkeys.choose(&mut rng).cloned().unwrap_or_default();
        let kind = *KINDS.choose(&mut rng).unwrap_or(&1);
        let mut tags = Vec::new();
        if let Some(prev) = events.last().filter(|_| rng.gen_bool(0.3)) {
            tags.push(Tag(vec!["e".into(), prev.id.clone()]));
        }
        if rng.gen_bool(0.3) {
            if let Some(p) = pubkeys.choose(&mut rng) {
                tags.push(Tag(vec!["p".into(), p.clone()]));
            }
        }
        if rng.gen_bool(0.2) {
            let topic = TOPICS.choose(&mut rng).copied().unwrap_or("nostr");
            tags.push(Tag(vec!["t".into(), topic.into()]));
        }
        if kind == 30023 {
            tags.push(Tag(vec!["d".into(), format!("article-{}", i % 17)]));
        }
        let content = (0..rng.gen_range(1..8))
            .map(|_| *WORDS.choose(&mut rng).unwrap_or(&"gm"))
            .collect::<Vec<_>>()
            .join(" ");
        let mut ev = Event {
            id: String::new(),
            pubkey,
            kind,
            created_at: base + rng.gen_range(0..86_400 * 30),
            tags,
            content,
            sig: hex::encode(rng.gen::<[u8; 32]>()).repeat(2),
        };
        ev.id = compute_id(&ev);
        events.push(ev);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generate_is_deterministic_with_valid_ids() {
        let a = generate(50, 5, 42);
        let b = generate(50, 5, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        for ev in &a {
            assert_eq!(ev.id, compute_id(ev));
            assert_eq!(ev.pubkey.len(), 64);
            assert_eq!(ev.sig.len(), 128);
        }
        let authors: std::collections::HashSet<_> = a.iter().map(|e| &e.pubkey).collect();
        assert!(authors.len() <= 5);
    }

    #[test]
    fn json_array_and_ndjson_load_alike() {
        let dir = TempDir::new().unwrap();
        let events = generate(10, 3, 1);

        let array_path = dir.path().join("events.json");
        fs::write(&array_path, serde_json::to_string(&events).unwrap()).unwrap();
        assert_eq!(load(&array_path).unwrap(), events);

        let nd_path = dir.path().join("events.ndjson");
        write_ndjson(&nd_path, &events).unwrap();
        assert_eq!(load(&nd_path).unwrap(), events);
    }

    #[test]
    fn ndjson_skips_blank_lines_and_reports_bad_line() {
        let good = r#"{"id":"a","pubkey":"p","created_at":1,"kind":1,"tags":[],"content":"","sig":""}"#;
        let parsed = parse(&format!("\n{good}\n\n{good}\n")).unwrap();
        assert_eq!(parsed.len(), 2);
        let err = parse(&format!("{good}\nnot json\n")).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn missing_file_errors() {
        assert!(load(Path::new("definitely-missing.json")).is_err());
    }
}
