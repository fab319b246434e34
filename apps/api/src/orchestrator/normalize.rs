//! Maps a backend match envelope into canonical ranked candidates.
//!
//! Pure: the same envelope and submitted set always give the same output.
//! Tolerant: a missing or malformed ranked array is an empty result, not an error.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};

use crate::protocol::{RankedCandidate, SubmittedCandidate};

const RANKED_KEY: &str = "top_candidates";

pub fn normalize_response(
    envelope: &Value,
    submitted: &[SubmittedCandidate],
) -> Vec<RankedCandidate> {
    let Some(entries) = envelope.get(RANKED_KEY).and_then(Value::as_array) else {
        return Vec::new();
    };

    let by_id: HashMap<&str, &SubmittedCandidate> =
        submitted.iter().map(|c| (c.id.as_str(), c)).collect();
    let mut seen = HashSet::new();

    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let id = string_field(entry, &["id"]).unwrap_or_default();
            if !id.is_empty() && !seen.insert(id.clone()) {
                return None;
            }
            let origin = by_id.get(id.as_str()).copied();
            Some(to_candidate(entry, id, origin))
        })
        .collect()
}

fn to_candidate(
    entry: &Map<String, Value>,
    id: String,
    origin: Option<&SubmittedCandidate>,
) -> RankedCandidate {
    let name = string_field(entry, &["name"])
        .or_else(|| origin.map(|c| c.name.clone()))
        .unwrap_or_default();

    RankedCandidate {
        name,
        info: origin.map(|c| c.info.clone()).unwrap_or_default(),
        resume: origin.map(|c| c.resume.clone()).unwrap_or_default(),
        similarity_score: number_field(entry, &["similarity_score", "similarityScore"]),
        ai_summary: string_field(entry, &["ai_summary", "aiSummary", "summary"]),
        resume_name: string_field(entry, &["resume_name"]),
        rank: number_field(entry, &["rank"])
            .filter(|r| *r >= 0.0)
            .map(|r| r as u32),
        id,
    }
}

/// First key present as a string. Numeric ids are accepted and stringified.
fn string_field(entry: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match entry.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_field(entry: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| entry.get(*key)?.as_f64())
}
