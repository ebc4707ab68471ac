//! Planner output parsing.
//!
//! Accepts either a JSON object (`{"tasks": [{"description", "depends_on"}],
//! "rationale"}`, `subtasks` also accepted) or a numbered list:
//!
//! ```text
//! Split the work by layer.
//! 1. Design the schema
//! 2. Implement the API (depends on: 1)
//! 3. Review changes (depends on: 1, 2)
//! ```
//!
//! Dependencies refer to list positions. Free text outside the list becomes
//! the rationale.

use std::sync::OnceLock;

use anyhow::{bail, Context, Result};
use plancraft_core::api::{Decomposition, SubtaskSpec};
use regex::Regex;

static ITEM_REGEX: OnceLock<Regex> = OnceLock::new();
static DEPS_REGEX: OnceLock<Regex> = OnceLock::new();

fn item_regex() -> &'static Regex {
    ITEM_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:\d+[.)]|[-*])\s+(.+?)\s*$").expect("ITEM_REGEX is valid")
    })
}

fn deps_regex() -> &'static Regex {
    DEPS_REGEX.get_or_init(|| {
        Regex::new(r"(?i)\s*\((?:depends on|deps|after)\s*:?\s*([\d,\s]+)\)\s*$")
            .expect("DEPS_REGEX is valid")
    })
}

pub fn parse_decomposition(text: &str) -> Result<Decomposition> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Decomposition::default());
    }

    if let Some(json) = json_object(text) {
        match serde_json::from_str::<Decomposition>(json) {
            Ok(d) => return Ok(d),
            Err(err) => tracing::debug!(error = %err, "planner output is not a JSON plan"),
        }
    }

    let mut subtasks = Vec::new();
    let mut rationale = Vec::new();
    for line in text.lines() {
        match item_regex().captures(line) {
            Some(caps) => subtasks.push(parse_item(&caps[1])?),
            None if !line.trim().is_empty() => rationale.push(line.trim()),
            None => {}
        }
    }

    if subtasks.is_empty() {
        bail!("planner output contains neither a JSON plan nor a numbered task list");
    }
    Ok(Decomposition {
        subtasks,
        rationale: (!rationale.is_empty()).then(|| rationale.join("\n")),
    })
}

fn parse_item(body: &str) -> Result<SubtaskSpec> {
    let Some(caps) = deps_regex().captures(body) else {
        return Ok(SubtaskSpec::new(body.trim()));
    };
    let deps = caps[1]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().with_context(|| format!("invalid dependency {s:?}")))
        .collect::<Result<Vec<_>>>()?;
    let start = caps.get(0).map(|m| m.start()).unwrap_or(body.len());
    Ok(SubtaskSpec::new(body[..start].trim()).depends_on(deps))
}

/// Outermost `{ .. }` span, tolerating chatter around a JSON answer.
fn json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
