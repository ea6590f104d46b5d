//! Corpus Reader
//!
//! Reads every note file in the corpus directory, splitting the YAML-style
//! metadata header from the body and extracting `[[link]]` tokens. A missing
//! or malformed header yields a body-only record with a non-fatal warning.
//!
//! Also owns title-mention detection, used by the capture collaborator when
//! promoting drafts into the corpus.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use walkdir::WalkDir;

use super::note::{Note, NoteStatus, NoteType};

// ============================================================================
// LINK TOKENS
// ============================================================================

fn link_regex() -> &'static Regex {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    LINK_RE.get_or_init(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("valid link regex"))
}

/// Extract outgoing link targets from a body
///
/// Targets are trimmed and collapsed case-sensitively; duplicates keep their
/// first position. Links to `self_title` are dropped (self-loops are ignored
/// by graph metrics).
pub fn extract_links(body: &str, self_title: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for capture in link_regex().captures_iter(body) {
        let target = capture[1].trim();
        if target.is_empty() || target == self_title {
            continue;
        }
        if seen.insert(target.to_string()) {
            links.push(target.to_string());
        }
    }
    links
}

// ============================================================================
// HEADER PARSING
// ============================================================================

/// Raw header as it appears on disk; all fields optional
#[derive(Debug, Default, Deserialize)]
struct RawHeader {
    #[serde(rename = "type")]
    note_type: Option<String>,
    description: Option<String>,
    #[serde(default)]
    project: ProjectField,
    status: Option<String>,
    created: Option<String>,
    last_accessed: Option<String>,
    access_count: Option<u32>,
}

/// `project` accepts a single tag or a list of tags
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProjectField {
    One(String),
    Many(Vec<String>),
}

impl Default for ProjectField {
    fn default() -> Self {
        ProjectField::Many(Vec::new())
    }
}

impl ProjectField {
    fn into_vec(self) -> Vec<String> {
        match self {
            ProjectField::One(tag) => vec![tag],
            ProjectField::Many(tags) => tags,
        }
    }
}

/// Split an optional `---` delimited header block from the body
///
/// Returns `(header_text, body)`. The header block must start on the first
/// line of the file.
fn split_header(content: &str) -> (Option<&str>, &str) {
    let rest = match content.strip_prefix("---") {
        Some(rest) => rest,
        None => return (None, content),
    };
    // The opening fence must be `---` on its own line
    let rest = match rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) {
        Some(rest) => rest,
        None => return (None, content),
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let header = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return (Some(header), body);
        }
        offset += line.len();
    }
    (None, content)
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            chrono::DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse a note file's content into a `Note`
///
/// A malformed header degrades to a body-only record with a warning;
/// validation beyond that is a collaborator's concern.
pub fn parse_note(title: &str, content: &str) -> Note {
    let (header_text, body) = split_header(content);

    let header = match header_text {
        Some(text) => match serde_yaml::from_str::<RawHeader>(text) {
            Ok(header) => header,
            Err(error) => {
                tracing::warn!(title, %error, "malformed note header, using body only");
                RawHeader::default()
            }
        },
        None => RawHeader::default(),
    };

    let today = chrono::Utc::now().date_naive();
    let created = header
        .created
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(today);
    let last_accessed = header
        .last_accessed
        .as_deref()
        .and_then(parse_date)
        .unwrap_or(created)
        .max(created);

    Note {
        title: title.to_string(),
        note_type: header
            .note_type
            .as_deref()
            .map(NoteType::parse_name)
            .unwrap_or_default(),
        description: header
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        projects: header.project.into_vec(),
        status: header
            .status
            .as_deref()
            .map(NoteStatus::parse_name)
            .unwrap_or_default(),
        created,
        last_accessed,
        access_count: header.access_count.unwrap_or(0),
        links: extract_links(body, title),
        body: body.to_string(),
    }
}

// ============================================================================
// CORPUS READER
// ============================================================================

/// Reads the note corpus from disk
#[derive(Debug, Clone)]
pub struct CorpusReader {
    notes_dir: PathBuf,
}

impl CorpusReader {
    /// Create a reader over a corpus directory
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
        }
    }

    /// Read every `.md` note in the corpus
    ///
    /// One-off unreadable files are skipped with a warning; a missing corpus
    /// directory yields an empty corpus.
    pub fn read_all(&self) -> Vec<Note> {
        if !self.notes_dir.exists() {
            tracing::warn!(dir = %self.notes_dir.display(), "notes directory missing, corpus is empty");
            return Vec::new();
        }

        let mut notes = Vec::new();
        for entry in WalkDir::new(&self.notes_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "md") {
                continue;
            }
            let Some(title) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match std::fs::read_to_string(path) {
                Ok(content) => notes.push(parse_note(title, &content)),
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "failed to read note");
                }
            }
        }
        notes
    }

    /// The corpus directory this reader walks
    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }
}

// ============================================================================
// TITLE MENTIONS
// ============================================================================

/// An unlinked mention of an existing title inside a body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleMention {
    /// The canonical title that was mentioned
    pub title: String,
    /// Byte offset of the match start
    pub start: usize,
    /// Byte offset one past the match end
    pub end: usize,
}

/// Build the slug-flexible pattern for one title
///
/// Word-boundary semantics, case-insensitive, with interior dashes matching
/// dash-or-whitespace and vice versa.
fn mention_pattern(title: &str) -> Option<Regex> {
    let parts: Vec<String> = title
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    if parts.is_empty() {
        return None;
    }
    let pattern = format!(r"(?i)\b{}\b", parts.join(r"[\s\-]+"));
    Regex::new(&pattern).ok()
}

/// Detect non-overlapping mentions of existing titles in a body
///
/// Titles are tried longest first; matches already inside `[[ ]]` tokens are
/// skipped, and a span claimed by a longer title is not re-claimed by a
/// shorter one.
pub fn detect_title_mentions(body: &str, titles: &[String]) -> Vec<TitleMention> {
    let mut ordered: Vec<&String> = titles.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    // Spans already linked are off limits
    let mut claimed: Vec<(usize, usize)> = link_regex()
        .find_iter(body)
        .map(|m| (m.start(), m.end()))
        .collect();

    let overlaps = |claimed: &[(usize, usize)], start: usize, end: usize| {
        claimed.iter().any(|&(s, e)| start < e && s < end)
    };

    let mut mentions = Vec::new();
    for title in ordered {
        let Some(pattern) = mention_pattern(title) else {
            continue;
        };
        for m in pattern.find_iter(body) {
            if overlaps(&claimed, m.start(), m.end()) {
                continue;
            }
            claimed.push((m.start(), m.end()));
            mentions.push(TitleMention {
                title: title.clone(),
                start: m.start(),
                end: m.end(),
            });
        }
    }
    mentions.sort_by_key(|m| m.start);
    mentions
}

/// Replace detected mentions with `[[title]]` tokens
pub fn link_title_mentions(body: &str, titles: &[String]) -> String {
    let mentions = detect_title_mentions(body, titles);
    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;
    for mention in mentions {
        out.push_str(&body[cursor..mention.start]);
        out.push_str("[[");
        out.push_str(&mention.title);
        out.push_str("]]");
        cursor = mention.end;
    }
    out.push_str(&body[cursor..]);
    out
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_header_round_trip() {
        let content = "---\ntype: decision\n---\nbody text";
        let (header, body) = split_header(content);
        assert_eq!(header, Some("type: decision\n"));
        assert_eq!(body, "body text");
    }

    #[test]
    fn test_split_header_absent() {
        let (header, body) = split_header("just a body");
        assert!(header.is_none());
        assert_eq!(body, "just a body");
    }

    #[test]
    fn test_split_header_unterminated() {
        let (header, body) = split_header("---\ntype: idea\nno closing fence");
        assert!(header.is_none());
        assert_eq!(body, "---\ntype: idea\nno closing fence");
    }

    #[test]
    fn test_parse_note_full_header() {
        let content = "---\ntype: learning\ndescription: How the broker restarts\nproject:\n  - infra\n  - broker\nstatus: active\ncreated: 2025-11-02\nlast_accessed: 2025-12-01\naccess_count: 7\n---\nSee [[broker deploy runbook]] and [[broker deploy runbook]].";
        let note = parse_note("broker restart notes", content);

        assert_eq!(note.note_type, NoteType::Learning);
        assert_eq!(note.description.as_deref(), Some("How the broker restarts"));
        assert_eq!(note.projects, vec!["infra", "broker"]);
        assert_eq!(note.access_count, 7);
        assert_eq!(note.created, NaiveDate::from_ymd_opt(2025, 11, 2).unwrap());
        // Duplicate links collapse
        assert_eq!(note.links, vec!["broker deploy runbook"]);
    }

    #[test]
    fn test_parse_note_malformed_header_degrades() {
        let content = "---\ntype: [unclosed\n---\nstill a body";
        let note = parse_note("a", content);
        assert_eq!(note.note_type, NoteType::Idea);
        assert_eq!(note.body, "still a body");
    }

    #[test]
    fn test_parse_note_clamps_last_accessed() {
        let content = "---\ncreated: 2025-06-01\nlast_accessed: 2025-01-01\n---\n";
        let note = parse_note("a", content);
        assert_eq!(note.last_accessed, note.created);
    }

    #[test]
    fn test_extract_links_skips_self_and_empty() {
        let links = extract_links("[[a]] [[ ]] [[me]] [[b]]", "me");
        assert_eq!(links, vec!["a", "b"]);
    }

    #[test]
    fn test_mention_detection_basic() {
        let titles = vec!["broker deploy runbook".to_string()];
        let mentions = detect_title_mentions("read the Broker Deploy Runbook today", &titles);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].title, "broker deploy runbook");
    }

    #[test]
    fn test_mention_detection_slug_flexible() {
        let titles = vec!["broker-deploy".to_string()];
        let mentions = detect_title_mentions("the broker deploy went fine", &titles);
        assert_eq!(mentions.len(), 1);
    }

    #[test]
    fn test_mention_detection_skips_existing_links() {
        let titles = vec!["broker".to_string()];
        let mentions = detect_title_mentions("[[broker]] is not a mention, broker is", &titles);
        assert_eq!(mentions.len(), 1);
        assert!(mentions[0].start > 10);
    }

    #[test]
    fn test_mention_detection_prefers_longest() {
        let titles = vec!["broker".to_string(), "broker deploy".to_string()];
        let mentions = detect_title_mentions("the broker deploy failed", &titles);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].title, "broker deploy");
    }

    #[test]
    fn test_link_title_mentions_wraps() {
        let titles = vec!["broker".to_string()];
        let linked = link_title_mentions("ask the broker about it", &titles);
        assert_eq!(linked, "ask the [[broker]] about it");
    }

    #[test]
    fn test_read_all_missing_dir_is_empty() {
        let reader = CorpusReader::new("/definitely/not/a/real/dir");
        assert!(reader.read_all().is_empty());
    }
}
