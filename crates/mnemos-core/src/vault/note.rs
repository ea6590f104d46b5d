//! Note - The fundamental unit of the vault
//!
//! A note is a plain text file with an optional YAML header and a free-text
//! body. Its identity is its title, derived from the file base name. Edges
//! to other notes are `[[target title]]` tokens inside the body.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// NOTE TYPES
// ============================================================================

/// Types of notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    /// A raw idea or observation
    #[default]
    Idea,
    /// A decision that was made, with its context
    Decision,
    /// Something that was learned the hard way
    Learning,
    /// A synthesized insight connecting other notes
    Insight,
    /// An unresolved obstacle
    Blocker,
    /// A potential direction worth pursuing
    Opportunity,
}

/// Number of note type labels (dimension of the type one-hot vector)
pub const NOTE_TYPE_COUNT: usize = 6;

impl NoteType {
    /// All type labels in one-hot slot order
    pub const ALL: [NoteType; NOTE_TYPE_COUNT] = [
        NoteType::Idea,
        NoteType::Decision,
        NoteType::Learning,
        NoteType::Insight,
        NoteType::Blocker,
        NoteType::Opportunity,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteType::Idea => "idea",
            NoteType::Decision => "decision",
            NoteType::Learning => "learning",
            NoteType::Insight => "insight",
            NoteType::Blocker => "blocker",
            NoteType::Opportunity => "opportunity",
        }
    }

    /// Parse from string name, defaulting to `Idea` for unknown labels
    pub fn parse_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "idea" => NoteType::Idea,
            "decision" => NoteType::Decision,
            "learning" => NoteType::Learning,
            "insight" => NoteType::Insight,
            "blocker" => NoteType::Blocker,
            "opportunity" => NoteType::Opportunity,
            _ => NoteType::Idea,
        }
    }

    /// One-hot slot index for the type vector
    pub fn slot(&self) -> usize {
        match self {
            NoteType::Idea => 0,
            NoteType::Decision => 1,
            NoteType::Learning => 2,
            NoteType::Insight => 3,
            NoteType::Blocker => 4,
            NoteType::Opportunity => 5,
        }
    }
}

impl std::fmt::Display for NoteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// NOTE STATUS
// ============================================================================

/// Lifecycle status of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    /// Captured but not yet triaged
    Inbox,
    /// In active circulation
    #[default]
    Active,
    /// Work concluded
    Completed,
    /// Replaced by a newer note
    Superseded,
    /// Kept for the record only
    Archived,
}

impl NoteStatus {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteStatus::Inbox => "inbox",
            NoteStatus::Active => "active",
            NoteStatus::Completed => "completed",
            NoteStatus::Superseded => "superseded",
            NoteStatus::Archived => "archived",
        }
    }

    /// Parse from string name, defaulting to `Active` for unknown labels
    pub fn parse_name(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "inbox" => NoteStatus::Inbox,
            "active" => NoteStatus::Active,
            "completed" => NoteStatus::Completed,
            "superseded" => NoteStatus::Superseded,
            "archived" => NoteStatus::Archived,
            _ => NoteStatus::Active,
        }
    }
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// METABOLIC ROLE
// ============================================================================

/// Which decay regime a note belongs to
///
/// Identity notes decay an order of magnitude slower than general notes;
/// operational notes decay faster. Selected from project tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetabolicRole {
    /// Identity / self-model notes
    Identity,
    /// General notes
    #[default]
    Notes,
    /// Operational / day-to-day working notes
    Ops,
}

// ============================================================================
// NOTE
// ============================================================================

/// A note in the vault
///
/// The corpus on disk owns truth; the engine reads notes and never mutates
/// them. `last_accessed` and `access_count` are maintained by the capture
/// and update collaborators, never by this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Identity: the file base name, unique within the corpus
    pub title: String,
    /// Type of note
    pub note_type: NoteType,
    /// One-sentence description from the header
    pub description: Option<String>,
    /// Project tags
    pub projects: Vec<String>,
    /// Lifecycle status
    pub status: NoteStatus,
    /// Creation date
    pub created: NaiveDate,
    /// Last access date (read-only to the engine; >= `created`)
    pub last_accessed: NaiveDate,
    /// Access counter (read-only to the engine)
    pub access_count: u32,
    /// Free-text body
    pub body: String,
    /// Outgoing link targets extracted from the body, deduplicated,
    /// self-links removed
    pub links: Vec<String>,
}

impl Note {
    /// Create a minimal note with today's dates
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let today = chrono::Utc::now().date_naive();
        Self {
            title: title.into(),
            note_type: NoteType::default(),
            description: None,
            projects: Vec::new(),
            status: NoteStatus::default(),
            created: today,
            last_accessed: today,
            access_count: 0,
            body: body.into(),
            links: Vec::new(),
        }
    }

    /// Lifetime in whole days as of `today`, never negative
    pub fn lifetime_days(&self, today: NaiveDate) -> f64 {
        (today - self.created).num_days().max(0) as f64
    }

    /// Decay regime for the vitality model, selected from project tags
    pub fn metabolic_role(&self) -> MetabolicRole {
        for project in &self.projects {
            match project.to_lowercase().as_str() {
                "self" | "identity" => return MetabolicRole::Identity,
                "ops" | "operations" => return MetabolicRole::Ops,
                _ => {}
            }
        }
        MetabolicRole::Notes
    }

    /// Description if present, else the title (the embedding fallback)
    pub fn description_or_title(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.title)
    }
}

// ============================================================================
// TESTS
// ============================================================================
