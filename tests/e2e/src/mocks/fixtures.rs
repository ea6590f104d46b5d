//! Note File Factory
//!
//! Renders note files with realistic metadata headers for test vaults.

use chrono::NaiveDate;

/// Builder for one note file on disk
#[derive(Debug, Clone)]
pub struct NoteFixture {
    title: String,
    note_type: Option<String>,
    description: Option<String>,
    projects: Vec<String>,
    status: Option<String>,
    created: Option<NaiveDate>,
    last_accessed: Option<NaiveDate>,
    access_count: Option<u32>,
    body: String,
}

impl NoteFixture {
    /// Start a fixture with a title and empty body
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            note_type: None,
            description: None,
            projects: Vec::new(),
            status: None,
            created: None,
            last_accessed: None,
            access_count: None,
            body: String::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn note_type(mut self, note_type: &str) -> Self {
        self.note_type = Some(note_type.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn project(mut self, project: &str) -> Self {
        self.projects.push(project.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = Some(status.to_string());
        self
    }

    pub fn created(mut self, date: NaiveDate) -> Self {
        self.created = Some(date);
        self
    }

    /// Created `days` days before today
    pub fn age_days(self, days: i64) -> Self {
        let date = chrono::Utc::now().date_naive() - chrono::Duration::days(days);
        self.created(date)
    }

    pub fn last_accessed(mut self, date: NaiveDate) -> Self {
        self.last_accessed = Some(date);
        self
    }

    pub fn access_count(mut self, count: u32) -> Self {
        self.access_count = Some(count);
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    /// Append a `[[link]]` line to the body
    pub fn link_to(mut self, target: &str) -> Self {
        if !self.body.is_empty() {
            self.body.push('\n');
        }
        self.body.push_str(&format!("[[{target}]]"));
        self
    }

    /// Render the note file content (header plus body)
    pub fn render(&self) -> String {
        let mut header = String::new();
        if let Some(note_type) = &self.note_type {
            header.push_str(&format!("type: {note_type}\n"));
        }
        if let Some(description) = &self.description {
            header.push_str(&format!("description: {description}\n"));
        }
        if !self.projects.is_empty() {
            header.push_str("project:\n");
            for project in &self.projects {
                header.push_str(&format!("  - {project}\n"));
            }
        }
        if let Some(status) = &self.status {
            header.push_str(&format!("status: {status}\n"));
        }
        if let Some(created) = &self.created {
            header.push_str(&format!("created: {created}\n"));
        }
        if let Some(last_accessed) = &self.last_accessed {
            header.push_str(&format!("last_accessed: {last_accessed}\n"));
        }
        if let Some(access_count) = self.access_count {
            header.push_str(&format!("access_count: {access_count}\n"));
        }

        if header.is_empty() {
            self.body.clone()
        } else {
            format!("---\n{header}---\n{}", self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_header() {
        let content = NoteFixture::new("broker")
            .note_type("learning")
            .description("how the broker works")
            .project("infra")
            .access_count(5)
            .body("the body")
            .render();

        assert!(content.starts_with("---\n"));
        assert!(content.contains("type: learning"));
        assert!(content.contains("access_count: 5"));
        assert!(content.ends_with("the body"));
    }

    #[test]
    fn test_render_body_only() {
        let content = NoteFixture::new("plain").body("just text").render();
        assert_eq!(content, "just text");
    }
}
