//! # Quote History
//!
//! Lightweight summaries of saved estimates for a dashboard list: who the
//! quote is for, what it totals, and whether it has been sent.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::pricing::compute_totals;
use crate::project::Project;

/// Client label used when a project has no client name
pub const UNTITLED_CLIENT: &str = "Untitled Project";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
}

impl QuoteStatus {
    pub const ALL: [QuoteStatus; 2] = [QuoteStatus::Draft, QuoteStatus::Sent];
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteStatus::Draft => write!(f, "Draft"),
            QuoteStatus::Sent => write!(f, "Sent"),
        }
    }
}

/// One row of the dashboard list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSummary {
    pub project_id: Uuid,
    pub client: String,
    pub title: String,
    /// Total due (grand total plus tax)
    pub total: f64,
    pub status: QuoteStatus,
    pub date: NaiveDate,
}

impl QuoteSummary {
    /// Summarize the project as it stands today, with its saved status.
    pub fn from_project(project: &Project) -> Self {
        let client = if project.meta.client_name.trim().is_empty() {
            UNTITLED_CLIENT.to_string()
        } else {
            project.meta.client_name.clone()
        };
        QuoteSummary {
            project_id: project.id(),
            client,
            title: project.meta.title.clone(),
            total: compute_totals(project).total_due,
            status: project.settings.status,
            date: project.meta.modified.date_naive(),
        }
    }
}

/// Most-recent-first list of quote summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteHistory {
    entries: Vec<QuoteSummary>,
}

impl QuoteHistory {
    pub fn new() -> Self {
        QuoteHistory::default()
    }

    /// Build a history from saved projects, most recently modified first.
    pub fn from_projects(projects: impl IntoIterator<Item = Project>) -> Self {
        let mut projects: Vec<Project> = projects.into_iter().collect();
        projects.sort_by_key(|project| project.meta.modified);
        let mut history = QuoteHistory::new();
        for project in &projects {
            history.upsert(QuoteSummary::from_project(project));
        }
        history
    }

    /// Replace the summary for the same project in place, or insert at the front.
    pub fn upsert(&mut self, summary: QuoteSummary) {
        match self.entries.iter_mut().find(|e| e.project_id == summary.project_id) {
            Some(existing) => *existing = summary,
            None => self.entries.insert(0, summary),
        }
    }

    pub fn get(&self, project_id: &Uuid) -> Option<&QuoteSummary> {
        self.entries.iter().find(|e| e.project_id == *project_id)
    }

    pub fn entries(&self) -> &[QuoteSummary] {
        &self.entries
    }

    pub fn count_with_status(&self, status: QuoteStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Sum of totals for quotes in `status`
    pub fn total_with_status(&self, status: QuoteStatus) -> f64 {
        self.entries.iter().filter(|e| e.status == status).map(|e| e.total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::{ItemKind, LineItem};
    use chrono::{TimeZone, Utc};

    fn priced_project(client: &str) -> Project {
        let mut project = Project::new("Bathroom", client);
        project.add_line(
            None,
            LineItem::new(ItemKind::PricedItem, "01")
                .with_quantity("hr", 10.0)
                .with_rates(0.0, 65.0, 0.0),
        );
        project.set_tax_percent("8");
        project
    }

    fn modified_on(mut project: Project, day: u32) -> Project {
        project.meta.modified = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap();
        project
    }

    #[test]
    fn test_summary_uses_total_due() {
        let summary = QuoteSummary::from_project(&priced_project("Smith Residence"));
        assert_eq!(summary.client, "Smith Residence");
        assert_eq!(summary.status, QuoteStatus::Draft);
        assert!((summary.total - 702.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_carries_saved_status_and_date() {
        let mut project = priced_project("Smith Residence");
        project.set_status(QuoteStatus::Sent);
        let project = modified_on(project, 14);
        let summary = QuoteSummary::from_project(&project);
        assert_eq!(summary.status, QuoteStatus::Sent);
        assert_eq!(summary.date, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert_eq!(summary.status.to_string(), "Sent");
    }

    #[test]
    fn test_blank_client_falls_back() {
        let summary = QuoteSummary::from_project(&priced_project("  "));
        assert_eq!(summary.client, UNTITLED_CLIENT);
    }

    #[test]
    fn test_upsert_replaces_in_place_or_prepends() {
        let mut first = priced_project("A");
        first.set_status(QuoteStatus::Sent);
        let mut second = priced_project("B");
        let mut history = QuoteHistory::new();

        history.upsert(QuoteSummary::from_project(&first));
        history.upsert(QuoteSummary::from_project(&second));
        assert_eq!(history.entries()[0].client, "B");

        second.set_client_name("B2");
        history.upsert(QuoteSummary::from_project(&second));
        assert_eq!(history.entries().len(), 2);
        assert_eq!(history.entries()[0].client, "B2");
        assert_eq!(history.get(&first.id()).unwrap().status, QuoteStatus::Sent);
    }

    #[test]
    fn test_from_projects_is_most_recent_first() {
        let older = modified_on(priced_project("Older"), 1);
        let newest = modified_on(priced_project("Newest"), 20);
        let middle = modified_on(priced_project("Middle"), 10);

        let history = QuoteHistory::from_projects(vec![older, newest, middle]);
        let clients: Vec<&str> = history.entries().iter().map(|e| e.client.as_str()).collect();
        assert_eq!(clients, vec!["Newest", "Middle", "Older"]);
    }

    #[test]
    fn test_status_counts() {
        let mut sent = priced_project("A");
        sent.set_status(QuoteStatus::Sent);
        let history = QuoteHistory::from_projects(vec![sent, priced_project("B"), priced_project("C")]);
        assert_eq!(history.count_with_status(QuoteStatus::Draft), 2);
        assert_eq!(history.count_with_status(QuoteStatus::Sent), 1);
        assert!((history.total_with_status(QuoteStatus::Sent) - 702.0).abs() < 1e-9);
    }
}
