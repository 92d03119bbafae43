use rust_decimal::Decimal;

use super::toggl::{Client, Project, TimeEntry, User, Workspace};

/// A time entry joined with every entity it references.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedEntry {
    pub id: u64,
    pub pid: u64,
    pub wid: u64,
    pub uid: u64,
    pub duration: i64,
    pub billable: bool,
    pub description: String,
    pub start: String,
    pub stop: Option<String>,
    pub project: Project,
    pub client: Client,
    pub workspace: Workspace,
    pub user: User,
}

impl EnrichedEntry {
    pub fn new(
        entry: TimeEntry,
        project: Project,
        client: Client,
        workspace: Workspace,
        user: User,
    ) -> Self {
        Self {
            id: entry.id,
            pid: project.id,
            wid: entry.wid,
            uid: entry.uid,
            duration: entry.duration,
            billable: entry.billable,
            description: entry.description.unwrap_or_default(),
            start: entry.start,
            stop: entry.stop,
            project,
            client,
            workspace,
            user,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BilledEntry {
    pub entry: EnrichedEntry,
    pub duration_human: String,
    pub cost: Decimal,
    pub billing: String,
}

/// Everything the renderer needs besides the configured identity fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub entries: Vec<BilledEntry>,
    pub total: Decimal,
    pub billing_total: String,
}
