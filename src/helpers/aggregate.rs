use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::toggl::{Resource, ResourceFetcher};
use crate::error::{Reference, Result};
use crate::models::invoice::EnrichedEntry;
use crate::models::toggl::{
    Client, DataEnvelope, EntityIndex, Project, TimeEntry, User, Workspace,
};
use crate::window::TimeWindow;

/// Pause between consecutive single-project requests.
pub const PROJECT_FETCH_DELAY: Duration = Duration::from_millis(100);

/// Everything time entries are joined against.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub projects: EntityIndex<Project>,
    pub clients: EntityIndex<Client>,
    pub workspaces: EntityIndex<Workspace>,
    pub users: EntityIndex<User>,
}

async fn fetch_as<T, F>(fetcher: &F, resource: &Resource) -> Result<T>
where
    T: DeserializeOwned,
    F: ResourceFetcher + ?Sized,
{
    let value = fetcher.fetch(resource).await?;
    Ok(serde_json::from_value(value)?)
}

/// Fetches the window's time entries and every entity they reference, then
/// joins them. Entries keep the order the API returned them in.
pub async fn fetch_entries<F>(fetcher: &F, window: &TimeWindow) -> Result<Vec<EnrichedEntry>>
where
    F: ResourceFetcher + ?Sized,
{
    let (start, end) = window.query_bounds();
    info!("Fetching time entries from {} to {}", start, end);
    let time_entries: Vec<TimeEntry> =
        fetch_as(fetcher, &Resource::TimeEntries { start, end }).await?;
    info!("Fetched {} time entries", time_entries.len());

    let clients: Vec<Client> = fetch_as(fetcher, &Resource::Clients).await?;
    info!("Fetched {} clients", clients.len());
    let clients = EntityIndex::from_items(Reference::Client, clients, |c: &Client| c.id);

    let projects = fetch_projects(fetcher, &time_entries).await?;

    let workspaces: Vec<Workspace> = fetch_as(fetcher, &Resource::Workspaces).await?;
    info!("Fetched {} workspaces", workspaces.len());
    let workspaces =
        EntityIndex::from_items(Reference::Workspace, workspaces, |ws: &Workspace| ws.id);

    let me: DataEnvelope<User> = fetch_as(fetcher, &Resource::Me).await?;
    info!("Fetched current user {}", me.data.id);
    let users = EntityIndex::from_items(Reference::User, [me.data], |u: &User| u.id);

    let references = ReferenceData {
        projects,
        clients,
        workspaces,
        users,
    };
    join(time_entries, &references)
}

/// Project ids referenced by `entries`, each once, in first-seen order.
pub fn distinct_project_ids(entries: &[TimeEntry]) -> Vec<u64> {
    let mut ids = Vec::new();
    for pid in entries.iter().filter_map(|entry| entry.pid) {
        if !ids.contains(&pid) {
            ids.push(pid);
        }
    }
    ids
}

async fn fetch_projects<F>(fetcher: &F, entries: &[TimeEntry]) -> Result<EntityIndex<Project>>
where
    F: ResourceFetcher + ?Sized,
{
    let ids = distinct_project_ids(entries);
    info!("Fetching {} distinct projects", ids.len());

    let mut projects = EntityIndex::new(Reference::Project);
    for (i, pid) in ids.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(PROJECT_FETCH_DELAY).await;
        }
        let project: DataEnvelope<Project> = fetch_as(fetcher, &Resource::Project(pid)).await?;
        debug!("Fetched project {} ({})", pid, project.data.name);
        projects.insert(pid, project.data);
    }
    Ok(projects)
}

pub fn join(entries: Vec<TimeEntry>, references: &ReferenceData) -> Result<Vec<EnrichedEntry>> {
    entries
        .into_iter()
        .map(|entry| {
            let project = references.projects.resolve(entry.id, entry.pid)?;
            let client = references.clients.resolve(entry.id, project.cid)?;
            let workspace = references.workspaces.resolve(entry.id, Some(entry.wid))?;
            let user = references.users.resolve(entry.id, Some(entry.uid))?;

            Ok(EnrichedEntry::new(
                entry,
                project.clone(),
                client.clone(),
                workspace.clone(),
                user.clone(),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvoiceError;
    use crate::helpers::in_memory::InMemoryFetcher;
    use crate::window::Offset;
    use reqwest::StatusCode;
    use serde_json::json;
    use tokio::time::Instant;

    fn window() -> TimeWindow {
        TimeWindow::resolve(Offset::Week, None).unwrap()
    }

    fn fetcher(time_entries: serde_json::Value) -> InMemoryFetcher {
        InMemoryFetcher::new()
            .with("time_entries", time_entries)
            .with("clients", json!([{"id": 100, "name": "Acme"}, {"id": 101, "name": "Globex"}]))
            .with("projects/10", json!({"data": {"id": 10, "cid": 100, "name": "Website"}}))
            .with("projects/11", json!({"data": {"id": 11, "cid": 101, "name": "Audit"}}))
            .with("workspaces", json!([{"id": 1, "name": "Main"}]))
            .with("me", json!({"data": {"id": 5, "fullname": "Jo Doe"}}))
    }

    fn entry(id: u64, pid: u64) -> serde_json::Value {
        json!({
            "id": id, "pid": pid, "wid": 1, "uid": 5, "duration": 3600,
            "billable": true, "start": "2024-03-01T09:00:00+00:00",
        })
    }

    #[tokio::test]
    async fn joins_every_reference() {
        let fetcher = fetcher(json!([entry(1, 10), entry(2, 11)]));
        let entries = fetch_entries(&fetcher, &window()).await.unwrap();

        assert_eq!(entries.len(), 2);
        for e in &entries {
            assert_eq!(e.project.id, e.pid);
            assert_eq!(Some(e.client.id), e.project.cid);
            assert_eq!(e.workspace.id, e.wid);
            assert_eq!(e.user.id, e.uid);
            assert_eq!(e.description, "");
        }
        assert_eq!(entries[0].client.name, "Acme");
        assert_eq!(entries[1].client.name, "Globex");
    }

    #[tokio::test]
    async fn preserves_time_entry_order() {
        let fetcher = fetcher(json!([entry(3, 11), entry(1, 10), entry(2, 11)]));
        let entries = fetch_entries(&fetcher, &window()).await.unwrap();
        let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn fetches_each_project_once() {
        let fetcher = fetcher(json!([entry(1, 10), entry(2, 10)]));
        fetch_entries(&fetcher, &window()).await.unwrap();

        let project_fetches = fetcher
            .requests()
            .await
            .into_iter()
            .filter(|r| matches!(r, Resource::Project(_)))
            .collect::<Vec<_>>();
        assert_eq!(project_fetches, vec![Resource::Project(10)]);
    }

    #[tokio::test]
    async fn fetches_resources_in_pipeline_order() {
        let fetcher = fetcher(json!([entry(1, 10), entry(2, 11)]));
        fetch_entries(&fetcher, &window()).await.unwrap();

        let paths: Vec<String> = fetcher.requests().await.iter().map(Resource::path).collect();
        assert_eq!(
            paths,
            vec!["time_entries", "clients", "projects/10", "projects/11", "workspaces", "me"]
        );
    }

    #[tokio::test]
    async fn time_entries_failure_stops_the_run() {
        let fetcher = fetcher(json!([])).with_status("time_entries", StatusCode::NOT_FOUND);
        let result = fetch_entries(&fetcher, &window()).await;

        assert!(matches!(
            result,
            Err(InvoiceError::RemoteRequest { status, .. }) if status == StatusCode::NOT_FOUND
        ));
        assert_eq!(fetcher.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_client_is_a_missing_reference() {
        let fetcher = fetcher(json!([entry(1, 12)])).with(
            "projects/12",
            json!({"data": {"id": 12, "cid": 999, "name": "Orphan"}}),
        );
        let result = fetch_entries(&fetcher, &window()).await;
        assert!(matches!(
            result,
            Err(InvoiceError::MissingReference { kind: Reference::Client, id: Some(999), .. })
        ));
    }

    #[tokio::test]
    async fn unknown_workspace_is_a_missing_reference() {
        let mut raw = entry(1, 10);
        raw["wid"] = json!(2);
        let result = fetch_entries(&fetcher(json!([raw])), &window()).await;
        assert!(matches!(
            result,
            Err(InvoiceError::MissingReference { kind: Reference::Workspace, id: Some(2), .. })
        ));
    }

    #[tokio::test]
    async fn entry_without_project_is_a_missing_reference() {
        let mut raw = entry(1, 10);
        raw.as_object_mut().unwrap().remove("pid");
        let result = fetch_entries(&fetcher(json!([raw])), &window()).await;
        assert!(matches!(
            result,
            Err(InvoiceError::MissingReference { kind: Reference::Project, id: None, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_project_fetches_only() {
        let fetcher = fetcher(json!([entry(1, 10), entry(2, 11), entry(3, 12), entry(4, 10)])).with(
            "projects/12",
            json!({"data": {"id": 12, "cid": 100, "name": "Hosting"}}),
        );

        let started = Instant::now();
        fetch_entries(&fetcher, &window()).await.unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= 2 * PROJECT_FETCH_DELAY, "waited {elapsed:?}");
        assert!(
            elapsed < 2 * PROJECT_FETCH_DELAY + Duration::from_millis(1),
            "waited {elapsed:?}"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn single_project_is_fetched_without_waiting() {
        let fetcher = fetcher(json!([entry(1, 10), entry(2, 10)]));

        let started = Instant::now();
        fetch_entries(&fetcher, &window()).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn join_rejects_unfetched_project() {
        let entries: Vec<TimeEntry> = serde_json::from_value(json!([entry(1, 10)])).unwrap();
        let references = ReferenceData {
            projects: EntityIndex::new(Reference::Project),
            clients: EntityIndex::new(Reference::Client),
            workspaces: EntityIndex::new(Reference::Workspace),
            users: EntityIndex::new(Reference::User),
        };
        assert!(matches!(
            join(entries, &references),
            Err(InvoiceError::MissingReference { entry: 1, kind: Reference::Project, id: Some(10) })
        ));
    }

    #[test]
    fn distinct_ids_keep_first_seen_order() {
        let entries: Vec<TimeEntry> =
            serde_json::from_value(json!([entry(1, 11), entry(2, 10), entry(3, 11)])).unwrap();
        assert_eq!(distinct_project_ids(&entries), vec![11, 10]);
    }
}
