use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{InvoiceError, Reference};

// Response structs for the Toggl API

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TimeEntry {
    pub id: u64,
    #[serde(default)]
    pub pid: Option<u64>,
    pub wid: u64,
    pub uid: u64,
    pub duration: i64,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub description: Option<String>,
    pub start: String,
    #[serde(default)]
    pub stop: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub cid: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub wid: Option<u64>,
    #[serde(default)]
    pub billable: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Client {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub wid: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Workspace {
    pub id: u64,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: u64,
    #[serde(default, alias = "name")]
    pub fullname: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Single-resource endpoints (`/projects/{id}`, `/me`) wrap their payload.
#[derive(Serialize, Deserialize, Debug)]
pub struct DataEnvelope<T> {
    pub data: T,
}

/// Entities fetched for one run, keyed by their Toggl id.
#[derive(Debug, Clone)]
pub struct EntityIndex<T> {
    kind: Reference,
    items: HashMap<u64, T>,
}

impl<T> EntityIndex<T> {
    pub fn new(kind: Reference) -> Self {
        Self {
            kind,
            items: HashMap::new(),
        }
    }

    pub fn from_items<I, F>(kind: Reference, items: I, key: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> u64,
    {
        let mut index = Self::new(kind);
        for item in items {
            index.insert(key(&item), item);
        }
        index
    }

    pub fn insert(&mut self, id: u64, item: T) {
        self.items.insert(id, item);
    }

    /// Looks up `id` on behalf of time entry `entry`. An absent id or an id
    /// that was never fetched is a missing reference.
    pub fn resolve(&self, entry: u64, id: Option<u64>) -> Result<&T, InvoiceError> {
        id.and_then(|id| self.items.get(&id))
            .ok_or(InvoiceError::MissingReference {
                entry,
                kind: self.kind,
                id,
            })
    }
}
