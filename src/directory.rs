use crate::error::{AccessDeniedReason, PlatformError};
use crate::resolver::EntityReference;
use crate::types::{EntityId, EntityMetadata, MemberProfile};
use anyhow::Context;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Lazy, finite, non-restartable sequence of members.
pub type MemberStream<'a> = BoxStream<'a, Result<MemberProfile, PlatformError>>;

/// The chat platform as seen by the scanner: entity lookup plus paginated roster enumeration.
///
/// Implementations own their transport, pagination and request pacing. Failures are
/// reported as [`PlatformError`] and never retried by the caller.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn lookup_entity(
        &self,
        reference: &EntityReference,
    ) -> Result<EntityMetadata, PlatformError>;

    /// Enumerate at most `cap` members of `entity`.
    fn iterate_members(&self, entity: EntityId, cap: usize) -> MemberStream<'_>;
}

/// One group or channel inside a [`RosterSnapshot`].
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SnapshotEntity {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub invite: Option<String>,
    /// Falls back to the number of exported members.
    #[serde(default)]
    pub reported_total: Option<u64>,
    #[serde(default)]
    pub hidden_roster: bool,
    #[serde(default)]
    pub members: Vec<MemberProfile>,
}

impl SnapshotEntity {
    fn matches(&self, reference: &EntityReference) -> bool {
        let wanted = reference.as_str();
        self.username
            .as_deref()
            .is_some_and(|u| u.eq_ignore_ascii_case(wanted))
            || self.invite.as_deref() == Some(wanted)
            || reference.as_numeric() == Some(self.id.0)
    }

    fn metadata(&self) -> EntityMetadata {
        EntityMetadata {
            id: self.id,
            display_name: self.title.clone(),
            reported_total: self
                .reported_total
                .unwrap_or(self.members.len() as u64),
        }
    }
}

/// Offline directory backed by an exported roster (JSON).
///
/// ```json
/// {"entities": [{"id": -1001, "title": "Rust", "username": "rustlang",
///                "members": [{"has_photo": true, "first_name": "Anna"}]}]}
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RosterSnapshot {
    pub entities: Vec<SnapshotEntity>,
}

impl RosterSnapshot {
    pub fn new(entities: Vec<SnapshotEntity>) -> Self {
        Self { entities }
    }

    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        serde_json::from_str(s).context("invalid roster snapshot JSON")
    }

    /// Load a snapshot from a file path. Errors if the file cannot be read or parsed.
    pub fn load_from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("failed to read roster snapshot: {}", path.as_ref().display())
        })?;
        Self::from_json_str(&content)
    }

    fn by_id(&self, id: EntityId) -> Option<&SnapshotEntity> {
        self.entities.iter().find(|e| e.id == id)
    }
}

#[async_trait]
impl MemberDirectory for RosterSnapshot {
    async fn lookup_entity(
        &self,
        reference: &EntityReference,
    ) -> Result<EntityMetadata, PlatformError> {
        self.entities
            .iter()
            .find(|e| e.matches(reference))
            .map(SnapshotEntity::metadata)
            .ok_or_else(|| PlatformError::NotFound(reference.to_string()))
    }

    fn iterate_members(&self, entity: EntityId, cap: usize) -> MemberStream<'_> {
        match self.by_id(entity) {
            None => stream::once(async move {
                Err::<MemberProfile, _>(PlatformError::NotFound(entity.to_string()))
            })
            .boxed(),
            Some(e) if e.hidden_roster => stream::once(async {
                Err::<MemberProfile, _>(PlatformError::AccessDenied(
                    AccessDeniedReason::PrivateRoster,
                ))
            })
            .boxed(),
            Some(e) => {
                debug!(
                    entity = %entity,
                    exported = e.members.len(),
                    cap,
                    "enumerating snapshot roster"
                );
                stream::iter(e.members.iter().take(cap).cloned().map(Ok)).boxed()
            }
        }
    }
}
