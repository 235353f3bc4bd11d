//! Auto-provisioning of referenced tags and projects.
//!
//! Capture flows call [`ensure_entities`] after an analysis is accepted.
//! Existing entity lists are passed in by the caller rather than read from
//! ambient state, so the adapter stays testable without any storage.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use futures::future::{join, join_all};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProjectName, TagName};

/// Errors surfaced by repository collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    /// The underlying store rejected or failed the operation.
    #[error("repository failure: {message}")]
    Storage { message: String },
}

impl RepoError {
    /// Wraps a storage-layer failure message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// A resolved tag: storage identifier plus canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Storage identifier.
    pub id: String,
    /// Name as stored; casing may differ from the capture that referenced it.
    pub name: String,
}

/// A resolved project: storage identifier plus canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Storage identifier.
    pub id: String,
    /// Name as stored; casing may differ from the capture that referenced it.
    pub name: String,
}

/// Lookup and creation of tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// All known tags.
    async fn list_tags(&self) -> Result<Vec<TagRef>, RepoError>;

    /// Creates a tag, returning the stored row.
    ///
    /// Implementations should treat a case-insensitive name collision as a
    /// lookup, so racing duplicate creates converge on one entity.
    async fn create_tag(&self, name: &str) -> Result<TagRef, RepoError>;
}

/// Lookup and creation of projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// All known projects.
    async fn list_projects(&self) -> Result<Vec<ProjectRef>, RepoError>;

    /// Creates a project, returning the stored row.
    ///
    /// Same collision expectations as [`TagRepository::create_tag`].
    async fn create_project(&self, name: &str) -> Result<ProjectRef, RepoError>;
}

/// The entity lists to resolve against, fetched by the caller.
#[derive(Debug, Clone, Default)]
pub struct ExistingEntities {
    /// Known tags.
    pub tags: Vec<TagRef>,
    /// Known projects.
    pub projects: Vec<ProjectRef>,
}

/// Which side of the capture an entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    /// A `#tag`.
    Tag,
    /// A `+project`.
    Project,
}

/// One failed create, kept local to its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionFailure {
    /// Tag or project.
    pub kind: EntityKind,
    /// The name that could not be created.
    pub name: String,
    /// What the repository reported.
    pub error: RepoError,
}

/// What provisioning resolved, and what it could not.
#[derive(Debug, Clone, Default)]
pub struct ProvisionOutcome {
    /// Resolved tags in first-seen input order.
    pub tag_refs: Vec<TagRef>,
    /// Resolved projects in first-seen input order.
    pub project_refs: Vec<ProjectRef>,
    /// Creates that failed. Never aborts the rest of the capture.
    pub failures: Vec<ProvisionFailure>,
}

/// Resolves extracted names against existing entities, creating the missing
/// ones.
///
/// Name resolution is case-insensitive. Each distinct unresolved name gets
/// exactly one create, and creates run concurrently. An individual failure
/// is logged, recorded in [`ProvisionOutcome::failures`], and skipped; it
/// never aborts the other names or the capture.
pub async fn ensure_entities(
    tags: &[TagName],
    projects: &[ProjectName],
    existing: &ExistingEntities,
    tag_repo: &dyn TagRepository,
    project_repo: &dyn ProjectRepository,
) -> ProvisionOutcome {
    let mut resolved_tags: HashMap<String, TagRef> = existing
        .tags
        .iter()
        .map(|tag| (tag.name.to_lowercase(), tag.clone()))
        .collect();
    let mut resolved_projects: HashMap<String, ProjectRef> = existing
        .projects
        .iter()
        .map(|project| (project.name.to_lowercase(), project.clone()))
        .collect();

    let mut missing_tags: Vec<&TagName> = Vec::new();
    let mut seen = HashSet::new();
    for name in tags {
        let key = name.as_str().to_lowercase();
        if !resolved_tags.contains_key(&key) && seen.insert(key) {
            missing_tags.push(name);
        }
    }

    let mut missing_projects: Vec<&ProjectName> = Vec::new();
    let mut seen = HashSet::new();
    for name in projects {
        let key = name.as_str().to_lowercase();
        if !resolved_projects.contains_key(&key) && seen.insert(key) {
            missing_projects.push(name);
        }
    }

    let (tag_results, project_results) = join(
        join_all(
            missing_tags
                .iter()
                .map(|name| tag_repo.create_tag(name.as_str())),
        ),
        join_all(
            missing_projects
                .iter()
                .map(|name| project_repo.create_project(name.as_str())),
        ),
    )
    .await;

    let mut failures = Vec::new();

    for (name, result) in missing_tags.iter().zip(tag_results) {
        match result {
            Ok(tag_ref) => {
                resolved_tags.insert(name.as_str().to_lowercase(), tag_ref);
            }
            Err(error) => {
                tracing::warn!(name = %name, error = %error, "failed to create tag");
                failures.push(ProvisionFailure {
                    kind: EntityKind::Tag,
                    name: name.as_str().to_string(),
                    error,
                });
            }
        }
    }

    for (name, result) in missing_projects.iter().zip(project_results) {
        match result {
            Ok(project_ref) => {
                resolved_projects.insert(name.as_str().to_lowercase(), project_ref);
            }
            Err(error) => {
                tracing::warn!(name = %name, error = %error, "failed to create project");
                failures.push(ProvisionFailure {
                    kind: EntityKind::Project,
                    name: name.as_str().to_string(),
                    error,
                });
            }
        }
    }

    let mut tag_refs = Vec::new();
    let mut seen = HashSet::new();
    for name in tags {
        let key = name.as_str().to_lowercase();
        if seen.insert(key.clone()) {
            if let Some(tag_ref) = resolved_tags.get(&key) {
                tag_refs.push(tag_ref.clone());
            }
        }
    }

    let mut project_refs = Vec::new();
    let mut seen = HashSet::new();
    for name in projects {
        let key = name.as_str().to_lowercase();
        if seen.insert(key.clone()) {
            if let Some(project_ref) = resolved_projects.get(&key) {
                project_refs.push(project_ref.clone());
            }
        }
    }

    ProvisionOutcome {
        tag_refs,
        project_refs,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// In-memory repository that records creates and can be told to fail
    /// for specific names.
    #[derive(Default)]
    struct MockRepo {
        created: Mutex<Vec<String>>,
        fail_names: Vec<String>,
        next_id: AtomicUsize,
    }

    impl MockRepo {
        fn failing(names: &[&str]) -> Self {
            Self {
                fail_names: names.iter().map(ToString::to_string).collect(),
                ..Self::default()
            }
        }

        fn created(&self) -> Vec<String> {
            self.created.lock().unwrap().clone()
        }

        fn create(&self, prefix: &str, name: &str) -> Result<(String, String), RepoError> {
            if self.fail_names.iter().any(|n| n == name) {
                return Err(RepoError::storage("disk full"));
            }
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.created.lock().unwrap().push(name.to_string());
            Ok((format!("{prefix}-{id}"), name.to_string()))
        }
    }

    #[async_trait]
    impl TagRepository for MockRepo {
        async fn list_tags(&self) -> Result<Vec<TagRef>, RepoError> {
            Ok(Vec::new())
        }

        async fn create_tag(&self, name: &str) -> Result<TagRef, RepoError> {
            let (id, name) = self.create("tag", name)?;
            Ok(TagRef { id, name })
        }
    }

    #[async_trait]
    impl ProjectRepository for MockRepo {
        async fn list_projects(&self) -> Result<Vec<ProjectRef>, RepoError> {
            Ok(Vec::new())
        }

        async fn create_project(&self, name: &str) -> Result<ProjectRef, RepoError> {
            let (id, name) = self.create("project", name)?;
            Ok(ProjectRef { id, name })
        }
    }

    fn tag_names(names: &[&str]) -> Vec<TagName> {
        names.iter().map(|n| TagName::new(*n).unwrap()).collect()
    }

    fn project_names(names: &[&str]) -> Vec<ProjectName> {
        names.iter().map(|n| ProjectName::new(*n).unwrap()).collect()
    }

    #[tokio::test]
    async fn existing_names_resolve_without_creates() {
        let repo = MockRepo::default();
        let existing = ExistingEntities {
            tags: vec![TagRef {
                id: "tag-9".to_string(),
                name: "work".to_string(),
            }],
            projects: Vec::new(),
        };

        let outcome =
            ensure_entities(&tag_names(&["Work"]), &[], &existing, &repo, &repo).await;

        assert!(repo.created().is_empty());
        assert_eq!(outcome.tag_refs.len(), 1);
        assert_eq!(outcome.tag_refs[0].id, "tag-9");
        assert_eq!(outcome.tag_refs[0].name, "work");
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn missing_names_are_created_in_first_seen_order() {
        let repo = MockRepo::default();
        let existing = ExistingEntities::default();

        let outcome = ensure_entities(
            &tag_names(&["alpha", "beta"]),
            &project_names(&["Health"]),
            &existing,
            &repo,
            &repo,
        )
        .await;

        assert_eq!(outcome.tag_refs.len(), 2);
        assert_eq!(outcome.tag_refs[0].name, "alpha");
        assert_eq!(outcome.tag_refs[1].name, "beta");
        assert_eq!(outcome.project_refs.len(), 1);
        assert_eq!(outcome.project_refs[0].name, "Health");
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn duplicate_names_get_a_single_create() {
        let repo = MockRepo::default();
        let existing = ExistingEntities::default();

        let outcome = ensure_entities(
            &tag_names(&["Focus", "FOCUS", "focus"]),
            &[],
            &existing,
            &repo,
            &repo,
        )
        .await;

        assert_eq!(repo.created(), vec!["Focus".to_string()]);
        assert_eq!(outcome.tag_refs.len(), 1);
        assert_eq!(outcome.tag_refs[0].name, "Focus");
    }

    #[tokio::test]
    async fn a_failed_create_does_not_abort_the_rest() {
        let repo = MockRepo::failing(&["beta"]);
        let existing = ExistingEntities::default();

        let outcome = ensure_entities(
            &tag_names(&["alpha", "beta", "gamma"]),
            &project_names(&["Health"]),
            &existing,
            &repo,
            &repo,
        )
        .await;

        assert_eq!(outcome.tag_refs.len(), 2);
        assert_eq!(outcome.tag_refs[0].name, "alpha");
        assert_eq!(outcome.tag_refs[1].name, "gamma");
        assert_eq!(outcome.project_refs.len(), 1);

        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.kind, EntityKind::Tag);
        assert_eq!(failure.name, "beta");
        assert_eq!(failure.error, RepoError::storage("disk full"));
    }

    #[tokio::test]
    async fn failures_report_their_entity_kind() {
        let repo = MockRepo::failing(&["Health"]);
        let existing = ExistingEntities::default();

        let outcome = ensure_entities(
            &[],
            &project_names(&["Health"]),
            &existing,
            &repo,
            &repo,
        )
        .await;

        assert!(outcome.project_refs.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, EntityKind::Project);
    }
}
