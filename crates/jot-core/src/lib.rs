//! Capture parsing and classification for jot.
//!
//! This crate is the pure engine behind quick capture:
//! - Tokenizing capture text with quote-aware splitting
//! - Classifying `#tag` / `+project` markers and their edge clusters
//! - Extracting metadata and cleaning the remaining content
//! - Suggesting an item kind through a priority-ordered rule engine
//! - Resolving and auto-creating the tags and projects a capture references

mod bookmark;
mod cluster;
mod engine;
mod gate;
mod marker;
mod parse;
mod provision;
pub mod rules;
pub mod token;
pub mod types;

pub use bookmark::{BOOKMARK_TAG, augment_bookmark, contains_url, is_bare_url};
pub use cluster::{Cluster, find_valid_clusters, marker_runs};
pub use engine::{AnalysisResult, DetailedAnalysis, Engine};
pub use gate::{RequestGate, RequestTicket};
pub use marker::{MarkerKind, classify_token, display_project, display_tag};
pub use parse::{ParseResult, parse};
pub use provision::{
    EntityKind, ExistingEntities, ProjectRef, ProjectRepository, ProvisionFailure,
    ProvisionOutcome, RepoError, TagRef, TagRepository, ensure_entities,
};
