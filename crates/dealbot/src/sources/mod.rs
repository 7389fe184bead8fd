//! Merges raw payloads from external property-data providers into one snapshot.

mod domain;
mod mapping;
mod merge;
mod normalizer;


pub use domain::{PayloadKind, Provider, ProviderPayload, SnapshotField, SourceError};
pub use merge::{MergeConfig, Provenance, Snapshot, SnapshotEntry, SnapshotMerger, SnapshotView};
