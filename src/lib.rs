//! Surveyor - Map entity relationships in TypeScript and JavaScript codebases
//!
//! Scans a project, classifies each file into an architectural role,
//! extracts its primary class, derives inheritance, import, injection and
//! instantiation relationships, and serves the resulting graph from a
//! lazily rebuilt cache as JSON or Mermaid.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod watch;

// Re-export main types
pub use analysis::{
    Edge, FileSource, Node, NodeKind, ProjectCache, ProjectScanner, RebuildReport, RelationKind,
    RelationshipData, ScannedFile, SearchCriteria,
};
pub use config::Config;
pub use error::{Error, Result};
