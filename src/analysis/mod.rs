// Analysis pipeline: scan, classify, extract, relate, cache, query

pub mod cache;
pub mod classify;
pub mod entity;
pub mod graph;
pub mod query;
pub mod relations;
pub mod scan;

pub use cache::*;
pub use classify::*;
pub use entity::*;
pub use graph::*;
pub use query::*;
pub use relations::*;
pub use scan::*;
