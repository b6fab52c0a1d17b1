// Parser module for turning source text into syntax trees

mod javascript;

pub use javascript::{node_text, JsVariant, SourceParser};
