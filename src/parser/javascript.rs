// JavaScript/TypeScript parsing using tree-sitter

use crate::error::{Error, Result};
use std::path::Path;
use tree_sitter::{Node, Parser, Tree};

/// Supported source variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JsVariant {
    JavaScript,
    TypeScript,
}

impl JsVariant {
    /// Detect variant from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            _ => None,
        }
    }

    /// Detect variant from a file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Parser holding one tree-sitter instance per supported grammar
pub struct SourceParser {
    js_parser: Parser,
    ts_parser: Parser,
}

impl SourceParser {
    /// Create a new parser with both grammars loaded
    pub fn new() -> Result<Self> {
        let mut js_parser = Parser::new();
        let js_language = tree_sitter_javascript::language();
        js_parser
            .set_language(&js_language)
            .map_err(|e| Error::Parser(format!("Failed to set JavaScript language: {}", e)))?;

        let mut ts_parser = Parser::new();
        let ts_language = tree_sitter_typescript::language_typescript();
        ts_parser
            .set_language(&ts_language)
            .map_err(|e| Error::Parser(format!("Failed to set TypeScript language: {}", e)))?;

        Ok(Self {
            js_parser,
            ts_parser,
        })
    }

    /// Parse source text, choosing the grammar from the file extension
    pub fn parse(&mut self, path: &Path, source: &str) -> Result<Tree> {
        let variant = JsVariant::from_path(path)
            .ok_or_else(|| Error::parse(path, "unsupported file extension"))?;

        let parser = match variant {
            JsVariant::JavaScript => &mut self.js_parser,
            JsVariant::TypeScript => &mut self.ts_parser,
        };

        parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(path, "tree-sitter produced no tree"))
    }
}

/// Get text content of a node
pub fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    std::str::from_utf8(&source[node.byte_range()]).unwrap_or("")
}
