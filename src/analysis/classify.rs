// File role classification from path heuristics

use crate::analysis::graph::NodeKind;
use std::path::Path;

/// Kinds with a path heuristic, in match precedence order
const CLASSIFIED_KINDS: [NodeKind; 5] = [
    NodeKind::Model,
    NodeKind::Repository,
    NodeKind::Service,
    NodeKind::Controller,
    NodeKind::Middleware,
];

/// Classify a source file into an entity kind from its path alone.
///
/// A file matches a kind when it sits under a directory named exactly
/// after the kind word, or when its file name ends with the kind word
/// preceded by at least one other character (`UserService.ts`, but not
/// `service.ts`). Matching is case-insensitive; the first kind in
/// precedence order wins.
pub fn classify(path: &Path) -> NodeKind {
    let normalized = path.to_string_lossy().replace('\\', "/").to_lowercase();

    for kind in CLASSIFIED_KINDS {
        let word = kind.as_str().to_lowercase();
        if has_dir_segment(&normalized, &word) || has_name_suffix(&normalized, &word) {
            return kind;
        }
    }

    NodeKind::Other
}

/// True when a directory segment equals `word`. The file name itself is
/// not a directory segment.
fn has_dir_segment(normalized: &str, word: &str) -> bool {
    normalized
        .split('/')
        .rev()
        .skip(1)
        .any(|segment| segment == word)
}

/// True when the file name ends with `word` plus a js/ts extension, with
/// a word character immediately before it.
fn has_name_suffix(normalized: &str, word: &str) -> bool {
    let name = normalized.rsplit('/').next().unwrap_or(normalized);
    let stem = match name.strip_suffix(".ts").or_else(|| name.strip_suffix(".js")) {
        Some(stem) => stem,
        None => return false,
    };
    match stem.strip_suffix(word) {
        Some(prefix) => prefix
            .chars()
            .next_back()
            .map_or(false, |c| c.is_ascii_alphanumeric() || c == '_'),
        None => false,
    }
}
