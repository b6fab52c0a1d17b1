// Cached analysis snapshot with lazy rebuild
//
// The snapshot is replaced wholesale by a rebuild and never mutated in
// place. Readers only ever answer from a completed snapshot; rebuilds
// serialize on their own mutex so concurrent first queries coalesce
// onto one scan.

use crate::analysis::entity::EntityExtractor;
use crate::analysis::graph::{Edge, Node, NodeMap, RelationshipData};
use crate::analysis::query::{run_query, SearchCriteria};
use crate::analysis::relations::RelationshipExtractor;
use crate::analysis::scan::{FileSource, ScannedFile};
use crate::error::{Error, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct Snapshot {
    nodes: NodeMap,
    edges: Vec<Edge>,
    initialized: bool,
}

/// What a full analysis pass produced.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    pub files_scanned: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Files that failed to parse, keyed by path. These are skipped,
    /// not fatal.
    pub parse_errors: HashMap<PathBuf, String>,
}

pub struct ProjectCache<S: FileSource> {
    source: S,
    snapshot: RwLock<Snapshot>,
    rebuild_lock: Mutex<()>,
}

impl<S: FileSource> ProjectCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            snapshot: RwLock::new(Snapshot::default()),
            rebuild_lock: Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run `criteria` against the snapshot, building it first if needed.
    pub fn query(&self, criteria: &SearchCriteria) -> Result<RelationshipData> {
        let snapshot = self.initialized_snapshot()?;
        Ok(run_query(&snapshot.nodes, &snapshot.edges, criteria))
    }

    /// Every edge in the snapshot, in extraction order.
    pub fn edges(&self) -> Result<Vec<Edge>> {
        Ok(self.initialized_snapshot()?.edges.clone())
    }

    /// Look up one node by its `<Kind>-<Name>` id.
    pub fn node_by_id(&self, id: &str) -> Result<Option<Node>> {
        Ok(self.initialized_snapshot()?.nodes.get(id).cloned())
    }

    /// Discard the snapshot. Cheap and idempotent; the next query pays
    /// for the rebuild.
    pub fn invalidate(&self) {
        let mut snapshot = self.write_snapshot();
        snapshot.nodes.clear();
        snapshot.edges.clear();
        snapshot.initialized = false;
        debug!("cache invalidated");
    }

    /// Rebuild unconditionally, replacing whatever the snapshot held.
    pub fn rebuild(&self) -> Result<RebuildReport> {
        let _guard = self.lock_rebuild();
        self.rebuild_locked()
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.read_snapshot().initialized {
            return Ok(());
        }
        let _guard = self.lock_rebuild();
        // Another query may have rebuilt while we waited for the lock
        if self.read_snapshot().initialized {
            return Ok(());
        }
        self.rebuild_locked()?;
        Ok(())
    }

    /// Read view of a completed snapshot, rebuilding first when needed.
    /// An invalidation can land between the rebuild and the read, so
    /// the view is checked under its own guard and the rebuild retried
    /// until one holds.
    fn initialized_snapshot(&self) -> Result<RwLockReadGuard<'_, Snapshot>> {
        loop {
            self.ensure_initialized()?;
            let snapshot = self.read_snapshot();
            if snapshot.initialized {
                return Ok(snapshot);
            }
        }
    }

    fn rebuild_locked(&self) -> Result<RebuildReport> {
        let files = self
            .source
            .files()
            .map_err(|e| Error::rebuild(format!("file scan failed: {}", e)))?;
        let root = self.source.root().to_path_buf();

        // Phase one: every node must exist before any relationship
        // pass runs, so forward references resolve
        let node_results: Vec<Result<Node>> = files
            .par_iter()
            .map_init(EntityExtractor::new, |extractor, file| {
                match extractor.as_mut() {
                    Ok(ex) => ex.extract(&file.path, &file.content, &root),
                    Err(e) => Err(Error::parser(e.to_string())),
                }
            })
            .collect();

        let mut parse_errors = HashMap::new();
        let nodes = collect_nodes(&files, node_results, &mut parse_errors)?;

        // Phase two: edges against the complete node set. Files whose
        // node lost its id naturally contribute nothing.
        let edge_results: Vec<Result<Vec<Edge>>> = files
            .par_iter()
            .map_init(RelationshipExtractor::new, |extractor, file| {
                match extractor.as_mut() {
                    Ok(ex) => ex.extract(&file.path, &file.content, &nodes),
                    Err(e) => Err(Error::parser(e.to_string())),
                }
            })
            .collect();

        let edges = collect_edges(&files, edge_results, &mut parse_errors)?;

        let report = RebuildReport {
            files_scanned: files.len(),
            nodes: nodes.len(),
            edges: edges.len(),
            parse_errors,
        };
        debug!(
            "rebuilt cache: {} files, {} nodes, {} edges",
            report.files_scanned, report.nodes, report.edges
        );

        let mut snapshot = self.write_snapshot();
        snapshot.nodes = nodes;
        snapshot.edges = edges;
        snapshot.initialized = true;
        Ok(report)
    }

    // Lock poisoning only happens if a panic hit mid-write; the data is
    // still a coherent snapshot, so recover rather than unwind
    fn read_snapshot(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_snapshot(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot.write().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_rebuild(&self) -> MutexGuard<'_, ()> {
        self.rebuild_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Fold phase-one results into the node map, recording per-file parse
/// failures. A `Parser` error means an extractor constructor failed,
/// which is not tied to any one file; that fails the whole rebuild.
fn collect_nodes(
    files: &[ScannedFile],
    results: Vec<Result<Node>>,
    parse_errors: &mut HashMap<PathBuf, String>,
) -> Result<NodeMap> {
    let mut nodes = NodeMap::new();
    for (file, result) in files.iter().zip(results) {
        match result {
            // Last write wins when two files share an id
            Ok(node) => {
                nodes.insert(node.id.clone(), node);
            }
            Err(Error::Parser(message)) => {
                return Err(Error::rebuild(format!("extractor setup failed: {}", message)));
            }
            Err(e) => {
                warn!("skipping {}: {}", file.path.display(), e);
                parse_errors.insert(file.path.clone(), e.to_string());
            }
        }
    }
    Ok(nodes)
}

fn collect_edges(
    files: &[ScannedFile],
    results: Vec<Result<Vec<Edge>>>,
    parse_errors: &mut HashMap<PathBuf, String>,
) -> Result<Vec<Edge>> {
    let mut edges = Vec::new();
    for (file, result) in files.iter().zip(results) {
        match result {
            Ok(mut found) => edges.append(&mut found),
            Err(Error::Parser(message)) => {
                return Err(Error::rebuild(format!("extractor setup failed: {}", message)));
            }
            Err(e) => {
                warn!("no relationships from {}: {}", file.path.display(), e);
                parse_errors
                    .entry(file.path.clone())
                    .or_insert_with(|| e.to_string());
            }
        }
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    struct StaticSource {
        root: PathBuf,
        files: Mutex<Vec<ScannedFile>>,
        scans: AtomicUsize,
    }

    impl StaticSource {
        fn new(files: &[(&str, &str)]) -> Self {
            Self {
                root: PathBuf::from("/project"),
                files: Mutex::new(
                    files
                        .iter()
                        .map(|(path, content)| ScannedFile {
                            path: PathBuf::from(path),
                            content: content.to_string(),
                        })
                        .collect(),
                ),
                scans: AtomicUsize::new(0),
            }
        }

        fn push(&self, path: &str, content: &str) {
            self.files.lock().unwrap().push(ScannedFile {
                path: PathBuf::from(path),
                content: content.to_string(),
            });
        }

        fn scan_count(&self) -> usize {
            self.scans.load(Ordering::SeqCst)
        }
    }

    impl FileSource for StaticSource {
        fn root(&self) -> &Path {
            &self.root
        }

        fn files(&self) -> Result<Vec<ScannedFile>> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            Ok(self.files.lock().unwrap().clone())
        }
    }

    struct FlakySource {
        inner: StaticSource,
        fail_next: AtomicBool,
    }

    impl FileSource for FlakySource {
        fn root(&self) -> &Path {
            self.inner.root()
        }

        fn files(&self) -> Result<Vec<ScannedFile>> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(Error::other("disk went away"));
            }
            self.inner.files()
        }
    }

    fn project() -> StaticSource {
        StaticSource::new(&[
            (
                "/project/src/controllers/UserController.ts",
                r#"
import { UserService } from "../services/UserService";

export class UserController {
  constructor(private userService: UserService) {}

  index() {
    return this.userService.find();
  }
}
"#,
            ),
            (
                "/project/src/services/UserService.ts",
                r#"
export class UserService {
  find() {
    return [];
  }
}
"#,
            ),
        ])
    }

    #[test]
    fn test_first_query_builds_lazily() {
        let cache = ProjectCache::new(project());
        assert_eq!(cache.source().scan_count(), 0);

        let data = cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(cache.source().scan_count(), 1);
        assert_eq!(data.nodes.len(), 2);
        // injection plus import between the same pair
        assert_eq!(data.edges.len(), 2);

        cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(cache.source().scan_count(), 1);
    }

    #[test]
    fn test_forward_reference_resolves() {
        // The controller file is analyzed before the service exists as
        // a node; the two-phase rebuild still finds the edge
        let cache = ProjectCache::new(project());
        let edges = cache.edges().unwrap();
        assert!(edges
            .iter()
            .any(|e| e.source == "Controller-UserController" && e.target == "Service-UserService"));
    }

    #[test]
    fn test_invalidate_forces_rescan() {
        let source = project();
        let cache = ProjectCache::new(source);
        cache.query(&SearchCriteria::all()).unwrap();

        cache.source().push(
            "/project/src/repositories/UserRepository.ts",
            "export class UserRepository {}\n",
        );
        // Not visible until invalidated
        let data = cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(data.nodes.len(), 2);

        cache.invalidate();
        let data = cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(cache.source().scan_count(), 2);
        assert_eq!(data.nodes.len(), 3);
    }

    #[test]
    fn test_invalidate_is_idempotent() {
        let cache = ProjectCache::new(project());
        cache.query(&SearchCriteria::all()).unwrap();

        cache.invalidate();
        cache.invalidate();
        cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(cache.source().scan_count(), 2);
    }

    #[test]
    fn test_concurrent_first_queries_coalesce() {
        let cache = ProjectCache::new(project());
        thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let data = cache.query(&SearchCriteria::all()).unwrap();
                    assert_eq!(data.nodes.len(), 2);
                });
            }
        });
        assert_eq!(cache.source().scan_count(), 1);
    }

    #[test]
    fn test_reads_racing_invalidation_see_completed_snapshots() {
        // Every completed snapshot of this project holds both nodes
        // and both edges, so no read may ever answer from the cleared
        // interim state
        let cache = ProjectCache::new(project());
        let done = AtomicBool::new(false);
        let mut incomplete_reads = 0;

        thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    cache.invalidate();
                }
            });

            for i in 0..300 {
                let complete = match i % 3 {
                    0 => cache.node_by_id("Service-UserService").unwrap().is_some(),
                    1 => cache.query(&SearchCriteria::all()).unwrap().nodes.len() == 2,
                    _ => cache.edges().unwrap().len() == 2,
                };
                if !complete {
                    incomplete_reads += 1;
                }
            }
            done.store(true, Ordering::SeqCst);
        });

        assert_eq!(incomplete_reads, 0, "a read answered from a cleared snapshot");
    }

    #[test]
    fn test_id_collision_last_write_wins() {
        let cache = ProjectCache::new(StaticSource::new(&[
            (
                "/project/src/a/UserService.ts",
                "export class UserService {\n  first() {}\n}\n",
            ),
            (
                "/project/src/b/UserService.ts",
                "export class UserService {\n  second() {}\n}\n",
            ),
        ]));

        let data = cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(data.nodes.len(), 1);
        assert_eq!(data.nodes[0].methods, vec!["second"]);
        assert!(data.nodes[0].file_path.ends_with("b/UserService.ts"));
    }

    #[test]
    fn test_parse_failure_is_isolated() {
        let cache = ProjectCache::new(StaticSource::new(&[
            ("/project/src/notes.txt", "not source code"),
            ("/project/src/services/UserService.ts", "export class UserService {}\n"),
        ]));

        let report = cache.rebuild().unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.nodes, 1);
        assert_eq!(report.parse_errors.len(), 1);
        assert!(report
            .parse_errors
            .contains_key(Path::new("/project/src/notes.txt")));
    }

    #[test]
    fn test_failed_rebuild_leaves_cache_stale() {
        let cache = ProjectCache::new(FlakySource {
            inner: project(),
            fail_next: AtomicBool::new(true),
        });

        assert!(cache.query(&SearchCriteria::all()).is_err());
        // The failure did not mark the cache initialized
        let data = cache.query(&SearchCriteria::all()).unwrap();
        assert_eq!(data.nodes.len(), 2);
    }

    #[test]
    fn test_setup_failure_rejects_rebuild() {
        // An extractor constructor failing surfaces as a rebuild
        // error, not as a parse error charged to every file
        let files = vec![ScannedFile {
            path: PathBuf::from("/project/src/a.ts"),
            content: "export class A {}".to_string(),
        }];
        let mut parse_errors = HashMap::new();

        let nodes = collect_nodes(
            &files,
            vec![Err(Error::parser("language version mismatch"))],
            &mut parse_errors,
        );
        assert!(matches!(nodes, Err(Error::Rebuild(_))));

        let edges = collect_edges(
            &files,
            vec![Err(Error::parser("language version mismatch"))],
            &mut parse_errors,
        );
        assert!(matches!(edges, Err(Error::Rebuild(_))));
        assert!(parse_errors.is_empty());
    }

    #[test]
    fn test_rebuild_report_counts() {
        let cache = ProjectCache::new(project());
        let report = cache.rebuild().unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.nodes, 2);
        assert_eq!(report.edges, 2);
        assert!(report.parse_errors.is_empty());
    }

    #[test]
    fn test_node_lookup_by_id() {
        let cache = ProjectCache::new(project());
        let node = cache.node_by_id("Service-UserService").unwrap();
        assert_eq!(node.unwrap().name, "UserService");
        assert!(cache.node_by_id("Service-Nothing").unwrap().is_none());
    }
}
