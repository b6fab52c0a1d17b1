// File watching that keeps the cache honest
//
// Change events are debounced: a burst of saves becomes one refresh,
// triggered only after the project goes quiet for the debounce window.

use crate::analysis::cache::{ProjectCache, RebuildReport};
use crate::analysis::scan::FileSource;
use crate::error::Result;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Watch the source root and refresh the cache after change bursts
/// settle. Calls `on_refresh` with each rebuild's report. Blocks the
/// calling thread until the event channel closes.
pub fn watch_project<S, F>(
    cache: &ProjectCache<S>,
    extensions: &[String],
    debounce: Duration,
    mut on_refresh: F,
) -> Result<()>
where
    S: FileSource,
    F: FnMut(&RebuildReport),
{
    let (tx, rx) = mpsc::channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )?;

    let root = cache.source().root();
    watcher.watch(root, RecursiveMode::Recursive)?;
    info!("watching {}", root.display());

    let mut pending: Option<Instant> = None;
    loop {
        match rx.recv_timeout(debounce) {
            Ok(event) => {
                // Every relevant event restarts the quiet period
                if is_relevant(&event, extensions) {
                    pending = Some(Instant::now());
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let Some(last) = pending else { continue };
                if last.elapsed() < debounce {
                    continue;
                }
                pending = None;
                cache.invalidate();
                match cache.rebuild() {
                    Ok(report) => on_refresh(&report),
                    // The cache stays stale; the next burst retries
                    Err(e) => warn!("rebuild after change failed: {}", e),
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    Ok(())
}

/// Only create/modify/remove events touching analyzable files count
fn is_relevant(event: &Event, extensions: &[String]) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| matches_extension(path, extensions))
}

fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| {
            extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
        })
}
