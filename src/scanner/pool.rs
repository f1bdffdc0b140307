//! Worker pool.
//!
//! Tasks are pushed onto a shared queue and drained by a fixed number of
//! blocking workers. Each processed task reports back through a channel,
//! tagged with its queue position so the caller sees outcomes in task order
//! no matter how the workers interleave.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::join_all;
use tokio::sync::mpsc;

use super::ScanTask;
use crate::database::VulnerabilityDatabase;
use crate::error::{ParseError, ScanError, ScanErrors};
use crate::model::InfectedPackage;
use crate::parser::{parser_for_file_name, LockfileParser};

/// Lower bound on the number of workers.
pub const MIN_WORKERS: usize = 4;

/// Findings of one processed lockfile.
///
/// A lockfile that failed to parse still produces a finding, with no packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFinding {
    pub dir: PathBuf,
    pub lockfile: String,
    pub packages: Vec<InfectedPackage>,
}

type TaskQueue = Mutex<VecDeque<(usize, ScanTask)>>;

struct TaskOutcome {
    task: ScanTask,
    result: Result<Vec<InfectedPackage>, ParseError>,
}

/// Number of workers: available parallelism, but never fewer than [`MIN_WORKERS`].
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
        .max(MIN_WORKERS)
}

/// Parses every task and returns one finding per processed task, in task order.
///
/// Parse failures are returned as errors and do not affect other tasks.
/// Tasks naming an unknown lockfile are dropped.
pub async fn execute(
    tasks: Vec<ScanTask>,
    db: Arc<VulnerabilityDatabase>,
) -> (Vec<TaskFinding>, ScanErrors) {
    let mut errors = ScanErrors::new();
    if tasks.is_empty() {
        return (Vec::new(), errors);
    }

    let workers = worker_count();
    tracing::debug!(tasks = tasks.len(), workers, "starting scan workers");

    let queue: Arc<TaskQueue> = Arc::new(Mutex::new(tasks.into_iter().enumerate().collect()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let queue = Arc::clone(&queue);
            let db = Arc::clone(&db);
            let tx = tx.clone();
            tokio::task::spawn_blocking(move || run_worker(worker, &queue, &db, &tx))
        })
        .collect();
    drop(tx);

    for joined in join_all(handles).await {
        if let Err(err) = joined {
            tracing::warn!(error = %err, "scan worker did not finish");
            errors.push(ScanError::Worker(err.to_string()));
        }
    }

    let mut outcomes = Vec::new();
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    outcomes.sort_by_key(|(index, _)| *index);

    let findings = outcomes
        .into_iter()
        .map(|(_, outcome)| {
            let packages = match outcome.result {
                Ok(packages) => packages,
                Err(source) => {
                    let path = outcome.task.path();
                    tracing::warn!(path = %path.display(), error = %source, "failed to parse lockfile");
                    errors.push(ScanError::Parse { path, source });
                    Vec::new()
                }
            };

            TaskFinding {
                dir: outcome.task.dir,
                lockfile: outcome.task.lockfile,
                packages,
            }
        })
        .collect();

    (findings, errors)
}

fn run_worker(
    worker: usize,
    queue: &TaskQueue,
    db: &VulnerabilityDatabase,
    tx: &mpsc::UnboundedSender<(usize, TaskOutcome)>,
) {
    loop {
        let next = queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        let Some((index, task)) = next else {
            break;
        };

        let Some(parser) = parser_for_file_name(&task.lockfile) else {
            tracing::debug!(lockfile = %task.lockfile, "no parser registered, dropping task");
            continue;
        };

        let path = task.path();
        tracing::debug!(worker, path = %path.display(), parser = parser.name(), "parsing lockfile");
        let result = parse_guarded(&*parser, &path, db);

        // The receiver outlives every worker.
        let _ = tx.send((index, TaskOutcome { task, result }));
    }
}

/// Runs one parser, turning a panic into a parse error for that lockfile so
/// its project is still reported.
fn parse_guarded(
    parser: &dyn LockfileParser,
    path: &Path,
    db: &VulnerabilityDatabase,
) -> Result<Vec<InfectedPackage>, ParseError> {
    panic::catch_unwind(AssertUnwindSafe(|| parser.parse(path, db))).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(ParseError::Panic(message))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn db() -> Arc<VulnerabilityDatabase> {
        Arc::new("test-package:1.0.0".parse().unwrap())
    }

    #[test]
    fn test_worker_count_floor() {
        assert!(worker_count() >= MIN_WORKERS);
    }

    #[tokio::test]
    async fn test_execute_empty() {
        let (findings, errors) = execute(Vec::new(), db()).await;
        assert!(findings.is_empty());
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_execute_keeps_task_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut tasks = Vec::new();
        for i in 0..20 {
            let project = dir.path().join(format!("p{:02}", i));
            fs::create_dir(&project).unwrap();
            fs::write(project.join("yarn.lock"), "test-package@^1.0.0:\n  version \"1.0.0\"\n").unwrap();
            tasks.push(ScanTask::new(project, "yarn.lock"));
        }

        let (findings, errors) = execute(tasks.clone(), db()).await;

        assert!(errors.is_empty());
        let dirs: Vec<_> = findings.iter().map(|f| f.dir.clone()).collect();
        let expected: Vec<_> = tasks.iter().map(|t| t.dir.clone()).collect();
        assert_eq!(dirs, expected);
        assert!(findings.iter().all(|f| f.packages.len() == 1));
    }

    #[tokio::test]
    async fn test_parse_error_still_yields_finding() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package-lock.json"), "{ not json").unwrap();
        fs::write(dir.path().join("yarn.lock"), "test-package@^1.0.0:\n  version \"1.0.0\"\n").unwrap();

        let tasks = vec![
            ScanTask::new(dir.path(), "package-lock.json"),
            ScanTask::new(dir.path(), "yarn.lock"),
        ];
        let (findings, errors) = execute(tasks, db()).await;

        assert_eq!(findings.len(), 2);
        assert!(findings[0].packages.is_empty());
        assert_eq!(findings[1].packages.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors.iter().next(),
            Some(ScanError::Parse {
                source: ParseError::Json(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_unknown_lockfile_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.lock"), "").unwrap();

        let tasks = vec![ScanTask::new(dir.path(), "Cargo.lock")];
        let (findings, errors) = execute(tasks, db()).await;

        assert!(findings.is_empty());
        assert!(errors.is_empty());
    }

    struct PanickingParser;

    impl LockfileParser for PanickingParser {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn kind(&self) -> crate::model::LockfileKind {
            crate::model::LockfileKind::Yarn
        }

        fn parse_str(
            &self,
            _content: &str,
            _db: &VulnerabilityDatabase,
        ) -> Result<Vec<InfectedPackage>, ParseError> {
            panic!("unexpected lockfile layout")
        }
    }

    #[test]
    fn test_parser_panic_becomes_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yarn.lock");
        fs::write(&path, "").unwrap();

        let err = parse_guarded(&PanickingParser, &path, &db()).unwrap_err();
        match err {
            ParseError::Panic(message) => assert_eq!(message, "unexpected lockfile layout"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_lockfile_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let tasks = vec![ScanTask::new(dir.path(), "pnpm-lock.yaml")];

        let (findings, errors) = execute(tasks, db()).await;

        assert_eq!(findings.len(), 1);
        assert!(findings[0].packages.is_empty());
        assert!(errors.any_not_found());
    }
}
