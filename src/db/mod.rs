use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use log::{error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

mod helpers;
mod migrations;
pub mod repositories;

use migrations::run_migrations;

const WORKER_NAME: &str = "repflow-db";

type DbJob = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum WorkerMessage {
    Run(DbJob),
    Stop,
}

/// Owns the worker thread; stopping it waits for queued jobs to drain.
struct Worker {
    jobs: mpsc::Sender<WorkerMessage>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        let handle = match self.handle.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        if let Err(err) = self.jobs.send(WorkerMessage::Stop) {
            error!("could not ask the database worker to stop: {err}");
        }
        if let Err(err) = handle.join() {
            error!("database worker panicked: {err:?}");
        }
    }
}

/// Handle to the SQLite file holding the catalogue, templates, history and
/// records. Every statement runs on one dedicated thread, so async callers
/// never block on disk.
#[derive(Clone)]
pub struct Database {
    worker: Arc<Worker>,
    path: Arc<PathBuf>,
}

impl Database {
    /// Opens (or creates) the database at `path` and brings its schema up to
    /// date before returning.
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (jobs_tx, jobs_rx) = mpsc::channel::<WorkerMessage>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let worker_path = path.clone();

        let handle = thread::Builder::new()
            .name(WORKER_NAME.into())
            .spawn(move || {
                let mut conn = match open_connection(&worker_path) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    return;
                }
                serve(&mut conn, jobs_rx);
            })
            .context("failed to spawn the database worker")?;

        ready_rx
            .recv()
            .context("database worker stopped before it was ready")??;
        info!("database ready at {}", path.display());

        Ok(Self {
            worker: Arc::new(Worker {
                jobs: jobs_tx,
                handle: Mutex::new(Some(handle)),
            }),
            path: Arc::new(path),
        })
    }

    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Runs `job` on the worker thread and hands its result back.
    pub async fn execute<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let message = WorkerMessage::Run(Box::new(move |conn| {
            // The caller may have given up waiting; the result is simply dropped.
            let _ = reply_tx.send(job(conn));
        }));

        self.worker
            .jobs
            .send(message)
            .map_err(|_| anyhow!("database worker is no longer running"))?;
        reply_rx
            .await
            .map_err(|_| anyhow!("database worker dropped the request"))?
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite database {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("WAL journal unavailable, keeping the default: {err}");
    }
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    run_migrations(&mut conn).context("failed to run database migrations")?;
    Ok(conn)
}

fn serve(conn: &mut Connection, jobs: mpsc::Receiver<WorkerMessage>) {
    while let Ok(message) = jobs.recv() {
        match message {
            WorkerMessage::Run(job) => job(conn),
            WorkerMessage::Stop => break,
        }
    }
    info!("database worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn jobs_run_on_the_worker_thread() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("nested").join("repflow.db")).unwrap();

        let name = db
            .execute(|_| Ok(thread::current().name().map(str::to_owned)))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some(WORKER_NAME));
        assert!(db.path().exists());
    }

    #[tokio::test]
    async fn job_errors_reach_the_caller() {
        let dir = TempDir::new().unwrap();
        let db = Database::new(dir.path().join("repflow.db")).unwrap();

        let err = db
            .execute(|conn| {
                conn.execute("INSERT INTO missing_table VALUES (1)", [])?;
                Ok(())
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing_table"));
    }

    #[tokio::test]
    async fn reopening_keeps_the_schema_version() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("repflow.db");
        drop(Database::new(path.clone()).unwrap());

        let db = Database::new(path).unwrap();
        let version: i32 = db
            .execute(|conn| Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?))
            .await
            .unwrap();
        assert_eq!(version, 1);
    }
}
