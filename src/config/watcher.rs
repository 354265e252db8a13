//! Configuration file watcher for hot reload.
//!
//! `ConfigWatcher` reloads the file on every change and sends each config
//! that loads and validates; `spawn_reloader` applies them to a logger
//! handle. A file that fails to load is logged and the current
//! configuration stays in effect.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::loader::load_config;
use crate::config::schema::Config;
use crate::logger::{field, Field, Logger, LoggerHandle};
use crate::sink::InitOptions;
use crate::trace::TracingAgent;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches a configuration file and sends every valid revision.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<Config>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<Config>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    match load_config(&path) {
                        Ok(config) => {
                            let _ = tx.send(config);
                        }
                        Err(e) => config_log().warn(
                            "config reload failed, keeping current configuration",
                            &[Field::error(&e)],
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => config_log().error("config watch error", &[Field::error(&e)]),
            },
            notify::Config::default().with_poll_interval(POLL_INTERVAL),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        config_log().info(
            "config watcher started",
            &[field("path", self.path.display().to_string())],
        );
        Ok(watcher)
    }
}

fn config_log() -> Logger {
    LoggerHandle::global().named("config")
}

/// Apply every config received on `updates` to `handle`.
///
/// `options` supplies the writers for each re-initialization. A config that
/// fails to initialize is logged and the previous logger is kept. The task
/// ends when the sending side is dropped.
pub fn spawn_reloader<F>(
    handle: LoggerHandle,
    agent: &'static TracingAgent,
    mut updates: mpsc::UnboundedReceiver<Config>,
    options: F,
) -> JoinHandle<()>
where
    F: Fn() -> InitOptions + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(config) = updates.recv().await {
            let target = handle.clone();
            let options = options();
            // Opening files and building exporters block
            let applied =
                tokio::task::spawn_blocking(move || target.initialize(&config, options, agent))
                    .await;

            match applied {
                Ok(Ok(())) => handle.info("configuration reloaded", &[]),
                Ok(Err(e)) => handle.warn(
                    "configuration rejected, keeping current logger",
                    &[Field::error(&e)],
                ),
                Err(e) => handle.error("configuration reload aborted", &[Field::error(&e)]),
            }
        }
    })
}
