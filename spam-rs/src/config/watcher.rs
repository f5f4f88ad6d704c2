//! Config file hot reload
//!
//! A long-lived task owns a filesystem watcher on the config file's
//! directory. Whenever the file changes it re-resolves the configuration
//! and publishes the result on a `watch` channel. Consumers read the latest
//! value from their receiver; there is no shared mutable state.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::resolver::ConfigResolver;
use super::FilterConfig;
use crate::error::{Result, SpamError};

/// Quiet period after the last event before the file is re-read
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Handle to a running config watcher task
pub struct ConfigWatcher {
    receiver: watch::Receiver<FilterConfig>,
    handle: JoinHandle<()>,
}

impl ConfigWatcher {
    /// Resolve the initial configuration and start watching the config file
    ///
    /// Must be called from within a tokio runtime. The task stops when
    /// `cancel` fires or when every receiver has been dropped.
    pub fn spawn(resolver: ConfigResolver, cancel: CancellationToken) -> Result<Self> {
        Self::spawn_with_debounce(resolver, cancel, DEBOUNCE)
    }

    pub(crate) fn spawn_with_debounce(
        resolver: ConfigResolver,
        cancel: CancellationToken,
        debounce: Duration,
    ) -> Result<Self> {
        let path = resolver
            .config_path()
            .map(Path::to_path_buf)
            .ok_or_else(|| SpamError::Config("No configuration file to watch".to_string()))?;

        let (dir, file_name) = split_watch_target(&path)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                let _ = event_tx.send(result);
            },
            Config::default(),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        debug!("Watching {:?} for changes to {:?}", dir, file_name);

        let initial = resolver.resolve();
        let (config_tx, receiver) = watch::channel(initial);

        let handle = tokio::spawn(run(
            watcher, event_rx, file_name, resolver, config_tx, cancel, debounce,
        ));

        Ok(Self { receiver, handle })
    }

    /// A receiver that always holds the latest configuration
    pub fn subscribe(&self) -> watch::Receiver<FilterConfig> {
        self.receiver.clone()
    }

    /// Latest published configuration
    pub fn current(&self) -> FilterConfig {
        self.receiver.borrow().clone()
    }

    /// Wait for the watcher task to finish
    pub async fn join(self) -> Result<()> {
        drop(self.receiver);
        self.handle.await?;
        Ok(())
    }
}

fn split_watch_target(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .ok_or_else(|| SpamError::Config(format!("Invalid configuration path: {}", path.display())))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}

fn touches_file(event: &Event, file_name: &OsString) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|p| p.file_name().map(|n| n == file_name.as_os_str()).unwrap_or(false))
}

async fn run(
    _watcher: RecommendedWatcher,
    mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_name: OsString,
    resolver: ConfigResolver,
    config_tx: watch::Sender<FilterConfig>,
    cancel: CancellationToken,
    debounce: Duration,
) {
    info!("Config watcher started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = config_tx.closed() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                match event {
                    Ok(event) if touches_file(&event, &file_name) => {}
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("Config watch error: {}", e);
                        continue;
                    }
                }

                // Editors often write a file in several steps
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(debounce) => {}
                }
                while events.try_recv().is_ok() {}

                let config = resolver.resolve();
                let changed = config_tx.send_if_modified(|current| {
                    if *current == config {
                        false
                    } else {
                        *current = config;
                        true
                    }
                });

                if changed {
                    info!("Configuration reloaded");
                } else {
                    debug!("Config file touched, configuration unchanged");
                }
            }
        }
    }

    info!("Config watcher stopped");
}
