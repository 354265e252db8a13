//! Hot reload of the logger configuration.

use std::time::Duration;

use tokio::sync::mpsc;

use spanlog::config::{spawn_reloader, ConfigWatcher};
use spanlog::{Config, InitOptions, LoggerHandle, TracingAgent};

mod common;
use common::{Capture, CountingFactory};

fn console_config(level: &str) -> Config {
    Config {
        level: level.into(),
        format: "json".into(),
        mode: "console".into(),
        ..Config::default()
    }
}

fn leaked_agent() -> &'static TracingAgent {
    Box::leak(Box::new(TracingAgent::with_factory(CountingFactory::default())))
}

#[tokio::test]
async fn test_reloader_applies_valid_configs_only() {
    let agent = leaked_agent();
    let first = Capture::default();
    let second = Capture::default();
    let handle = LoggerHandle::default();
    handle
        .initialize(
            &console_config("info"),
            InitOptions::new().with_console(first.clone()),
            agent,
        )
        .unwrap();

    let (tx, rx) = mpsc::unbounded_channel();
    let console = second.clone();
    let reloader = spawn_reloader(handle.clone(), agent, rx, move || {
        InitOptions::new().with_console(console.clone())
    });

    tx.send(console_config("verbose")).unwrap();
    tx.send(console_config("warn")).unwrap();
    drop(tx);
    reloader.await.unwrap();

    let rejected = first.records();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["level"], "WARN");
    assert!(rejected[0]["error"].as_str().unwrap().contains("verbose"));

    // the reload notice is info, below the new minimum level
    handle.info("filtered", &[]);
    handle.warn("after reload", &[]);
    let records = second.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["message"], "after reload");
}

#[tokio::test]
async fn test_watcher_sends_rewritten_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spanlog.toml");
    std::fs::write(&path, "level = \"info\"\nmode = \"console\"\n").unwrap();

    let (watcher, mut updates) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    std::fs::write(&path, "level = \"warn\"\nmode = \"console\"\n").unwrap();

    let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let config = updates.recv().await.expect("watcher stopped");
            if config.level == "warn" {
                return config;
            }
        }
    })
    .await
    .expect("no reload within timeout");

    assert_eq!(reloaded.mode, "console");
}
