//! Shared test utilities for integration tests
//!
//! An in-memory object store standing in for the remote service, a runner that drives the
//! full CLI with injected standard streams, and environment isolation for config tests.

use async_trait::async_trait;
use rack::cli::RunContext;
use rack::config::RackConfig;
use rack::error::ApiError;
use rack::service::{ContainerInfo, ObjectStorage, Services};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// In-memory container store. Names starting with `slow` delay their lookups so batches
/// complete out of order.
#[derive(Default)]
pub struct MemoryStorage {
    containers: Mutex<BTreeMap<String, ContainerInfo>>,
    pub calls: AtomicUsize,
}

impl MemoryStorage {
    pub fn with_containers(entries: &[(&str, u64, u64)]) -> Arc<Self> {
        let storage = Self::default();
        {
            let mut containers = storage.containers.lock().unwrap();
            for (name, object_count, bytes_used) in entries {
                containers.insert(
                    name.to_string(),
                    ContainerInfo {
                        name: name.to_string(),
                        object_count: *object_count,
                        bytes_used: *bytes_used,
                    },
                );
            }
        }
        Arc::new(storage)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.containers.lock().unwrap().contains_key(name)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn list_containers(
        &self,
        prefix: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<ContainerInfo>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let containers = self.containers.lock().unwrap();
        Ok(containers
            .values()
            .filter(|c| prefix.map_or(true, |p| c.name.starts_with(p)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn get_container(&self, name: &str) -> Result<ContainerInfo, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if name.starts_with("slow") {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        self.containers
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }

    async fn create_container(
        &self,
        name: &str,
        _metadata: &[(String, String)],
    ) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.containers.lock().unwrap().insert(
            name.to_string(),
            ContainerInfo {
                name: name.to_string(),
                object_count: 0,
                bytes_used: 0,
            },
        );
        Ok(())
    }

    async fn delete_container(&self, name: &str) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.containers
            .lock()
            .unwrap()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(name.to_string()))
    }
}

/// Captured result of one CLI run.
#[derive(Debug)]
pub struct Outcome {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `rack <args>` against `storage` with `stdin` as standard input.
pub async fn run(storage: Arc<MemoryStorage>, args: &[&str], stdin: &str) -> Outcome {
    let services = Services::new(storage).with_poll_interval(Duration::from_millis(1));
    let context = RunContext::new(RackConfig::default(), services);
    let mut argv = vec!["rack"];
    argv.extend_from_slice(args);
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = context
        .run_with_io(
            argv,
            Box::new(Cursor::new(stdin.as_bytes().to_vec())),
            &mut stdout,
            &mut stderr,
        )
        .await;
    Outcome {
        code,
        stdout: String::from_utf8(stdout).unwrap(),
        stderr: String::from_utf8(stderr).unwrap(),
    }
}

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "RS_REGION_NAME",
    "RACK_BATCH__WORKERS",
    "RACK_OUTPUT__FORMAT",
    "RACK_SERVICE__ENDPOINT",
];

/// Run `f` with `HOME` and `XDG_CONFIG_HOME` pointed into `test_dir` and every rack
/// variable cleared, restoring the original environment afterwards.
pub fn with_config_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ISOLATED_VARS
        .iter()
        .map(|name| (*name, std::env::var(name).ok()))
        .collect();

    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());

    let result = f();

    for (name, value) in saved {
        match value {
            Some(value) => std::env::set_var(name, value),
            None => std::env::remove_var(name),
        }
    }
    result
}
