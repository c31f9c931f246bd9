//! A command whose per-item latency and outcome are chosen by the test case.

use async_trait::async_trait;
use rack::command::Command;
use rack::dispatch::{Batch, DispatchOptions, Dispatcher, Invocation};
use rack::error::{ApiError, RackError};
use rack::flags::{FlagContext, FlagSpec};
use rack::input::{DecodePolicy, PipeItem};
use rack::resource::{Payload, ResultMap};
use rack::service::{ContainerInfo, ObjectStorage, Services};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

/// Item `i` is named `item-i`, sleeps `delays_ms[i]`, and fails when `failures[i]`.
pub struct Scripted {
    pub delays_ms: Vec<u64>,
    pub failures: Vec<bool>,
}

#[async_trait]
impl Command for Scripted {
    type Params = usize;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn about(&self) -> &'static str {
        "Scripted latency and outcomes"
    }

    fn flags(&self) -> Vec<FlagSpec> {
        vec![FlagSpec::string("name", "Item name")]
    }

    fn required_flags(&self) -> &'static [&'static str] {
        &["name"]
    }

    fn keys(&self) -> &'static [&'static str] {
        &["Name", "Index"]
    }

    fn stdin_field(&self) -> Option<&'static str> {
        Some("name")
    }

    fn handle_flags(&self, flags: &FlagContext) -> Result<usize, RackError> {
        parse_index(flags.require_string("name")?)
    }

    fn handle_pipe(&self, _flags: &FlagContext, item: &PipeItem) -> Result<usize, RackError> {
        parse_index(&item.field("name").unwrap_or_default())
    }

    async fn execute(&self, _services: &Services, index: &usize) -> Result<Payload, RackError> {
        tokio::time::sleep(Duration::from_millis(self.delays_ms[*index])).await;
        if self.failures[*index] {
            return Err(ApiError::RequestFailed(format!("item-{}", index)).into());
        }
        let mut record = ResultMap::new();
        record.insert("Name".to_string(), json!(format!("item-{}", index)));
        record.insert("Index".to_string(), json!(index));
        Ok(Payload::Record(record))
    }
}

fn parse_index(name: &str) -> Result<usize, RackError> {
    name.strip_prefix("item-")
        .and_then(|i| i.parse().ok())
        .ok_or_else(|| RackError::InvalidParams(format!("bad name {}", name)))
}

struct Unused;

#[async_trait]
impl ObjectStorage for Unused {
    async fn list_containers(
        &self,
        _prefix: Option<&str>,
        _limit: Option<usize>,
    ) -> Result<Vec<ContainerInfo>, ApiError> {
        Ok(Vec::new())
    }
    async fn get_container(&self, name: &str) -> Result<ContainerInfo, ApiError> {
        Err(ApiError::NotFound(name.to_string()))
    }
    async fn create_container(
        &self,
        _name: &str,
        _metadata: &[(String, String)],
    ) -> Result<(), ApiError> {
        Ok(())
    }
    async fn delete_container(&self, _name: &str) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Pipe `item-0..item-n` through `command` as plain text lines.
pub fn dispatch(command: &Scripted, workers: usize) -> Batch<usize> {
    let stdin: String = (0..command.delays_ms.len())
        .map(|i| format!("item-{}\n", i))
        .collect();
    let dispatcher = Dispatcher::new(DispatchOptions {
        stdin: Some("name".to_string()),
        workers,
        decode_policy: DecodePolicy::Abort,
        ..DispatchOptions::default()
    })
    .unwrap();
    let invocation = Invocation {
        flags: FlagContext::new(),
        services: Services::new(Arc::new(Unused)),
        input: Box::new(Cursor::new(stdin.into_bytes())),
    };
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(dispatcher.dispatch(command, invocation))
        .unwrap()
}
