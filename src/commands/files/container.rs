//! `rack files container <action>`

use crate::command::Command;
use crate::error::{ApiError, RackError, ValidationError};
use crate::flags::{FlagContext, FlagSpec};
use crate::input::PipeItem;
use crate::resource::{Payload, ResultMap};
use crate::service::{ContainerInfo, Services};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

const INFO_KEYS: &[&str] = &["Name", "ObjectCount", "BytesUsed"];
const STATUS_KEYS: &[&str] = &["Name", "Status"];
const NAME_ONLY: &[&str] = &["name"];

/// Upper bound on status polls for `delete --wait`.
const MAX_DELETE_POLLS: u32 = 60;

fn info_record(info: &ContainerInfo) -> ResultMap {
    let mut map = ResultMap::new();
    map.insert("Name".to_string(), json!(info.name));
    map.insert("ObjectCount".to_string(), json!(info.object_count));
    map.insert("BytesUsed".to_string(), json!(info.bytes_used));
    map
}

fn status_record(name: &str, status: &str) -> ResultMap {
    let mut map = ResultMap::new();
    map.insert("Name".to_string(), json!(name));
    map.insert("Status".to_string(), json!(status));
    map
}

fn piped_name(item: &PipeItem) -> Result<String, RackError> {
    item.field("name")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| RackError::InvalidParams("input record has no `name` field".to_string()))
}

fn name_flag() -> FlagSpec {
    FlagSpec::string("name", "[required] The name of the container")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub prefix: Option<String>,
    pub limit: Option<usize>,
}

pub struct ListContainers;

#[async_trait]
impl Command for ListContainers {
    type Params = ListParams;

    fn name(&self) -> &'static str {
        "list"
    }

    fn about(&self) -> &'static str {
        "List containers"
    }

    fn flags(&self) -> Vec<FlagSpec> {
        vec![
            FlagSpec::string("prefix", "Only list containers whose names begin with this prefix"),
            FlagSpec::int("limit", "Only return this many containers at most"),
        ]
    }

    fn keys(&self) -> &'static [&'static str] {
        INFO_KEYS
    }

    fn handle_flags(&self, flags: &FlagContext) -> Result<ListParams, RackError> {
        let limit = match flags.int("limit") {
            None => None,
            Some(n) if n > 0 => usize::try_from(n).ok(),
            Some(_) => {
                return Err(ValidationError::InvalidValue {
                    flag: "limit".to_string(),
                    reason: "must be a positive integer".to_string(),
                }
                .into())
            }
        };
        Ok(ListParams {
            prefix: flags.string("prefix").map(str::to_string),
            limit,
        })
    }

    async fn execute(&self, services: &Services, params: &ListParams) -> Result<Payload, RackError> {
        let containers = services
            .object_storage
            .list_containers(params.prefix.as_deref(), params.limit)
            .await?;
        debug!(count = containers.len(), "Listed containers");
        Ok(Payload::Records(containers.iter().map(info_record).collect()))
    }
}

pub struct GetContainer;

#[async_trait]
impl Command for GetContainer {
    type Params = String;

    fn name(&self) -> &'static str {
        "get"
    }

    fn about(&self) -> &'static str {
        "Retrieve information about a container"
    }

    fn flags(&self) -> Vec<FlagSpec> {
        vec![name_flag()]
    }

    fn required_flags(&self) -> &'static [&'static str] {
        NAME_ONLY
    }

    fn keys(&self) -> &'static [&'static str] {
        INFO_KEYS
    }

    fn stdin_field(&self) -> Option<&'static str> {
        Some("name")
    }

    fn handle_flags(&self, flags: &FlagContext) -> Result<String, RackError> {
        Ok(flags.require_string("name")?.to_string())
    }

    fn handle_pipe(&self, _flags: &FlagContext, item: &PipeItem) -> Result<String, RackError> {
        piped_name(item)
    }

    async fn execute(&self, services: &Services, name: &String) -> Result<Payload, RackError> {
        let info = services.object_storage.get_container(name).await?;
        Ok(Payload::Record(info_record(&info)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub name: String,
    pub metadata: Vec<(String, String)>,
}

pub struct CreateContainer;

impl CreateContainer {
    /// Parse `key=value` pairs.
    fn parse_metadata(pairs: &[String]) -> Result<Vec<(String, String)>, RackError> {
        pairs
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
                _ => Err(ValidationError::InvalidValue {
                    flag: "metadata".to_string(),
                    reason: format!("expected key=value, got `{}`", pair),
                }
                .into()),
            })
            .collect()
    }

    /// Metadata from a JSON record: either an object or a list of `key=value` strings.
    fn record_metadata(value: &Value) -> Result<Vec<(String, String)>, RackError> {
        match value {
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect()),
            Value::Array(items) => {
                let pairs: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                Self::parse_metadata(&pairs)
            }
            Value::String(s) => Self::parse_metadata(&[s.clone()]),
            Value::Null => Ok(Vec::new()),
            other => Err(RackError::InvalidParams(format!(
                "metadata must be an object or a list, got {}",
                other
            ))),
        }
    }

    fn flag_metadata(flags: &FlagContext) -> Result<Vec<(String, String)>, RackError> {
        flags
            .list("metadata")
            .map(Self::parse_metadata)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[async_trait]
impl Command for CreateContainer {
    type Params = CreateParams;

    fn name(&self) -> &'static str {
        "create"
    }

    fn about(&self) -> &'static str {
        "Create a container"
    }

    fn flags(&self) -> Vec<FlagSpec> {
        vec![
            name_flag(),
            FlagSpec::string_list(
                "metadata",
                "Comma-separated key=value pairs to associate with the container",
            ),
        ]
    }

    fn required_flags(&self) -> &'static [&'static str] {
        NAME_ONLY
    }

    fn keys(&self) -> &'static [&'static str] {
        STATUS_KEYS
    }

    fn stdin_field(&self) -> Option<&'static str> {
        Some("name")
    }

    fn handle_flags(&self, flags: &FlagContext) -> Result<CreateParams, RackError> {
        Ok(CreateParams {
            name: flags.require_string("name")?.to_string(),
            metadata: Self::flag_metadata(flags)?,
        })
    }

    fn handle_pipe(&self, flags: &FlagContext, item: &PipeItem) -> Result<CreateParams, RackError> {
        let mut metadata = Self::flag_metadata(flags)?;
        if let Some(value) = item.value("metadata") {
            metadata.extend(Self::record_metadata(value)?);
        }
        Ok(CreateParams {
            name: piped_name(item)?,
            metadata,
        })
    }

    async fn execute(&self, services: &Services, params: &CreateParams) -> Result<Payload, RackError> {
        services
            .object_storage
            .create_container(&params.name, &params.metadata)
            .await?;
        Ok(Payload::Record(status_record(&params.name, "created")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteParams {
    pub name: String,
    pub wait: bool,
}

pub struct DeleteContainer;

impl DeleteContainer {
    async fn wait_until_gone(services: &Services, name: &str) -> Result<(), RackError> {
        for attempt in 1..=MAX_DELETE_POLLS {
            tokio::time::sleep(services.poll_interval).await;
            match services.object_storage.get_container(name).await {
                Err(ApiError::NotFound(_)) => return Ok(()),
                Ok(_) => debug!(container = name, attempt, "Container still present"),
                Err(err) => return Err(err.into()),
            }
        }
        Err(ApiError::Timeout(format!("container {} still exists after deletion", name)).into())
    }
}

#[async_trait]
impl Command for DeleteContainer {
    type Params = DeleteParams;

    fn name(&self) -> &'static str {
        "delete"
    }

    fn about(&self) -> &'static str {
        "Delete a container"
    }

    fn flags(&self) -> Vec<FlagSpec> {
        vec![
            name_flag(),
            FlagSpec::bool("wait", "Block until the container no longer exists"),
        ]
    }

    fn required_flags(&self) -> &'static [&'static str] {
        NAME_ONLY
    }

    fn keys(&self) -> &'static [&'static str] {
        STATUS_KEYS
    }

    fn stdin_field(&self) -> Option<&'static str> {
        Some("name")
    }

    fn handle_flags(&self, flags: &FlagContext) -> Result<DeleteParams, RackError> {
        Ok(DeleteParams {
            name: flags.require_string("name")?.to_string(),
            wait: flags.flag("wait"),
        })
    }

    fn handle_pipe(&self, flags: &FlagContext, item: &PipeItem) -> Result<DeleteParams, RackError> {
        let record_wait = item
            .value("wait")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        Ok(DeleteParams {
            name: piped_name(item)?,
            wait: flags.flag("wait") || record_wait,
        })
    }

    async fn execute(&self, services: &Services, params: &DeleteParams) -> Result<Payload, RackError> {
        services.object_storage.delete_container(&params.name).await?;
        if params.wait {
            Self::wait_until_gone(services, &params.name).await?;
        }
        Ok(Payload::Record(status_record(&params.name, "deleted")))
    }
}
