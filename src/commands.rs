//! Command registry: services → resources → actions.
//!
//! Each action is a [`Command`](crate::command::Command) held as a [`Runnable`] so the
//! CLI can build its tree and route to any action through one dispatch path.

use crate::command::Runnable;

pub mod files;

/// A resource type and the actions available on it (e.g. `container`).
pub struct ResourceGroup {
    pub name: &'static str,
    pub about: &'static str,
    pub commands: Vec<Box<dyn Runnable>>,
}

impl ResourceGroup {
    pub fn find(&self, action: &str) -> Option<&dyn Runnable> {
        self.commands
            .iter()
            .find(|c| c.command_name() == action)
            .map(|c| c.as_ref())
    }
}

/// A cloud service and its resource types (e.g. `files`).
pub struct ServiceGroup {
    pub name: &'static str,
    pub about: &'static str,
    pub resources: Vec<ResourceGroup>,
}

impl ServiceGroup {
    pub fn find(&self, resource: &str) -> Option<&ResourceGroup> {
        self.resources.iter().find(|r| r.name == resource)
    }
}

/// Every service the CLI exposes.
pub fn registry() -> Vec<ServiceGroup> {
    vec![files::service()]
}

/// Look up `service resource action`.
pub fn find<'a>(
    registry: &'a [ServiceGroup],
    service: &str,
    resource: &str,
    action: &str,
) -> Option<&'a dyn Runnable> {
    registry
        .iter()
        .find(|s| s.name == service)?
        .find(resource)?
        .find(action)
}
