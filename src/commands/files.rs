//! Object storage for files and media.

use crate::commands::{ResourceGroup, ServiceGroup};

pub mod container;

pub fn service() -> ServiceGroup {
    ServiceGroup {
        name: "files",
        about: "Object storage for files and media.",
        resources: vec![ResourceGroup {
            name: "container",
            about: "Containers hold objects. Create, inspect, and remove them.",
            commands: vec![
                Box::new(container::ListContainers),
                Box::new(container::GetContainer),
                Box::new(container::CreateContainer),
                Box::new(container::DeleteContainer),
            ],
        }],
    }
}
