//! Rendering of deployment specs into declarative configuration text.
//!
//! The output is a single HCL `resource` block that the provisioning layer
//! applies as the full desired state of the AI app.

mod renderer;

pub use renderer::{ConfigRenderer, DEFAULT_RESOURCE_NAME, DEFAULT_RESOURCE_TYPE};
