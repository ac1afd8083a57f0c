pub mod service;
pub mod types;

pub use service::{RegistryError, RegistryRepository, RegistryService};
pub use types::{AppSettings, ProjectConfig};
