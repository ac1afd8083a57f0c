pub mod inspector;
pub mod package_manager;
pub mod types;

pub use package_manager::PackageManager;
pub use types::{Project, Script};
