pub mod binary_utils;
pub mod platform;

pub use binary_utils::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use platform::HostPlatform;
