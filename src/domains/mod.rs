pub mod projects;
pub mod registry;
pub mod runtime;
pub mod terminal;
