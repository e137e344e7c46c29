pub mod actions;
pub mod errors;
pub mod files;
pub mod identity;
pub mod intake;
pub mod projects;
pub mod protocol;
pub mod registry;
pub mod storage;
