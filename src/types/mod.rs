mod access;
mod action;
mod models;

pub use access::{REPOSITORY_TYPE, ResourceActions};
pub use action::{Actions, PermissionLevel};
pub use models::*;
