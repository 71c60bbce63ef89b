//! Application layer - the create and remove use cases.
//!
//! Each action coordinates discovery, the link primitives and the record store
//! for one invocation against an already resolved [`Config`](crate::config::Config).

mod create;
mod remove;

pub use create::{CreateAction, CreateReport};
pub use remove::{RemoveAction, RemoveReport};
