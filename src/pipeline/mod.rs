//! The assistant coordinator task and the messages it exchanges.

pub mod coordinator;
pub mod messages;
