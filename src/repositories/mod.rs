pub(crate) mod answers;
pub(crate) mod courses;
pub(crate) mod experiments;
pub(crate) mod help_topics;
pub(crate) mod questions;
pub(crate) mod requests;
pub(crate) mod token_blocklist;
pub(crate) mod users;
