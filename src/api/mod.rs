pub(crate) mod answers;
pub(crate) mod auth;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod experiments;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod help_topics;
pub(crate) mod pagination;
pub(crate) mod questions;
pub(crate) mod requests;
pub(crate) mod router;
pub(crate) mod users;
pub(crate) mod validation;
