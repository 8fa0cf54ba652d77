pub(crate) mod request_workflow;
pub(crate) mod scoring;
