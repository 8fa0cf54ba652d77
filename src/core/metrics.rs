use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::{RequestKind, RequestStatus};

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_submission(kind: RequestKind) {
    metrics::counter!("workflow_submissions_total", "kind" => kind.as_str()).increment(1);
}

pub(crate) fn record_review(kind: RequestKind, status: RequestStatus) {
    metrics::counter!(
        "workflow_reviews_total",
        "kind" => kind.as_str(),
        "status" => status.as_str()
    )
    .increment(1);
}
