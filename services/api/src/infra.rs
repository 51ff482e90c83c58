use loan_review::config::ReviewConfig;
use loan_review::origination::{memory_origination, MemoryOrigination};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) scoring_attached: bool,
}

pub(crate) fn build_origination(
    config: &ReviewConfig,
    without_scoring: bool,
) -> Arc<MemoryOrigination> {
    let mut review = config.clone();
    if without_scoring {
        review.scoring_enabled = false;
    }
    Arc::new(memory_origination(&review))
}
