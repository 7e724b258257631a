use kairos_availability::{AvailabilityProjector, SchedulingEngine, SlotHoldArbiter};
use kairos_store::app_config::BusinessRules;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SchedulingEngine>,
    pub projector: Arc<AvailabilityProjector>,
    pub arbiter: Arc<SlotHoldArbiter>,
    pub business_rules: BusinessRules,
}
