use serde::Serialize;

/// Body returned by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Simple health service used by the REST API.
///
/// Liveness only: it never touches the store. Readiness is reported separately by the router,
/// which pings the store.
pub struct HealthService;

impl HealthService {
    /// Check health without touching any state.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "HIS is alive".into(),
        }
    }
}
