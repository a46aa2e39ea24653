use api_shared::{JwtKeys, Policy};
use his_core::{Clock, ServiceContext, Services, Store};
use std::sync::Arc;

/// Application state for the REST API server.
///
/// Cloned into every handler. Services share one store and clock through their context; the
/// keys and policy are fixed at startup. Tokens are checked against the same clock that
/// stamped them.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub keys: JwtKeys,
    pub policy: Arc<Policy>,
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// State with the hospital access policy.
    pub fn new(ctx: ServiceContext) -> Self {
        Self::with_policy(ctx, Policy::hospital())
    }

    pub fn with_policy(ctx: ServiceContext, policy: Policy) -> Self {
        let store = Arc::clone(ctx.store());
        let clock = Arc::clone(ctx.clock());
        let services = Services::new(ctx);
        Self {
            keys: services.users.keys().clone(),
            services: Arc::new(services),
            policy: Arc::new(policy),
            store,
            clock,
        }
    }
}
