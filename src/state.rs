// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    services::{
        acquisition::QuestionSource,
        entitlement::EntitlementTracker,
        fallback::FallbackSet,
        game::GameService,
        plans::PlanCatalog,
        provider::QuestionProvider,
        results::StoreResultsSink,
        sessions::SessionRegistry,
    },
    store::KeyValueStore,
    utils::period::Clock,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub game: GameService,
}

impl AppState {
    /// Wires the services over one shared store.
    pub fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        provider: Arc<dyn QuestionProvider>,
        fallback: FallbackSet,
        plans: PlanCatalog,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tracker = EntitlementTracker::new(store.clone(), Arc::new(plans), clock);
        let source = QuestionSource::new(provider, Arc::new(fallback));
        let game = GameService::new(
            Arc::new(tracker),
            Arc::new(source),
            SessionRegistry::new(),
            Arc::new(StoreResultsSink::new(store)),
        );

        Self { config, game }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for GameService {
    fn from_ref(state: &AppState) -> Self {
        state.game.clone()
    }
}
