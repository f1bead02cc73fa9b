use std::sync::Arc;

use crate::{
    config::Config,
    db::SessionStore,
    services::{CatalogProvider, HybridRanker, OAuthClient},
};

/// Shared application state
///
/// Collaborators sit behind trait objects so tests can swap in fakes.
/// Nothing here holds per-request data.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogProvider>,
    pub oauth: Arc<dyn OAuthClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub ranker: HybridRanker,
}

impl AppState {
    pub fn new(
        config: &Config,
        catalog: Arc<dyn CatalogProvider>,
        oauth: Arc<dyn OAuthClient>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            catalog,
            oauth,
            sessions,
            ranker: HybridRanker::new(config.num_recommendations)
                .with_blend(config.popularity_blend),
        }
    }

    /// Ranker for one request, honouring a per-request count override
    pub fn ranker_for(&self, num_recommendations: Option<usize>) -> HybridRanker {
        match num_recommendations {
            Some(k) => HybridRanker::new(k).with_blend(self.ranker.blend()),
            None => self.ranker,
        }
    }
}
