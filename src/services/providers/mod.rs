/// Music catalog abstraction
///
/// The recommendation engine only ever sees a `TrackTable`. Providers turn a
/// playlist ID and a user's access token into that table, doing all of the
/// network I/O before any scoring starts.
use crate::{error::AppResult, models::TrackTable};

pub mod spotify;

pub use spotify::SpotifyCatalog;

/// Trait for music catalog providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Fetch every track of a playlist with its metadata and audio features
    ///
    /// Tracks the catalog cannot describe fully are still returned, with the
    /// unknown fields left empty. An empty or unreachable playlist is an error.
    async fn fetch_playlist(&self, playlist_id: &str, access_token: &str)
        -> AppResult<TrackTable>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
