pub mod auth;
pub mod providers;
pub mod recommendations;

pub use auth::{OAuthClient, SpotifyOAuth};
pub use providers::{CatalogProvider, SpotifyCatalog};
pub use recommendations::HybridRanker;
