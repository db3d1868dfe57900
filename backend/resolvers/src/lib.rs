//! Title resolution strategies and the manager that dispatches over them.

pub mod error;
pub mod extract;
pub mod github;
pub mod manager;
pub mod opengraph;
pub mod strategy;
pub mod unshortener;
pub mod youtube;

pub use error::ResolveError;
pub use github::GitHubResolver;
pub use manager::{ResolverManager, CACHE_PLATFORM, DEFAULT_TIMEOUT, MAX_TIMEOUT};
pub use opengraph::OpenGraphResolver;
pub use strategy::Strategy;
pub use unshortener::{UnshortenerResolver, DEFAULT_SHORTENER_DOMAINS, MAX_HOPS};
pub use youtube::YouTubeResolver;
