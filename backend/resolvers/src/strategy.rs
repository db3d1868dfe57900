use linktitle_core::ResolveResult;
use url::Url;

use crate::error::ResolveError;
use crate::github::GitHubResolver;
use crate::manager::ResolverManager;
use crate::opengraph::OpenGraphResolver;
use crate::unshortener::UnshortenerResolver;
use crate::youtube::YouTubeResolver;

/// The closed set of resolution strategies the manager dispatches over.
pub enum Strategy {
    YouTube(YouTubeResolver),
    GitHub(GitHubResolver),
    Unshortener(UnshortenerResolver),
    OpenGraph(OpenGraphResolver),
    #[cfg(test)]
    Stub(stub::StubResolver),
}

impl Strategy {
    pub fn name(&self) -> &str {
        match self {
            Strategy::YouTube(r) => r.name(),
            Strategy::GitHub(r) => r.name(),
            Strategy::Unshortener(r) => r.name(),
            Strategy::OpenGraph(r) => r.name(),
            #[cfg(test)]
            Strategy::Stub(r) => r.name(),
        }
    }

    pub fn can_handle(&self, url: &Url) -> bool {
        match self {
            Strategy::YouTube(r) => r.can_handle(url),
            Strategy::GitHub(r) => r.can_handle(url),
            Strategy::Unshortener(r) => r.can_handle(url),
            Strategy::OpenGraph(r) => r.can_handle(url),
            #[cfg(test)]
            Strategy::Stub(r) => r.can_handle(url),
        }
    }

    /// `Ok(None)` means the strategy recognised the URL but had nothing to say.
    pub async fn resolve(
        &self,
        url: &Url,
        manager: &ResolverManager,
    ) -> Result<Option<ResolveResult>, ResolveError> {
        match self {
            Strategy::YouTube(r) => r.resolve(url).await,
            Strategy::GitHub(r) => r.resolve(url).await,
            Strategy::Unshortener(r) => r.resolve(url, manager).await,
            Strategy::OpenGraph(r) => r.resolve(url).await,
            #[cfg(test)]
            Strategy::Stub(r) => r.resolve(url).await,
        }
    }
}

impl From<YouTubeResolver> for Strategy {
    fn from(r: YouTubeResolver) -> Self {
        Strategy::YouTube(r)
    }
}

impl From<GitHubResolver> for Strategy {
    fn from(r: GitHubResolver) -> Self {
        Strategy::GitHub(r)
    }
}

impl From<UnshortenerResolver> for Strategy {
    fn from(r: UnshortenerResolver) -> Self {
        Strategy::Unshortener(r)
    }
}

impl From<OpenGraphResolver> for Strategy {
    fn from(r: OpenGraphResolver) -> Self {
        Strategy::OpenGraph(r)
    }
}
