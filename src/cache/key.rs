//! Canonical request keys shared by cache lookups and stores.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use url::Url;

/// Cache policy component of a request key.
///
/// Only one policy exists today; it is still part of the key so entries
/// written under a different policy never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CachePolicy {
    /// Honor the protocol's caching semantics
    #[default]
    UseProtocol,
}

impl CachePolicy {
    fn as_str(&self) -> &'static str {
        match self {
            CachePolicy::UseProtocol => "use-protocol",
        }
    }
}

/// Composite key addressing a cached image.
///
/// `lookup` and `store` must build this identically or hits never occur, so
/// both go through [`CacheKey::for_url`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Canonical URL string
    url: Arc<str>,

    /// Cache policy
    policy: CachePolicy,

    /// Freshness window in whole seconds
    max_age_secs: u64,
}

impl CacheKey {
    /// Build the key for `url` with the given freshness window.
    pub fn for_url(url: &Url, max_age: Duration) -> Self {
        Self {
            url: Arc::from(url.as_str()),
            policy: CachePolicy::UseProtocol,
            max_age_secs: max_age.as_secs(),
        }
    }

    /// The URL this key addresses.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Cache policy component.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Freshness window component.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    /// Stable file stem for the persistent tier: hex SHA-256 of the key string.
    pub fn file_stem(&self) -> String {
        let digest = Sha256::digest(self.to_string().as_bytes());
        hex::encode(digest)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} max-age={}",
            self.policy.as_str(),
            self.url,
            self.max_age_secs
        )
    }
}
