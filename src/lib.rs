//! Relay site storage
//!
//! Keeps a user's list of sites (URL, abbreviation and an accent color taken
//! from the site's favicon) in a key-value storage area, together with a
//! display-order index of site IDs and a never-decreasing ID counter.
//!
//! # Features
//!
//! - **favicon** (default): fetches `<origin>/favicon.ico` with `reqwest` and
//!   samples it with `image` to color new sites
//! - **Swappable storage**: anything implementing [`StorageArea`]; in-memory
//!   and JSON-file backends are included
//! - **Async facade**: [`Sites`] runs the store on a worker thread
//!
//! # Example
//!
//! ```
//! use relay::{MemoryStorage, NoColorSource, Rgba, Site, SiteStore};
//!
//! # fn main() -> relay::Result<()> {
//! let mut store = SiteStore::new(MemoryStorage::new());
//! let mut sites = vec![
//!     Site::create("https://example.com/", "Ex", Some(Rgba::from([1, 4, 9, 255])), &NoColorSource),
//!     Site::create("/", "Bad", None, &NoColorSource),
//! ];
//! store.add_sites(&mut sites)?;
//! store.reorder_site(1, 0)?;
//!
//! assert_eq!(store.get_sorted_site_ids()?, vec![1, 0]);
//! assert_eq!(store.get_site(1)?.unwrap().color, Rgba::new(0, 0, 0, 255));
//! assert_eq!(store.get_next_id()?, 2);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod color;
pub use color::Rgba;

pub mod site;
pub use site::{NewSite, Site, SiteId};

// Favicon fetching and sampling (HTTP parts gated under `favicon`)
pub mod favicon;
pub use favicon::{ColorSource, NoColorSource};
#[cfg(feature = "favicon")]
pub use favicon::FaviconSampler;

pub mod storage;
pub use storage::{FileStorage, MemoryStorage, StorageArea, WriteBatch};

pub mod store;
pub use store::SiteStore;

// Async-friendly facade (worker-thread backed)
pub mod async_api;
pub use async_api::Sites;

/// Configuration for favicon fetching
///
/// # Examples
///
/// ```
/// let cfg = relay::RelayConfig::default();
/// assert_eq!(cfg.favicon_path, "/favicon.ico");
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// User agent string sent with favicon requests
    pub user_agent: String,
    /// Timeout for a single favicon request in milliseconds
    pub timeout_ms: u64,
    /// Extra HTTP headers
    pub headers: HashMap<String, String>,
    /// Favicon path on the site's origin; a leading slash is optional
    pub favicon_path: String,
    /// Larger favicon bodies are ignored
    pub max_favicon_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("relay/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 5000,
            headers: HashMap::new(),
            favicon_path: "/favicon.ico".to_string(),
            max_favicon_bytes: 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.user_agent.starts_with("relay/"));
        assert!(config.headers.is_empty());
    }
}
