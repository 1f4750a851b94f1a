//! Site storage: records, the display-order index and the ID counter.
//!
//! Layout inside the storage area:
//!
//! - `s<id>`: one serialized [`Site`], `id` included
//! - `nextID`: the next ID to hand out (absent means 0)
//! - `sortedIDs`: site IDs in display order (absent means empty)
//!
//! Every mutation is a single [`WriteBatch`], so records and the index never
//! drift apart. The counter only moves forward, and only in [`SiteStore::add_sites`].

use log::{debug, warn};
use serde_json::{json, Value};

use crate::favicon::ColorSource;
use crate::storage::{StorageArea, WriteBatch};
use crate::{Error, Result, Rgba, Site, SiteId};

const NEXT_ID_KEY: &str = "nextID";
const SORTED_IDS_KEY: &str = "sortedIDs";

fn site_key(id: SiteId) -> String {
    format!("s{}", id)
}

fn is_site_key(key: &str) -> bool {
    key.strip_prefix('s')
        .map(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Site collection on top of a [`StorageArea`]
pub struct SiteStore<S> {
    storage: S,
}

impl<S: StorageArea> SiteStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Insert pending sites, assigning IDs in slice order.
    ///
    /// Each site's `id` is set in place. The counter moves forward by the
    /// batch size and the IDs are appended to the display order.
    pub fn add_sites(&mut self, sites: &mut [Site]) -> Result<()> {
        if sites.is_empty() {
            return Ok(());
        }

        let first = self.get_next_id()?;
        let mut sorted = self.get_sorted_site_ids()?;
        let mut batch = WriteBatch::new();

        let mut next = first;
        for site in sites.iter_mut() {
            site.id = Some(next);
            batch.put(site_key(next), serde_json::to_value(&*site)?);
            sorted.push(next);
            next += 1;
        }
        batch.put(NEXT_ID_KEY, json!(next));
        batch.put(SORTED_IDS_KEY, json!(sorted));

        self.storage.apply(batch)?;
        debug!("Added {} site(s) with IDs {}..{}", sites.len(), first, next);
        Ok(())
    }

    /// All stored sites in display order
    pub fn get_all_sites(&self) -> Result<Vec<Site>> {
        let mut sites = Vec::new();
        for id in self.get_sorted_site_ids()? {
            if let Some(site) = self.get_site(id)? {
                sites.push(site);
            }
        }
        Ok(sites)
    }

    pub fn get_site(&self, id: SiteId) -> Result<Option<Site>> {
        match self.storage.get(&site_key(id))? {
            Some(v) => Ok(Some(serde_json::from_value(v)?)),
            None => Ok(None),
        }
    }

    /// First site in display order whose URL equals `url`
    pub fn get_site_for_url(&self, url: &str) -> Result<Option<Site>> {
        Ok(self.get_all_sites()?.into_iter().find(|s| s.url == url))
    }

    pub fn get_site_abbreviation_for_url(&self, url: &str) -> Result<Option<String>> {
        Ok(self.get_site_for_url(url)?.map(|s| s.abbreviation))
    }

    /// Number of site records in storage
    pub fn get_sites_count(&self) -> Result<usize> {
        Ok(self.storage.keys()?.iter().filter(|k| is_site_key(k)).count())
    }

    pub fn get_next_id(&self) -> Result<SiteId> {
        match self.storage.get(NEXT_ID_KEY)? {
            None => Ok(0),
            Some(v) => v.as_u64().ok_or_else(|| {
                Error::Serialization(format!("{} is not a non-negative integer: {}", NEXT_ID_KEY, v))
            }),
        }
    }

    pub fn get_sorted_site_ids(&self) -> Result<Vec<SiteId>> {
        match self.storage.get(SORTED_IDS_KEY)? {
            None => Ok(Vec::new()),
            Some(v) => Ok(serde_json::from_value(v)?),
        }
    }

    pub fn update_site_abbreviation(&mut self, id: SiteId, abbreviation: &str) -> Result<()> {
        self.modify(id, |site| site.abbreviation = abbreviation.to_string())
    }

    /// Replace the favicon-derived color. Three components mean alpha 255.
    pub fn update_site_color(&mut self, id: SiteId, color: impl Into<Rgba>) -> Result<()> {
        let color = color.into();
        self.modify(id, |site| site.color = color)
    }

    /// Set the user's color, leaving the derived `color` alone
    pub fn update_site_custom_color(&mut self, id: SiteId, color: impl Into<Rgba>) -> Result<()> {
        let color = color.into();
        self.modify(id, |site| site.custom_color = Some(color))
    }

    /// Recompute every site's color from its favicon.
    ///
    /// Sites whose favicon cannot be sampled get the default color. Returns
    /// `true` once all sites have been processed and written; only a storage
    /// failure makes it `false`.
    pub fn update_favicon_color_for_all_sites(&mut self, source: &dyn ColorSource) -> bool {
        match self.refresh_favicon_colors(source) {
            Ok(n) => {
                debug!("Refreshed favicon colors for {} site(s)", n);
                true
            }
            Err(e) => {
                warn!("Favicon color refresh failed: {}", e);
                false
            }
        }
    }

    fn refresh_favicon_colors(&mut self, source: &dyn ColorSource) -> Result<usize> {
        let sites = self.get_all_sites()?;
        let mut batch = WriteBatch::new();
        for mut site in sites.iter().cloned() {
            site.color = source.color_for(&site.url).unwrap_or_default();
            if let Some(id) = site.id {
                batch.put(site_key(id), serde_json::to_value(&site)?);
            }
        }
        if !batch.is_empty() {
            self.storage.apply(batch)?;
        }
        Ok(sites.len())
    }

    /// Delete sites and drop them from the display order. Unknown IDs are ignored.
    pub fn remove_sites(&mut self, ids: &[SiteId]) -> Result<()> {
        let mut sorted = self.get_sorted_site_ids()?;
        let before = sorted.len();
        sorted.retain(|id| !ids.contains(id));

        let mut batch = WriteBatch::new();
        for &id in ids {
            let key = site_key(id);
            if self.storage.get(&key)?.is_some() {
                batch.delete(key);
            }
        }
        if sorted.len() != before {
            batch.put(SORTED_IDS_KEY, json!(sorted));
        }
        if batch.is_empty() {
            return Ok(());
        }
        self.storage.apply(batch)?;
        debug!("Removed site(s) {:?}", ids);
        Ok(())
    }

    /// Move the ID at position `from` of the display order to position `to`.
    ///
    /// `to` past the end means the end. An out-of-range `from` does nothing.
    pub fn reorder_site(&mut self, from: usize, to: usize) -> Result<()> {
        let mut sorted = self.get_sorted_site_ids()?;
        if from >= sorted.len() {
            return Ok(());
        }
        let to = to.min(sorted.len() - 1);
        if to == from {
            return Ok(());
        }
        let id = sorted.remove(from);
        sorted.insert(to, id);

        let mut batch = WriteBatch::new();
        batch.put(SORTED_IDS_KEY, json!(sorted));
        self.storage.apply(batch)
    }

    fn modify<F>(&mut self, id: SiteId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Site),
    {
        let Some(mut site) = self.get_site(id)? else {
            debug!("Ignoring update for unknown site {}", id);
            return Ok(());
        };
        f(&mut site);
        let value: Value = serde_json::to_value(&site)?;
        let mut batch = WriteBatch::new();
        batch.put(site_key(id), value);
        self.storage.apply(batch)
    }
}
