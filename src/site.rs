//! The site record and its construction

use serde::{Deserialize, Serialize};

use crate::favicon::ColorSource;
use crate::Rgba;

/// Identifier assigned to a site when it is added to a store
pub type SiteId = u64;

/// A managed site: a URL, a short label and an accent color.
///
/// `id` stays `None` until the site is added to a [`crate::SiteStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub url: String,
    pub abbreviation: String,
    pub color: Rgba,
    /// Color picked by the user; kept alongside the favicon-derived `color`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_color: Option<Rgba>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SiteId>,
}

impl Site {
    /// Build a pending site.
    ///
    /// A color hint is used as-is. Without one, `source` is asked for the
    /// favicon color of `url`; when it has none the site gets opaque black.
    pub fn create(
        url: impl Into<String>,
        abbreviation: impl Into<String>,
        hint: Option<Rgba>,
        source: &dyn ColorSource,
    ) -> Self {
        let url = url.into();
        let color = match hint {
            Some(c) => c,
            None => source.color_for(&url).unwrap_or_default(),
        };
        Self {
            url,
            abbreviation: abbreviation.into(),
            color,
            custom_color: None,
            id: None,
        }
    }

    /// Assign `color`, or reset it to opaque black when `None`
    pub fn set_color(&mut self, color: Option<Rgba>) {
        self.color = color.unwrap_or_default();
    }

    /// The color to display: the custom color when the user picked one
    pub fn effective_color(&self) -> Rgba {
        self.custom_color.unwrap_or(self.color)
    }
}

/// Arguments for building a site through the async facade
#[derive(Debug, Clone)]
pub struct NewSite {
    pub url: String,
    pub abbreviation: String,
    pub hint: Option<Rgba>,
}

impl NewSite {
    pub fn new(url: impl Into<String>, abbreviation: impl Into<String>, hint: Option<Rgba>) -> Self {
        Self {
            url: url.into(),
            abbreviation: abbreviation.into(),
            hint,
        }
    }
}
