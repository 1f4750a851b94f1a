//! Favicon color sampling.
//!
//! A [`ColorSource`] turns a site URL into a representative accent color.
//! [`FaviconSampler`] fetches `<origin>/favicon.ico` over HTTP, decodes it and
//! averages the visible pixels. Every failure along the way (malformed URL,
//! network error, non-2xx status, oversized body, undecodable image) yields
//! `None` so callers can fall back to the default color.

use crate::Rgba;

#[cfg(feature = "favicon")]
use crate::{Error, RelayConfig, Result};
#[cfg(feature = "favicon")]
use log::{debug, warn};
#[cfg(feature = "favicon")]
use reqwest::blocking::Client;
#[cfg(feature = "favicon")]
use std::io::Read;
#[cfg(feature = "favicon")]
use std::time::Duration;

/// Something that can derive an accent color for a site URL
pub trait ColorSource: Send {
    /// Representative color for `url`, or `None` when none can be derived
    fn color_for(&self, url: &str) -> Option<Rgba>;
}

/// A source that never has a color; sites fall back to the default
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColorSource;

impl ColorSource for NoColorSource {
    fn color_for(&self, _url: &str) -> Option<Rgba> {
        None
    }
}

/// Fetches and samples favicons over HTTP.
///
/// Uses a blocking client, so it must not be called from inside an async
/// runtime; the async facade runs it on its worker thread.
#[cfg(feature = "favicon")]
pub struct FaviconSampler {
    client: Client,
    config: RelayConfig,
}

#[cfg(feature = "favicon")]
impl FaviconSampler {
    pub fn new(config: RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                Error::InitializationError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    fn fetch(&self, favicon: &url::Url) -> Option<Vec<u8>> {
        let mut req = self
            .client
            .get(favicon.as_str())
            .header("User-Agent", self.config.user_agent.clone());
        for (k, v) in &self.config.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        let resp = req
            .send()
            .map_err(|e| debug!("Favicon fetch failed for {}: {}", favicon, e))
            .ok()?;
        if !resp.status().is_success() {
            debug!("Favicon fetch for {} returned {}", favicon, resp.status());
            return None;
        }

        let limit = self.config.max_favicon_bytes;
        let mut body = Vec::new();
        resp.take(limit as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|e| debug!("Failed to read favicon body from {}: {}", favicon, e))
            .ok()?;
        if body.len() > limit {
            warn!("Favicon at {} exceeds {} bytes; ignoring", favicon, limit);
            return None;
        }
        Some(body)
    }
}

#[cfg(feature = "favicon")]
impl ColorSource for FaviconSampler {
    fn color_for(&self, url: &str) -> Option<Rgba> {
        let Some(favicon) = favicon_url(url, &self.config.favicon_path) else {
            debug!("No favicon location for {:?}", url);
            return None;
        };
        let bytes = self.fetch(&favicon)?;
        let color = sample_color(&bytes);
        if color.is_none() {
            warn!("Favicon at {} could not be sampled", favicon);
        }
        color
    }
}

/// Resolve the favicon location under the origin of an http(s) page URL.
///
/// `favicon_path` is always taken as a path on that origin, with or without
/// a leading slash; it can never point the fetch at another host.
#[cfg(feature = "favicon")]
pub fn favicon_url(page_url: &str, favicon_path: &str) -> Option<url::Url> {
    let base = url::Url::parse(page_url).ok()?;
    match base.scheme() {
        "http" | "https" => {
            let origin = base.join("/").ok()?;
            origin
                .join(&format!("/{}", favicon_path.trim_start_matches('/')))
                .ok()
        }
        _ => None,
    }
}

/// Average the visible pixels of an encoded image.
///
/// Channels are weighted by pixel alpha so transparent padding around an
/// icon does not wash the result out. The returned alpha is always 255.
/// Returns `None` if the bytes do not decode or no pixel is visible.
#[cfg(feature = "favicon")]
pub fn sample_color(bytes: &[u8]) -> Option<Rgba> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| debug!("Failed to decode favicon: {}", e))
        .ok()?
        .to_rgba8();

    let (mut red, mut green, mut blue, mut weight) = (0u64, 0u64, 0u64, 0u64);
    for px in img.pixels() {
        let [r, g, b, a] = px.0;
        let a = a as u64;
        red += r as u64 * a;
        green += g as u64 * a;
        blue += b as u64 * a;
        weight += a;
    }
    if weight == 0 {
        return None;
    }

    let avg = |sum: u64| ((sum + weight / 2) / weight) as u8;
    Some(Rgba::opaque(avg(red), avg(green), avg(blue)))
}
