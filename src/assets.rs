//! Asset fetching and inlining.
//!
//! Fonts and SVG sources referenced by a page are fetched through an
//! [`AssetFetcher`] and embedded as data URIs so the produced document has no
//! external references left except raster images.

use std::collections::HashMap;
#[cfg(feature = "http")]
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use log::{debug, warn};
use url::Url;

use crate::{Error, RenderConfig, Result};

/// Source of remote bytes.
///
/// Implementations must be shareable across the concurrent per-element
/// renders of one page.
pub trait AssetFetcher: Send + Sync {
    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// Fetcher backed by an async `reqwest` client.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new(config: &RenderConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl AssetFetcher for HttpFetcher {
    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        async move {
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::NetworkError(format!("{}: {}", url, e)))?;
            if !resp.status().is_success() {
                return Err(Error::NetworkError(format!("{}: HTTP {}", url, resp.status())));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| Error::NetworkError(format!("{}: {}", url, e)))?;
            Ok(bytes.to_vec())
        }
        .boxed()
    }
}

/// In-memory URL to bytes map. Unknown URLs fail with `NetworkError`.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> &mut Self {
        self.assets.insert(url.into(), bytes.into());
        self
    }

    pub fn with(mut self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl AssetFetcher for MemoryFetcher {
    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        let found = self
            .assets
            .get(url)
            .cloned()
            .ok_or_else(|| Error::NetworkError(format!("{}: not found", url)));
        futures::future::ready(found).boxed()
    }
}

/// Fetches nothing; every remote URL fails. `data:` URIs still resolve
/// through [`fetch_asset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineFetcher;

impl AssetFetcher for OfflineFetcher {
    fn fetch_bytes<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        futures::future::ready(Err(Error::NetworkError(format!("{}: offline", url)))).boxed()
    }
}

/// Fetch `url`, decoding `data:` URIs locally.
pub async fn fetch_asset(fetcher: &dyn AssetFetcher, url: &str) -> Result<Vec<u8>> {
    if url.starts_with("data:") {
        return decode_data_uri(url).map(|(_, bytes)| bytes);
    }
    fetcher.fetch_bytes(url).await
}

pub async fn fetch_text(fetcher: &dyn AssetFetcher, url: &str) -> Result<String> {
    let bytes = fetch_asset(fetcher, url).await?;
    String::from_utf8(bytes).map_err(|e| Error::NetworkError(format!("{}: not UTF-8: {}", url, e)))
}

/// Split a `data:` URI into its media type and decoded payload.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| Error::ParseError(format!("not a data URI: {:.32}", uri)))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| Error::ParseError("data URI without payload".to_string()))?;
    let (mime, is_base64) = match meta.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (meta, false),
    };
    let mime = if mime.is_empty() { "text/plain" } else { mime };
    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| Error::ParseError(format!("bad base64 in data URI: {}", e)))?
    } else {
        percent_decode(payload)
    };
    Ok((mime.to_string(), bytes))
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(v) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Resolve a possibly relative asset reference against `base`.
///
/// Absolute URLs and `data:` URIs are returned unchanged, as are relative
/// references when there is no base to resolve against.
pub fn resolve_asset_url(src: &str, base: Option<&str>) -> Result<String> {
    if src.starts_with("data:") || Url::parse(src).is_ok() {
        return Ok(src.to_string());
    }
    match base {
        Some(base) => {
            let base = Url::parse(base)
                .map_err(|e| Error::ConfigError(format!("invalid asset base URL {}: {}", base, e)))?;
            base.join(src)
                .map(|u| u.to_string())
                .map_err(|e| Error::ParseError(format!("cannot resolve {}: {}", src, e)))
        }
        None => Ok(src.to_string()),
    }
}

/// MIME type and `format()` hint for a font file, chosen by extension.
pub fn font_format(source: &str) -> (&'static str, &'static str) {
    let path = source.split(['?', '#']).next().unwrap_or(source).to_ascii_lowercase();
    if path.ends_with(".woff2") {
        ("font/woff2", "woff2")
    } else if path.ends_with(".woff") {
        ("font/woff", "woff")
    } else if path.ends_with(".otf") {
        ("font/otf", "opentype")
    } else {
        ("font/ttf", "truetype")
    }
}

/// A font family ready to be declared with `@font-face`.
#[derive(Debug, Clone, PartialEq)]
pub struct FontAsset {
    pub family: String,
    pub data_uri: String,
    pub format: &'static str,
}

/// Fetch every `(family, source)` pair with at most `config.fetch_concurrency`
/// requests in flight. Output order follows input order; failed fetches are
/// logged and left out.
pub async fn prefetch_fonts(
    fonts: &[(String, String)],
    config: &RenderConfig,
    fetcher: &dyn AssetFetcher,
) -> Vec<FontAsset> {
    let base = config.asset_base_url.as_deref();
    let results: Vec<Option<FontAsset>> = stream::iter(fonts.iter())
        .map(|(family, source)| async move {
            let url = match resolve_asset_url(source, base) {
                Ok(url) => url,
                Err(e) => {
                    warn!("font {}: {}", family, e);
                    return None;
                }
            };
            match fetch_asset(fetcher, &url).await {
                Ok(bytes) => {
                    let (mime, format) = font_format(source);
                    debug!("font {} inlined ({} bytes)", family, bytes.len());
                    Some(FontAsset {
                        family: family.clone(),
                        data_uri: data_uri(mime, &bytes),
                        format,
                    })
                }
                Err(e) => {
                    warn!("font {} skipped: {}", family, e);
                    None
                }
            }
        })
        .buffered(config.fetch_concurrency.max(1))
        .collect()
        .await;
    results.into_iter().flatten().collect()
}
