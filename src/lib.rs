//! Design HTML
//!
//! Turns a design page (positioned images, shapes, logos, lines, star ratings
//! and rich text, as produced by a visual editor) into a self-contained HTML
//! document with inline styles, suitable for browsers and email clients.
//!
//! # Features
//!
//! - **Pure renderers**: every element kind maps to an HTML fragment without a
//!   browser DOM; crops and masks are done in CSS, never by rasterizing
//! - **Self-contained output**: fonts and SVG sources are fetched once and
//!   inlined as data URIs
//! - **Degraded over blocked**: a broken element becomes an empty placeholder
//!   and the rest of the page still renders
//!
//! # Example
//!
//! ```no_run
//! use design_html::{generate_layout_html, model::Page, assets::MemoryFetcher, RenderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let page = Page::from_json(r#"{"width": 600, "height": 400, "children": []}"#)?;
//! let config = RenderConfig {
//!     is_exporting: true,
//!     ..Default::default()
//! };
//! let html = generate_layout_html(&page, &config, &MemoryFetcher::new()).await?;
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod assets;
pub mod document;
pub mod export;
pub mod model;
pub mod rendering;
pub mod style;

use log::debug;

use crate::assets::{prefetch_fonts, AssetFetcher};
use crate::document::{build_document, collect_fonts};
use crate::model::Page;
use crate::rendering::layout::compose_body;
use crate::rendering::RenderEnv;

/// How top-level elements are placed inside the page container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LayoutMode {
    /// Absolute `left`/`top` offsets from the page origin
    #[default]
    Absolute,
    /// Relatively positioned blocks in normal flow, placed with margins.
    /// Tolerated better by email clients that drop absolute positioning.
    Stacked,
}

/// Configuration for a render
///
/// The defaults are conservative: preview mode, absolute layout, no fetch
/// timeout and a small bound on concurrent font downloads.
///
/// # Examples
///
/// ```
/// let cfg = design_html::RenderConfig::default();
/// assert!(!cfg.is_exporting);
/// assert!(cfg.fetch_concurrency >= 2);
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Export keeps the page's natural height; preview clips to the viewport
    pub is_exporting: bool,
    pub layout_mode: LayoutMode,
    /// Upper bound on font fetches in flight
    pub fetch_concurrency: usize,
    /// Base URL that relative asset sources are resolved against
    pub asset_base_url: Option<String>,
    /// Per-request timeout for the HTTP fetcher in milliseconds
    pub timeout_ms: Option<u64>,
    /// User agent string sent by the HTTP fetcher
    pub user_agent: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            is_exporting: false,
            layout_mode: LayoutMode::Absolute,
            fetch_concurrency: num_cpus::get().max(2),
            asset_base_url: None,
            timeout_ms: None,
            user_agent: format!("design-html/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fetch_concurrency == 0 {
            return Err(Error::ConfigError("fetch_concurrency must be at least 1".into()));
        }
        if let Some(base) = &self.asset_base_url {
            url::Url::parse(base)
                .map_err(|e| Error::ConfigError(format!("asset_base_url {}: {}", base, e)))?;
        }
        Ok(())
    }
}

/// Render `page` into a complete HTML document.
///
/// Elements render concurrently while the page's fonts are prefetched.
/// Element and font failures are logged and degrade the output; only an
/// invalid page or configuration is returned as an error.
pub async fn generate_layout_html(page: &Page, config: &RenderConfig, fetcher: &dyn AssetFetcher) -> Result<String> {
    config.validate()?;
    if !page.width.is_finite() || page.width < 0.0 || !page.height.is_finite() || page.height < 0.0 {
        return Err(Error::RenderError(format!(
            "page size {}x{} is not renderable",
            page.width, page.height
        )));
    }

    let env = RenderEnv::new(config, fetcher);
    let root = page.frame();
    let fonts = collect_fonts(&page.children);
    debug!("rendering page {}x{} with {} fonts", page.width, page.height, fonts.len());

    let (body, faces) = futures::join!(
        compose_body(&page.children, &root, env),
        prefetch_fonts(&fonts, config, fetcher)
    );
    Ok(build_document(page, &body, &faces, config.is_exporting))
}

/// [`generate_layout_html`] with an HTTP fetcher built from `config`.
#[cfg(feature = "http")]
pub async fn render_page(page: &Page, config: &RenderConfig) -> Result<String> {
    let fetcher = assets::HttpFetcher::new(config)?;
    generate_layout_html(page, config, &fetcher).await
}

/// Blocking wrapper around [`render_page`] on a current-thread runtime.
#[cfg(feature = "http")]
pub fn render_page_blocking(page: &Page, config: &RenderConfig) -> Result<String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::RenderError(format!("Failed to start runtime: {}", e)))?;
    runtime.block_on(render_page(page, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryFetcher;

    #[test]
    fn default_config_is_preview_absolute() {
        let cfg = RenderConfig::default();
        assert!(!cfg.is_exporting);
        assert_eq!(cfg.layout_mode, LayoutMode::Absolute);
        assert!(cfg.timeout_ms.is_none());
        assert!(cfg.user_agent.starts_with("design-html/"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = RenderConfig {
            fetch_concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
        let cfg = RenderConfig {
            asset_base_url: Some("not a url".into()),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::ConfigError(_))));
    }

    #[tokio::test]
    async fn renders_a_page_with_an_inlined_font() {
        let page = Page::from_json(
            r#"{"width": 300, "height": 200, "children": [
                {"id": "t", "type": "text", "text": "Hello", "fontFamily": "Inter",
                 "s3FilePath": "https://fonts/inter.ttf", "width": 100, "height": 20}
            ]}"#,
        )
        .unwrap();
        let fetcher = MemoryFetcher::new().with("https://fonts/inter.ttf", b"font".to_vec());
        let html = generate_layout_html(&page, &RenderConfig::default(), &fetcher).await.unwrap();
        assert!(html.contains("font-family: 'Inter';"));
        assert!(html.contains("data:font/ttf;base64,Zm9udA=="));
        assert!(html.contains("Hello"));
    }

    #[tokio::test]
    async fn negative_page_size_fails() {
        let page = Page::from_json(r#"{"width": -1, "height": 10}"#).unwrap();
        let err = generate_layout_html(&page, &RenderConfig::default(), &MemoryFetcher::new()).await;
        assert!(matches!(err, Err(Error::RenderError(_))));
    }
}
