//! Element renderers and the layout composer.
//!
//! Each renderer turns one element into an HTML fragment sized to fill the
//! positioned wrapper that [`layout`] puts around it. Renderers see only the
//! element, an [`ElementContext`] derived by the composer and, for the ones
//! that inline SVG sources, a [`RenderEnv`] to fetch through.

pub mod effects;
pub mod image;
pub mod layout;
pub mod line;
pub mod logo;
pub mod shape;
pub mod star;
pub mod text;

use log::warn;

use crate::assets::{fetch_text, resolve_asset_url, AssetFetcher};
use crate::style::geometry::RootFrame;
use crate::style::svg::recolor_svg;
use crate::RenderConfig;

/// Values the layout composer derives for an element before rendering it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElementContext {
    /// Frame the element is positioned against.
    pub root: RootFrame,
    /// Final CSS rotation in degrees (the segment angle for lines).
    pub rotation: f64,
    /// Shadow offset rotated by `-rotation`.
    pub shadow_offset: (f64, f64),
    /// Half of `strokeBgWidth`, the part of the box stroke outside the element.
    pub stroke_outset: f64,
}

/// Configuration and fetcher shared by all renders of one page.
#[derive(Clone, Copy)]
pub struct RenderEnv<'a> {
    pub config: &'a RenderConfig,
    pub fetcher: &'a dyn AssetFetcher,
}

impl<'a> RenderEnv<'a> {
    pub fn new(config: &'a RenderConfig, fetcher: &'a dyn AssetFetcher) -> Self {
        Self { config, fetcher }
    }

    /// `src` resolved against the configured asset base, or as given.
    pub fn resolve(&self, src: &str) -> String {
        resolve_asset_url(src, self.config.asset_base_url.as_deref()).unwrap_or_else(|e| {
            warn!("{}", e);
            src.to_string()
        })
    }

    /// Fetch an SVG and inline it recolored with `fill`. Any failure falls
    /// back to the resolved URL so the element still renders.
    pub async fn recolored_svg(&self, src: &str, fill: &str) -> String {
        let url = self.resolve(src);
        let markup = match fetch_text(self.fetcher, &url).await {
            Ok(markup) => markup,
            Err(e) => {
                warn!("SVG {} not inlined: {}", url, e);
                return url;
            }
        };
        match recolor_svg(&markup, fill) {
            Ok(uri) => uri,
            Err(e) => {
                warn!("SVG {} not recolored: {}", url, e);
                url
            }
        }
    }
}
