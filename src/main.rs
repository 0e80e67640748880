use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use design_html::export::{extract_image_descriptors, minify_inline_styles};
use design_html::model::pages_from_json;
use design_html::{render_page, LayoutMode, RenderConfig};

/// Render a design page JSON file to a self-contained HTML document
#[derive(Parser, Debug)]
#[command(name = "design-html", version, about)]
struct Args {
    /// Page JSON, or an API envelope `{"data": [page, ...]}`
    input: PathBuf,

    /// Write the document here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export mode: keep the natural page height
    #[arg(long)]
    export: bool,

    /// Place elements in normal flow with margins instead of absolute offsets
    #[arg(long)]
    stacked: bool,

    /// Strip whitespace from inline styles
    #[arg(long)]
    minify: bool,

    /// Page to render when the input holds several
    #[arg(long, default_value_t = 0)]
    page_index: usize,

    /// Base URL for relative asset sources
    #[arg(long)]
    asset_base: Option<String>,

    /// Per-request asset fetch timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the document's image descriptors as JSON instead of the HTML
    #[arg(long)]
    list_images: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let json = fs::read_to_string(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    let mut pages = pages_from_json(&json)?;
    if args.page_index >= pages.len() {
        bail!("page {} requested but the input has {} page(s)", args.page_index, pages.len());
    }
    let page = pages.swap_remove(args.page_index);

    let config = RenderConfig {
        is_exporting: args.export,
        layout_mode: if args.stacked { LayoutMode::Stacked } else { LayoutMode::Absolute },
        asset_base_url: args.asset_base,
        timeout_ms: args.timeout_ms,
        ..Default::default()
    };

    let mut html = render_page(&page, &config).await?;
    if args.minify {
        html = minify_inline_styles(&html);
    }

    let out = if args.list_images {
        serde_json::to_string_pretty(&extract_image_descriptors(&html)?)?
    } else {
        html
    };

    match args.output {
        Some(path) => fs::write(&path, out).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", out),
    }
    Ok(())
}
