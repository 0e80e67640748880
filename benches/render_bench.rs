use criterion::{criterion_group, criterion_main, Criterion};

use design_html::assets::MemoryFetcher;
use design_html::model::pages_from_json;
use design_html::rendering::layout::resolve_groups;
use design_html::style::svg::recolor_svg_markup;
use design_html::{generate_layout_html, RenderConfig};

fn bench_render_page(c: &mut Criterion) {
    let json = std::fs::read_to_string("tests/goldens/pages/page1.json").expect("read fixture");
    let page = pages_from_json(&json).expect("parse fixture").remove(0);
    let config = RenderConfig {
        is_exporting: true,
        ..Default::default()
    };
    let fetcher = MemoryFetcher::new();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    c.bench_function("generate_layout_html", |b| {
        b.iter(|| {
            let _ = runtime.block_on(generate_layout_html(&page, &config, &fetcher)).unwrap();
        })
    });

    c.bench_function("resolve_groups", |b| {
        b.iter(|| resolve_groups(&page.children).len())
    });
}

fn bench_recolor_svg(c: &mut Criterion) {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100"><defs><linearGradient id="g"><stop offset="0" stop-color="#fff"/></linearGradient></defs><path d="M0 0h100v100H0z" fill="#123456" style="stroke: #000; stroke-width: 2"/><circle cx="50" cy="50" r="20" fill="url(#g)"/></svg>"##;
    c.bench_function("recolor_svg_markup", |b| {
        b.iter(|| recolor_svg_markup(svg, "#ff0000").unwrap())
    });
}

criterion_group!(benches, bench_render_page, bench_recolor_svg);
criterion_main!(benches);
