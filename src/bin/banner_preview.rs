// Render the title and CTA banners to PNG files for a quick visual check
//
// Usage: banner_preview [config.toml] [output_dir]

use std::path::PathBuf;
use reel_compositor::{
    banner::{BannerKind, BannerRenderer, BannerStyle, FontResolver},
    config::Config,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if !path.is_empty() => Config::from_file(&path)?,
        _ => Config::default(),
    };
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)?;

    println!("🖋️  Rendering banner previews");

    let banners = &config.banners;
    let font = FontResolver::new(banners.font.clone(), banners.font_candidates.clone()).resolve();
    println!("   Font: {:?}", font.origin);

    let renderer = BannerRenderer::new(&font.face);
    for kind in [BannerKind::Title, BannerKind::Cta] {
        let (text, y) = banners.text_and_y(kind);
        let style = BannerStyle::from_config(banners, kind);
        let image = renderer.render(text, &style)?;

        let path = out_dir.join(format!("banner_{}.png", kind.name()));
        image.save(&path)?;
        println!("   ✅ {} {:?}: {}x{} at y={} -> {}",
                 kind.name(), text, image.width(), image.height(), y, path.display());
    }

    Ok(())
}
