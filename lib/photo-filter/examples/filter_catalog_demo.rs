/// Renders every catalog filter at a few intensities
/// Run `create_test_image` first to produce data/test.png
use image::ImageReader;
use photo_filter::{ContextConfig, FilterCatalog, FilterEngine, Photo, RenderContext};
use std::{path::Path, sync::Arc, time::Instant};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let output_dir = Path::new("tmp/filters");
    std::fs::create_dir_all(output_dir)?;

    let img_path = Path::new("data/test.png");
    let photo = Photo::new(ImageReader::open(img_path)?.decode()?);

    let context = RenderContext::new(ContextConfig::new())?;
    let engine = FilterEngine::new(Arc::new(context));

    println!(
        "{:<12} {:<10} {:>10} {:>12}",
        "Filter", "Class", "Intensity", "Time (ms)"
    );
    println!("{}", "-".repeat(48));

    for kind in FilterCatalog::all_kinds() {
        for intensity in [0.25, 0.5, 1.0] {
            let start = Instant::now();
            let out = engine.apply(&photo, *kind, intensity)?;
            let elapsed = start.elapsed();

            let filename = format!("{}_{:03}.png", kind.id(), (intensity * 100.0) as i32);
            out.to_rgba8().save(output_dir.join(&filename))?;

            println!(
                "{:<12} {:<10} {:>10.2} {:>12.2}",
                FilterCatalog::display_name(*kind),
                format!("{:?}", kind.class()),
                intensity,
                elapsed.as_secs_f64() * 1000.0
            );
        }
    }

    println!("\n✓ Images saved to: {}", output_dir.display());

    Ok(())
}
