/// Walks an edit session the way a slider-driven UI would
use image::ImageReader;
use photo_filter::{
    ContextConfig, EditSession, FilterEngine, FilterError, FilterKind, Photo, PreviewRenderer,
    RenderContext,
};
use std::{path::Path, sync::Arc};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let img_path = Path::new("data/test.png");
    let photo = Photo::new(ImageReader::open(img_path)?.decode()?);

    let context = Arc::new(RenderContext::new(ContextConfig::new())?);
    let engine = FilterEngine::new(context);

    // Slider drags: only the last preview is expected to survive
    let preview = Arc::new(PreviewRenderer::new(engine.clone()));
    let handles: Vec<_> = (1..=5)
        .map(|step| {
            let preview = preview.clone();
            let photo = photo.clone();
            std::thread::spawn(move || {
                let intensity = step as f32 / 5.0;
                (intensity, preview.render(&photo, FilterKind::Bloom, intensity))
            })
        })
        .collect();

    for handle in handles {
        match handle.join() {
            Ok((intensity, Ok(_))) => println!("preview at {intensity:.1} finished"),
            Ok((intensity, Err(FilterError::Cancelled))) => {
                println!("preview at {intensity:.1} superseded")
            }
            Ok((_, Err(e))) => return Err(e.into()),
            Err(_) => anyhow::bail!("preview thread panicked"),
        }
    }

    let mut session = EditSession::new(engine);
    session.load(photo);
    session.select_filter(FilterKind::Sepia)?;
    session.set_intensity(0.65)?;
    println!("{}", session.intensity_label());

    if let Some(out) = session.exportable() {
        out.to_rgba8().save(output_dir.join("session_sepia.png"))?;
        println!("✓ Exported: tmp/session_sepia.png");
    }

    Ok(())
}
