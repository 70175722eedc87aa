//! CPU rendering backend for the pixel graph.
//!
//! A [`RenderContext`] owns the worker pool every render runs on. It holds no
//! per-render state, so one `Arc<RenderContext>` can serve any number of
//! concurrent renders.

use crate::{
    FilterError, FilterResult,
    graph::{LUMA_WEIGHTS, Node},
};
use derivative::Derivative;
use derive_setters::Setters;
use image::Rgba32FImage;
use rayon::prelude::*;
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

const CHANNELS: usize = 4;

/// Cooperative cancellation flag shared between a render and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancel_sig: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel_sig.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_sig.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> FilterResult<()> {
        if self.is_cancelled() {
            Err(FilterError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ContextConfig {
    /// 0 lets rayon pick one thread per core
    #[derivative(Default(value = "0"))]
    pub worker_threads: usize,

    #[derivative(Default(value = "\"photo-filter\".to_string()"))]
    pub thread_name: String,
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct RenderContext {
    pool: rayon::ThreadPool,
}

impl RenderContext {
    pub fn new(config: ContextConfig) -> FilterResult<Self> {
        let thread_name = config.thread_name;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(move |index| format!("{thread_name}-{index}"))
            .build()?;

        log::debug!("render context ready with {} workers", pool.current_num_threads());

        Ok(Self { pool })
    }

    pub fn worker_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Materializes `node` into a buffer sized to its extent.
    ///
    /// Samples are clamped to [0, 1]. Fails when the extent is empty or the
    /// graph evaluates to non-finite samples.
    pub fn render(&self, node: &Node, cancel: &CancelToken) -> FilterResult<Rgba32FImage> {
        let extent = node.extent();
        if extent.is_empty() {
            return Err(FilterError::Render(format!(
                "graph has an empty extent ({}x{})",
                extent.width, extent.height
            )));
        }

        let start = Instant::now();
        let mut buffer = self.pool.install(|| self.eval(node, cancel))?;

        if buffer.dimensions() != (extent.width, extent.height) {
            return Err(FilterError::Render(format!(
                "rendered {:?} but graph extent is {}x{}",
                buffer.dimensions(),
                extent.width,
                extent.height
            )));
        }

        let samples: &mut [f32] = &mut buffer;
        let finite = self.pool.install(|| {
            samples.par_iter_mut().all(|sample| {
                let finite = sample.is_finite();
                *sample = sample.clamp(0.0, 1.0);
                finite
            })
        });
        if !finite {
            return Err(FilterError::Render(
                "graph produced non-finite samples".to_string(),
            ));
        }

        log::debug!(
            "rendered {}x{} {} graph in {:.2?}",
            extent.width,
            extent.height,
            node.label(),
            start.elapsed()
        );

        Ok(buffer)
    }

    fn eval(&self, node: &Node, cancel: &CancelToken) -> FilterResult<Rgba32FImage> {
        cancel.check()?;
        log::trace!("evaluating {} node", node.label());

        match node {
            Node::Source(image) => Ok(image.as_ref().clone()),

            Node::ColorMatrix { input, matrix } => {
                let mut buffer = self.eval(input, cancel)?;
                map_pixels(&mut buffer, cancel, |pixel| matrix.apply(pixel))?;
                Ok(buffer)
            }

            Node::ToneCurve { input, curve } => {
                let mut buffer = self.eval(input, cancel)?;
                map_pixels(&mut buffer, cancel, |pixel| curve.apply(pixel))?;
                Ok(buffer)
            }

            Node::Bloom {
                input,
                radius,
                intensity,
            } => {
                let mut buffer = self.eval(input, cancel)?;
                let glow = gaussian_blur(&buffer, *radius, cancel)?;
                let intensity = *intensity;

                // screen blend of the glow, weighted by intensity
                zip_pixels(&mut buffer, &glow, cancel, |pixel, glow| {
                    for channel in 0..3 {
                        pixel[channel] += intensity * glow[channel] * (1.0 - pixel[channel]);
                    }
                })?;
                Ok(buffer)
            }

            Node::SharpenLuminance {
                input,
                radius,
                sharpness,
            } => {
                let mut buffer = self.eval(input, cancel)?;
                let blurred = gaussian_blur(&buffer, *radius, cancel)?;
                let sharpness = *sharpness;

                zip_pixels(&mut buffer, &blurred, cancel, |pixel, blurred| {
                    let detail = luma(pixel) - luma(blurred);
                    for value in pixel.iter_mut().take(3) {
                        *value += sharpness * detail;
                    }
                })?;
                Ok(buffer)
            }

            Node::ConstantAlpha { input, alpha } => {
                let mut buffer = self.eval(input, cancel)?;
                let alpha = *alpha;
                map_pixels(&mut buffer, cancel, |pixel| pixel[3] = alpha)?;
                Ok(buffer)
            }

            Node::SourceOver {
                foreground,
                background,
            } => {
                let mut buffer = self.eval(background, cancel)?;
                let foreground = self.eval(foreground, cancel)?;
                zip_pixels(&mut buffer, &foreground, cancel, |pixel, fg| {
                    source_over(fg, pixel)
                })?;
                Ok(buffer)
            }
        }
    }
}

fn luma(pixel: &[f32]) -> f32 {
    pixel[0] * LUMA_WEIGHTS[0] + pixel[1] * LUMA_WEIGHTS[1] + pixel[2] * LUMA_WEIGHTS[2]
}

/// Straight-alpha `fg` over `bg`, written into `bg`.
fn source_over(fg: &[f32], bg: &mut [f32]) {
    let fg_alpha = fg[3];
    let bg_alpha = bg[3];
    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha.abs() <= f32::EPSILON {
        bg.fill(0.0);
        return;
    }

    for channel in 0..3 {
        bg[channel] = (fg[channel] * fg_alpha + bg[channel] * bg_alpha * (1.0 - fg_alpha))
            / out_alpha;
    }
    bg[3] = out_alpha;
}

fn map_pixels<F>(buffer: &mut Rgba32FImage, cancel: &CancelToken, f: F) -> FilterResult<()>
where
    F: Fn(&mut [f32]) + Sync,
{
    let row_len = buffer.width() as usize * CHANNELS;
    buffer.par_chunks_mut(row_len).for_each(|row| {
        if cancel.is_cancelled() {
            return;
        }
        row.chunks_exact_mut(CHANNELS).for_each(&f);
    });

    cancel.check()
}

fn zip_pixels<F>(
    buffer: &mut Rgba32FImage,
    other: &Rgba32FImage,
    cancel: &CancelToken,
    f: F,
) -> FilterResult<()>
where
    F: Fn(&mut [f32], &[f32]) + Sync,
{
    if buffer.dimensions() != other.dimensions() {
        return Err(FilterError::Render(format!(
            "cannot combine {:?} with {:?}",
            buffer.dimensions(),
            other.dimensions()
        )));
    }

    let row_len = buffer.width() as usize * CHANNELS;
    buffer
        .par_chunks_mut(row_len)
        .zip(other.par_chunks(row_len))
        .for_each(|(row, other_row)| {
            if cancel.is_cancelled() {
                return;
            }
            for (pixel, other_pixel) in row
                .chunks_exact_mut(CHANNELS)
                .zip(other_row.chunks_exact(CHANNELS))
            {
                f(pixel, other_pixel);
            }
        });

    cancel.check()
}

/// Normalized 1D gaussian, 6 sigma wide and always odd.
///
/// The half-width never exceeds `max_half`: with clamped edges, taps past the
/// far side of the image only repeat the edge pixel.
fn gaussian_kernel(sigma: f32, max_half: usize) -> Vec<f32> {
    if !sigma.is_finite() || sigma <= 0.0 || max_half == 0 {
        return vec![1.0];
    }

    let sigma = f64::from(sigma);
    let half = (sigma * 3.0).ceil().min(max_half as f64) as usize;
    let mut kernel: Vec<f64> = (0..=2 * half)
        .map(|i| {
            let x = i as f64 - half as f64;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|weight| *weight /= sum);
    kernel.into_iter().map(|weight| weight as f32).collect()
}

/// Separable gaussian blur with clamped edges. `sigma <= 0` copies the input.
fn gaussian_blur(
    image: &Rgba32FImage,
    sigma: f32,
    cancel: &CancelToken,
) -> FilterResult<Rgba32FImage> {
    let max_half = image.width().max(image.height()) as usize;
    let kernel = gaussian_kernel(sigma, max_half);
    if kernel.len() == 1 {
        return Ok(image.clone());
    }

    let (width, height) = (image.width() as usize, image.height() as usize);
    let half = (kernel.len() / 2) as isize;
    let row_len = width * CHANNELS;
    let source: &[f32] = image;

    let mut horizontal = vec![0.0f32; source.len()];
    horizontal
        .par_chunks_mut(row_len)
        .zip(source.par_chunks(row_len))
        .for_each(|(out_row, in_row)| {
            if cancel.is_cancelled() {
                return;
            }
            for x in 0..width {
                let mut acc = [0.0f32; CHANNELS];
                for (k, weight) in kernel.iter().enumerate() {
                    let sx = (x as isize + k as isize - half).clamp(0, width as isize - 1) as usize;
                    for c in 0..CHANNELS {
                        acc[c] += weight * in_row[sx * CHANNELS + c];
                    }
                }
                out_row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
            }
        });
    cancel.check()?;

    let mut vertical = vec![0.0f32; source.len()];
    vertical
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, out_row)| {
            if cancel.is_cancelled() {
                return;
            }
            for (k, weight) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - half).clamp(0, height as isize - 1) as usize;
                let in_row = &horizontal[sy * row_len..(sy + 1) * row_len];
                for (out, value) in out_row.iter_mut().zip(in_row.iter()) {
                    *out += weight * value;
                }
            }
        });
    cancel.check()?;

    Rgba32FImage::from_raw(image.width(), image.height(), vertical)
        .ok_or_else(|| FilterError::Render("blur produced a malformed buffer".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ColorMatrix, Extent};
    use image::Rgba;

    fn context() -> RenderContext {
        RenderContext::new(ContextConfig::new().with_worker_threads(2)).unwrap()
    }

    fn solid(width: u32, height: u32, pixel: [f32; 4]) -> Node {
        Node::source(Rgba32FImage::from_pixel(width, height, Rgba(pixel)))
    }

    #[test]
    fn test_kernel_is_normalized() {
        let kernel = gaussian_kernel(2.5, 64);
        assert_eq!(kernel.len() % 2, 1);
        assert!((kernel.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        assert_eq!(gaussian_kernel(0.0, 64), vec![1.0]);
        assert_eq!(gaussian_kernel(-3.0, 64), vec![1.0]);
        assert_eq!(gaussian_kernel(2.5, 0), vec![1.0]);
    }

    #[test]
    fn test_kernel_width_is_capped() {
        assert_eq!(gaussian_kernel(1e4, 8).len(), 17);
        assert_eq!(gaussian_kernel(f32::MAX, 3).len(), 7);

        let tiny = gaussian_kernel(1e-30, 8);
        assert!(tiny.iter().all(|weight| weight.is_finite()));
        assert!((tiny.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_blur_keeps_flat_image() {
        let image = Rgba32FImage::from_pixel(5, 4, Rgba([0.4, 0.5, 0.6, 1.0]));

        for sigma in [3.0, 1e6, f32::MAX] {
            let out = gaussian_blur(&image, sigma, &CancelToken::new()).unwrap();
            for pixel in out.pixels() {
                assert!((pixel[0] - 0.4).abs() < 1e-4);
                assert!((pixel[2] - 0.6).abs() < 1e-4);
                assert!((pixel[3] - 1.0).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_source_over_constant_alpha_is_lerp() {
        let background = solid(2, 2, [0.2, 0.4, 0.6, 1.0]);
        let foreground = solid(2, 2, [1.0, 0.0, 0.5, 1.0]).constant_alpha(0.25);
        let node = foreground.source_over(background).unwrap();
        let out = context().render(&node, &CancelToken::new()).unwrap();

        let pixel = out.get_pixel(1, 1);
        assert!((pixel[0] - (0.25 * 1.0 + 0.75 * 0.2)).abs() < 1e-5);
        assert!((pixel[1] - (0.75 * 0.4)).abs() < 1e-5);
        assert!((pixel[2] - (0.25 * 0.5 + 0.75 * 0.6)).abs() < 1e-5);
        assert!((pixel[3] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_transparent_over_transparent() {
        let node = solid(1, 1, [1.0, 1.0, 1.0, 1.0])
            .constant_alpha(0.0)
            .source_over(solid(1, 1, [0.5, 0.5, 0.5, 0.0]))
            .unwrap();
        let out = context().render(&node, &CancelToken::new()).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_render_clamps_samples() {
        let node = solid(2, 1, [0.8, 0.5, 0.1, 1.0])
            .color_matrix(ColorMatrix::channel_gains(2.0, 1.0, -1.0));
        let out = context().render(&node, &CancelToken::new()).unwrap();
        assert_eq!(out.get_pixel(0, 0).0, [1.0, 0.5, 0.0, 1.0]);
    }

    #[test]
    fn test_empty_extent_is_render_error() {
        let node = Node::source(Rgba32FImage::new(0, 0));
        assert_eq!(node.extent(), Extent::new(0, 0));
        assert!(matches!(
            context().render(&node, &CancelToken::new()),
            Err(FilterError::Render(_))
        ));
    }

    #[test]
    fn test_non_finite_output_is_render_error() {
        let node = solid(2, 2, [0.5, 0.5, 0.5, 1.0])
            .color_matrix(ColorMatrix::channel_gains(f32::NAN, 1.0, 1.0));
        assert!(matches!(
            context().render(&node, &CancelToken::new()),
            Err(FilterError::Render(_))
        ));
    }

    #[test]
    fn test_cancelled_render() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let node = solid(4, 4, [0.5, 0.5, 0.5, 1.0]).bloom(1.0, 0.5);
        assert!(matches!(
            context().render(&node, &cancel),
            Err(FilterError::Cancelled)
        ));
    }

    #[test]
    fn test_named_worker_threads() {
        let context = RenderContext::new(
            ContextConfig::new()
                .with_worker_threads(3)
                .with_thread_name("preview".to_string()),
        )
        .unwrap();
        assert_eq!(context.worker_threads(), 3);
    }
}
