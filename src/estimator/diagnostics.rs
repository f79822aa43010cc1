//! Deterministic image diagnostics, the quantitative basis for both
//! estimation paths.
//!
//! Pure byte-to-value transform: no I/O, no model calls, fully testable.
//! The same diagnostics feed the remote prompt (as context) and the
//! heuristic scorer (as input), so extraction runs exactly once per
//! request.

use std::collections::VecDeque;

use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use super::types::ImageDiagnostics;
use super::EstimationError;

/// A connected ink region only counts as a printed-label candidate when its
/// bounding box exceeds both of these. Filters noise specks.
const TEXT_REGION_MIN_WIDTH: u32 = 20;
const TEXT_REGION_MIN_HEIGHT: u32 = 10;

/// Extract diagnostics from raw image bytes.
///
/// Fails with `InvalidImage` when the bytes cannot be decoded into a pixel
/// grid; never returns a partial diagnostics object.
pub fn extract(image_bytes: &[u8]) -> Result<ImageDiagnostics, EstimationError> {
    let decoded =
        image::load_from_memory(image_bytes).map_err(|_| EstimationError::InvalidImage)?;
    let gray = rgb_to_gray(&decoded.to_rgb8());

    let (mean, std_dev) = luminance_stats(&gray);
    let brightness = mean / 255.0;
    let contrast = std_dev / 255.0;

    let threshold = otsu_threshold(&gray);
    let mask = binarize_inverted(&gray, threshold);
    let ink_ratio = foreground_ratio(&mask);
    let text_regions = count_text_regions(&mask);

    debug!(
        brightness,
        contrast, threshold, text_regions, ink_ratio, "Image diagnostics extracted"
    );

    Ok(ImageDiagnostics::new(
        brightness,
        contrast,
        text_regions,
        ink_ratio,
    ))
}

/// Convert RGB to grayscale using ITU-R BT.601 luminance.
///
/// The `image` crate's built-in conversion uses Rec.709 weights; the
/// diagnostics contract is defined over BT.601.
fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = (rgb.width(), rgb.height());
    let mut gray = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let p = rgb.get_pixel(x, y);
            let luma = (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
                as u8;
            gray.put_pixel(x, y, Luma([luma]));
        }
    }
    gray
}

/// Mean and standard deviation of grayscale pixel intensities.
fn luminance_stats(img: &GrayImage) -> (f64, f64) {
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut count = 0u64;

    for pixel in img.pixels() {
        let val = pixel.0[0] as f64;
        sum += val;
        sum_sq += val * val;
        count += 1;
    }

    if count == 0 {
        return (0.0, 0.0);
    }

    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64) - (mean * mean);
    (mean, variance.max(0.0).sqrt())
}

/// Variance-maximizing (Otsu) threshold over the 256-bin luminance
/// histogram. Returns the threshold with the highest between-class
/// variance; ties keep the lowest candidate.
fn otsu_threshold(img: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in img.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total = (img.width() as u64) * (img.height() as u64);
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(value, &count)| value as f64 * count as f64)
        .sum();

    let mut background_count = 0u64;
    let mut background_sum = 0.0f64;
    let mut best_threshold = 0u8;
    let mut best_variance = 0.0f64;

    for t in 0..256usize {
        background_count += histogram[t];
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }

        background_sum += t as f64 * histogram[t] as f64;
        let mean_background = background_sum / background_count as f64;
        let mean_foreground = (weighted_total - background_sum) / foreground_count as f64;

        let diff = mean_background - mean_foreground;
        let variance = background_count as f64 * foreground_count as f64 * diff * diff;
        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }

    best_threshold
}

/// Binarize with the threshold, inverted so ink (dark) is foreground (255).
fn binarize_inverted(img: &GrayImage, threshold: u8) -> GrayImage {
    let mut mask = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let value = if pixel.0[0] > threshold { 0 } else { 255 };
        mask.put_pixel(x, y, Luma([value]));
    }
    mask
}

/// Mean of the binary mask / 255: the share of foreground pixels.
fn foreground_ratio(mask: &GrayImage) -> f64 {
    let total = (mask.width() as u64) * (mask.height() as u64);
    if total == 0 {
        return 0.0;
    }
    let foreground = mask.pixels().filter(|p| p.0[0] == 255).count() as u64;
    foreground as f64 / total as f64
}

/// Count connected foreground regions whose bounding box is large enough to
/// be printed text.
///
/// Regions are grown with an 8-connected BFS over a visited grid; each
/// region's bounding box is accumulated during the walk.
fn count_text_regions(mask: &GrayImage) -> usize {
    let (w, h) = mask.dimensions();
    let mut visited = vec![false; (w as usize) * (h as usize)];
    let mut queue = VecDeque::new();
    let mut regions = 0usize;

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if visited[idx] || mask.get_pixel(x, y).0[0] == 0 {
                continue;
            }

            // Grow a region from this unvisited seed, tracking its box.
            let (mut min_x, mut max_x, mut min_y, mut max_y) = (x, x, y, y);
            visited[idx] = true;
            queue.push_back((x, y));

            while let Some((cx, cy)) = queue.pop_front() {
                min_x = min_x.min(cx);
                max_x = max_x.max(cx);
                min_y = min_y.min(cy);
                max_y = max_y.max(cy);

                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = cx as i64 + dx;
                        let ny = cy as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        let nidx = (ny * w + nx) as usize;
                        if !visited[nidx] && mask.get_pixel(nx, ny).0[0] == 255 {
                            visited[nidx] = true;
                            queue.push_back((nx, ny));
                        }
                    }
                }
            }

            let box_w = max_x - min_x + 1;
            let box_h = max_y - min_y + 1;
            if box_w > TEXT_REGION_MIN_WIDTH && box_h > TEXT_REGION_MIN_HEIGHT {
                regions += 1;
            }
        }
    }

    regions
}
