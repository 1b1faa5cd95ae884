//! Resize policies for the five fit modes.
//!
//! Every mode refuses to upscale: a target larger than the source collapses
//! to the source dimensions (per axis for `fill`, as a scale clamp for the
//! proportional modes). When only one of width/height is supplied the other
//! is derived from the source aspect ratio.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

use crate::options::FitMode;

const FILTER: FilterType = FilterType::Lanczos3;

/// Apply the requested resize. `width`/`height` must not both be `None`.
pub fn apply(
    img: DynamicImage,
    width: Option<u32>,
    height: Option<u32>,
    fit: FitMode,
) -> DynamicImage {
    let (sw, sh) = img.dimensions();
    let (tw, th) = target_box(sw, sh, width, height);

    match fit {
        FitMode::Cover => {
            let scale = f64::from(tw) / f64::from(sw);
            let scale = scale.max(f64::from(th) / f64::from(sh));
            if scale >= 1.0 {
                img
            } else {
                img.resize_to_fill(tw, th, FILTER)
            }
        }
        FitMode::Contain => {
            let scale = shrink_scale(sw, sh, tw, th);
            let scaled = if scale < 1.0 {
                img.resize_exact(scaled_dim(sw, scale), scaled_dim(sh, scale), FILTER)
            } else {
                img
            };
            letterbox(scaled, tw, th)
        }
        FitMode::Fill => {
            let (fw, fh) = (tw.min(sw), th.min(sh));
            if (fw, fh) == (sw, sh) {
                img
            } else {
                img.resize_exact(fw, fh, FILTER)
            }
        }
        FitMode::Inside => {
            if sw <= tw && sh <= th {
                img
            } else {
                img.resize(tw, th, FILTER)
            }
        }
        FitMode::Outside => {
            let scale = f64::from(tw) / f64::from(sw);
            let scale = scale.max(f64::from(th) / f64::from(sh));
            if scale >= 1.0 {
                img
            } else {
                img.resize_exact(scaled_dim(sw, scale), scaled_dim(sh, scale), FILTER)
            }
        }
    }
}

/// Resolve the target box, deriving a missing dimension from the aspect
/// ratio. Falls back to the source dimensions if neither was supplied.
fn target_box(sw: u32, sh: u32, width: Option<u32>, height: Option<u32>) -> (u32, u32) {
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, derive(sh, sw, w)),
        (None, Some(h)) => (derive(sw, sh, h), h),
        (None, None) => (sw, sh),
    }
}

fn derive(other_src: u32, given_src: u32, given_target: u32) -> u32 {
    let ratio = f64::from(given_target) / f64::from(given_src);
    scaled_dim(other_src, ratio)
}

fn shrink_scale(sw: u32, sh: u32, tw: u32, th: u32) -> f64 {
    let scale = f64::from(tw) / f64::from(sw);
    scale.min(f64::from(th) / f64::from(sh)).min(1.0)
}

fn scaled_dim(dim: u32, scale: f64) -> u32 {
    ((f64::from(dim) * scale).round() as u32).max(1)
}

/// Center an image on an opaque black canvas of exactly `tw` x `th`.
fn letterbox(img: DynamicImage, tw: u32, th: u32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if (w, h) == (tw, th) {
        return img;
    }
    let mut canvas = RgbaImage::from_pixel(tw, th, image::Rgba([0, 0, 0, 255]));
    let x = i64::from((tw.saturating_sub(w)) / 2);
    let y = i64::from((th.saturating_sub(h)) / 2);
    image::imageops::overlay(&mut canvas, &img.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}
