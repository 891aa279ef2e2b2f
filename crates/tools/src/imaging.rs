//! Image loading and aspect correction

use anyhow::{Context, Result};
use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use sstvtx_modem::image::RgbBuffer;
use sstvtx_modem::modes::ModeDefinition;
use std::path::Path;
use tracing::debug;

/// How a source image is fitted to the mode's frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    /// Crop to the frame's aspect ratio around the centre, then resize
    #[default]
    Center,
    /// Resize to fit inside the frame with black bars
    Pad,
    /// Resize to the frame ignoring aspect ratio
    Stretch,
}

/// Load `path` and fit it to `mode`'s frame
pub fn load_image(path: &Path, mode: &ModeDefinition, aspect: AspectMode) -> Result<RgbBuffer> {
    let source = image::open(path)
        .with_context(|| format!("Failed to open image: {:?}", path))?
        .to_rgb8();
    debug!(
        "Loaded {:?}: {}x{}, fitting to {}x{} ({:?})",
        path,
        source.width(),
        source.height(),
        mode.width,
        mode.height,
        aspect
    );

    let fitted = fit_image(&source, mode.width, mode.height, aspect);
    let (width, height) = fitted.dimensions();
    Ok(RgbBuffer::new(width, height, fitted.into_raw())?)
}

/// Resize `source` to exactly `width` x `height`
pub fn fit_image(source: &RgbImage, width: u32, height: u32, aspect: AspectMode) -> RgbImage {
    if source.dimensions() == (width, height) {
        return source.clone();
    }

    match aspect {
        AspectMode::Stretch => imageops::resize(source, width, height, FilterType::Triangle),
        AspectMode::Center => {
            let (x, y, w, h) = center_crop(source.width(), source.height(), width, height);
            let cropped = imageops::crop_imm(source, x, y, w, h).to_image();
            imageops::resize(&cropped, width, height, FilterType::Triangle)
        }
        AspectMode::Pad => {
            let (w, h) = fit_inside(source.width(), source.height(), width, height);
            let scaled = imageops::resize(source, w, h, FilterType::Triangle);
            let mut canvas = RgbImage::from_pixel(width, height, Rgb([0, 0, 0]));
            imageops::overlay(
                &mut canvas,
                &scaled,
                i64::from((width - w) / 2),
                i64::from((height - h) / 2),
            );
            canvas
        }
    }
}

/// Largest centred region of a `sw` x `sh` image with the target aspect ratio
fn center_crop(sw: u32, sh: u32, tw: u32, th: u32) -> (u32, u32, u32, u32) {
    let (sw64, sh64, tw64, th64) = (u64::from(sw), u64::from(sh), u64::from(tw), u64::from(th));
    if sw64 * th64 > tw64 * sh64 {
        // wider than the target
        let w = ((sh64 * tw64) / th64).clamp(1, sw64) as u32;
        ((sw - w) / 2, 0, w, sh)
    } else {
        let h = ((sw64 * th64) / tw64).clamp(1, sh64) as u32;
        (0, (sh - h) / 2, sw, h)
    }
}

/// Size of a `sw` x `sh` image scaled to fit inside `tw` x `th`
fn fit_inside(sw: u32, sh: u32, tw: u32, th: u32) -> (u32, u32) {
    let (sw64, sh64, tw64, th64) = (u64::from(sw), u64::from(sh), u64::from(tw), u64::from(th));
    if sw64 * th64 > tw64 * sh64 {
        let h = ((sh64 * tw64) / sw64).clamp(1, th64) as u32;
        (tw, h)
    } else {
        let w = ((sw64 * th64) / sh64).clamp(1, tw64) as u32;
        (w, th)
    }
}
