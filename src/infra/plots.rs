// ============================================================
// Layer 6 — Diagnostic Plots
// ============================================================
// Two PNGs per epoch from the first validation batch:
//
//   event_plot_<epoch>.png
//     Two stacked panels, y range [0, 1]. Target coordinates
//     drawn solid, predictions dashed, every sample-timestep
//     of the batch laid end to end along x.
//       panel 1: x coordinate (steelblue target, indianred output)
//       panel 2: y coordinate (darkcyan target, darkorange output)
//
//   eye_plot_<epoch>.png
//     4 x 4 grid of the first 16 frames in grayscale, with the
//     predicted point in red and the true point in green at
//     (x * width, y * height).
//
// No text rendering: colours carry the legend.
//
// Reference: imageproc::drawing, image::imageops

use anyhow::{ensure, Context, Result};
use image::{
    imageops::{self, FilterType},
    GrayImage, Luma, Rgb, RgbImage,
};
use imageproc::{
    drawing::{draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};
use std::path::{Path, PathBuf};

const STEELBLUE:  Rgb<u8> = Rgb([70, 130, 180]);
const INDIANRED:  Rgb<u8> = Rgb([205, 92, 92]);
const DARKCYAN:   Rgb<u8> = Rgb([0, 139, 139]);
const DARKORANGE: Rgb<u8> = Rgb([255, 140, 0]);
const RED:        Rgb<u8> = Rgb([255, 0, 0]);
const GREEN:      Rgb<u8> = Rgb([0, 200, 0]);
const WHITE:      Rgb<u8> = Rgb([255, 255, 255]);
const GREY:       Rgb<u8> = Rgb([180, 180, 180]);

const SERIES_WIDTH:  u32 = 1200;
const SERIES_HEIGHT: u32 = 800;
const MARGIN:        u32 = 20;
/// Dash and gap length of predicted series, in data points
const DASH:          usize = 4;

const GRID:      u32 = 4;
/// Frames are upscaled so their longer side is about this many pixels
const TILE_SIDE: u32 = 240;

/// One validation batch, pulled back to the host.
///
/// `frames` holds every frame of every sample as `[n, height, width]`;
/// `targets` and `predictions` hold the matching `[n, 2]` coordinates.
#[derive(Debug, Clone)]
pub struct PlotBatch {
    pub frames:      Vec<f32>,
    pub targets:     Vec<f32>,
    pub predictions: Vec<f32>,
}

pub struct DiagnosticsPlotter {
    dir:    PathBuf,
    height: usize,
    width:  usize,
}

impl DiagnosticsPlotter {
    pub fn new(dir: impl Into<PathBuf>, height: usize, width: usize) -> Self {
        Self { dir: dir.into(), height, width }
    }

    pub fn event_plot_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("event_plot_{epoch}.png"))
    }

    pub fn eye_plot_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("eye_plot_{epoch}.png"))
    }

    /// Write both plots for `epoch`.
    pub fn plot_epoch(&self, epoch: usize, batch: &PlotBatch) -> Result<()> {
        ensure!(
            batch.targets.len() == batch.predictions.len(),
            "Plot batch has {} target values but {} predictions",
            batch.targets.len(),
            batch.predictions.len(),
        );

        save(&self.event_plot(batch), &self.event_plot_path(epoch))?;
        save(&self.eye_plot(batch), &self.eye_plot_path(epoch))?;

        tracing::debug!("Saved plots for epoch {} to '{}'", epoch, self.dir.display());
        Ok(())
    }

    fn event_plot(&self, batch: &PlotBatch) -> RgbImage {
        let mut img = RgbImage::from_pixel(SERIES_WIDTH, SERIES_HEIGHT, WHITE);

        let panel_height = (SERIES_HEIGHT - 3 * MARGIN) / 2;
        let panel_width  = SERIES_WIDTH - 2 * MARGIN;
        let panels = [
            (Rect::at(MARGIN as i32, MARGIN as i32), 0, STEELBLUE, INDIANRED),
            (Rect::at(MARGIN as i32, (2 * MARGIN + panel_height) as i32), 1, DARKCYAN, DARKORANGE),
        ];

        for (at, axis, target_color, output_color) in panels {
            let panel = at.of_size(panel_width, panel_height);
            draw_hollow_rect_mut(&mut img, panel, GREY);

            let targets: Vec<f32> = batch.targets.iter().skip(axis).step_by(2).copied().collect();
            let outputs: Vec<f32> = batch.predictions.iter().skip(axis).step_by(2).copied().collect();
            draw_series(&mut img, panel, &targets, target_color, false);
            draw_series(&mut img, panel, &outputs, output_color, true);
        }
        img
    }

    fn eye_plot(&self, batch: &PlotBatch) -> RgbImage {
        let frame_len = self.height * self.width;
        let scale     = (TILE_SIDE / self.height.max(self.width).max(1) as u32).max(1);
        let tile_w    = self.width as u32 * scale;
        let tile_h    = self.height as u32 * scale;

        let mut img = RgbImage::from_pixel(GRID * tile_w, GRID * tile_h, WHITE);
        if frame_len == 0 {
            return img;
        }

        let tiles = batch.frames.chunks_exact(frame_len).take((GRID * GRID) as usize);
        for (i, frame) in tiles.enumerate() {
            let left = (i as u32 % GRID) * tile_w;
            let top  = (i as u32 / GRID) * tile_h;

            let gray = to_gray(frame, self.width as u32, self.height as u32);
            let gray = imageops::resize(&gray, tile_w, tile_h, FilterType::Nearest);
            for (x, y, Luma([v])) in gray.enumerate_pixels() {
                img.put_pixel(left + x, top + y, Rgb([*v, *v, *v]));
            }

            let point = |coords: &[f32]| match coords.get(2 * i..2 * i + 2) {
                Some(&[x, y]) => Some((
                    (left as f32 + x * tile_w as f32) as i32,
                    (top as f32 + y * tile_h as f32) as i32,
                )),
                _ => None,
            };
            if let Some(p) = point(&batch.predictions) {
                draw_filled_circle_mut(&mut img, p, 3, RED);
            }
            if let Some(p) = point(&batch.targets) {
                draw_filled_circle_mut(&mut img, p, 3, GREEN);
            }
        }
        img
    }
}

/// Polyline of `values` across `panel`, y in [0, 1] bottom to top.
fn draw_series(img: &mut RgbImage, panel: Rect, values: &[f32], color: Rgb<u8>, dashed: bool) {
    let last = values.len().saturating_sub(1).max(1) as f32;
    let to_point = |i: usize, v: f32| {
        let x = panel.left() as f32 + i as f32 / last * (panel.width() - 1) as f32;
        let y = panel.top() as f32 + (1.0 - v.clamp(0.0, 1.0)) * (panel.height() - 1) as f32;
        (x, y)
    };

    for (i, pair) in values.windows(2).enumerate() {
        if dashed && (i / DASH) % 2 == 1 {
            continue;
        }
        draw_line_segment_mut(img, to_point(i, pair[0]), to_point(i + 1, pair[1]), color);
    }
}

/// Min-max stretch a normalized frame to 8-bit grayscale.
fn to_gray(frame: &[f32], width: u32, height: u32) -> GrayImage {
    let (lo, hi) = frame
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = hi - lo;

    GrayImage::from_fn(width, height, |x, y| {
        let v = frame[(y * width + x) as usize];
        let level = if range > 0.0 { (v - lo) / range * 255.0 } else { 0.0 };
        Luma([level.round() as u8])
    })
}

fn save(img: &RgbImage, path: &Path) -> Result<()> {
    img.save(path)
        .with_context(|| format!("Cannot write plot '{}'", path.display()))
}
