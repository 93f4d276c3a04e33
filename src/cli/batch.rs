//! Batch and tile export commands
//!
//! Draws are made sequentially so a seeded run is reproducible, and part
//! images are resolved through the shared cache. Compositing, presentation
//! and encoding then run in parallel. Batches are written in chunks so only
//! one chunk of frames is alive at a time; a tile sheet needs every frame.

use image::RgbaImage;
use rand::Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use super::session::Session;
use super::{GlobalOpts, RenderArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::assets::{AssetError, ImageCache, LayerImages, MissingAssetPolicy, PartImageSource};
use crate::composition::compose_sprite;
use crate::generator::{CharacterSelector, Draw};
use crate::output::{
    batch_dir, batch_file_name, present, save_png, sheet_dimensions, tile_grid, tile_path, timestamp_slug,
    OutputError, Presentation,
};
use crate::rarity::{Grade, Rarity};

/// Draws resolved and written per round of a batch.
const BATCH_CHUNK: usize = 64;

/// A draw with its grade and resolved layer images, ready to composite.
struct Resolved {
    draw: Draw,
    rarity: Rarity,
    images: LayerImages,
}

#[derive(Debug, Error)]
enum BatchError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("Failed to write '{}': {source}", .path.display())]
    Write { path: PathBuf, source: OutputError },
}

/// Where and how a batch is written.
struct BatchPlan<'a> {
    dir: &'a Path,
    count: usize,
    chunk: usize,
    sprite_size: u32,
    presentation: Presentation,
    policy: MissingAssetPolicy,
}

fn resolve_draws<R: Rng + ?Sized, S: PartImageSource>(
    selector: &CharacterSelector<'_>,
    cache: &mut ImageCache<S>,
    rng: &mut R,
    policy: MissingAssetPolicy,
    count: usize,
) -> Result<Vec<Resolved>, AssetError> {
    (0..count)
        .map(|_| -> Result<Resolved, AssetError> {
            let (draw, rarity) = selector.roll(&mut *rng);
            let images = cache.images_for(&draw, selector.catalogs(), policy)?;
            Ok(Resolved { draw, rarity, images })
        })
        .collect()
}

fn render_frame(resolved: &Resolved, sprite_size: u32, presentation: &Presentation) -> Result<RgbaImage, OutputError> {
    let sprite = compose_sprite(&resolved.images, resolved.draw.hair_hue as f64, sprite_size);
    present(&sprite, presentation)
}

fn render_all(
    resolved: &[Resolved],
    sprite_size: u32,
    presentation: &Presentation,
) -> Result<Vec<RgbaImage>, OutputError> {
    resolved
        .par_iter()
        .map(|r| render_frame(r, sprite_size, presentation))
        .collect()
}

/// Draw, render and save a whole batch, one chunk at a time.
///
/// Returns the grade of every draw in order.
fn write_batch<R: Rng + ?Sized, S: PartImageSource>(
    selector: &CharacterSelector<'_>,
    cache: &mut ImageCache<S>,
    rng: &mut R,
    plan: &BatchPlan<'_>,
) -> Result<Vec<Grade>, BatchError> {
    let mut grades = Vec::with_capacity(plan.count);

    for start in (0..plan.count).step_by(plan.chunk.max(1)) {
        let len = plan.chunk.max(1).min(plan.count - start);
        let resolved = resolve_draws(selector, cache, &mut *rng, plan.policy, len)?;
        tracing::debug!(start, len, cached = cache.len(), "resolved batch chunk");

        resolved.par_iter().enumerate().try_for_each(|(i, r)| {
            let path = plan.dir.join(batch_file_name(start + i, plan.count));
            render_frame(r, plan.sprite_size, &plan.presentation)
                .and_then(|frame| save_png(&frame, &path))
                .map_err(|source| BatchError::Write { path, source })
        })?;

        grades.extend(resolved.iter().map(|r| r.rarity.grade));
    }

    Ok(grades)
}

fn grade_summary(grades: &[Grade]) -> String {
    let mut counts: BTreeMap<Grade, usize> = BTreeMap::new();
    for &grade in grades {
        *counts.entry(grade).or_insert(0) += 1;
    }
    counts
        .iter()
        .rev()
        .map(|(grade, n)| format!("{} x{}", grade, n))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Draw, resolve and render `count` characters, keeping every frame.
fn produce(session: &mut Session, count: usize) -> Result<(Vec<RgbaImage>, Vec<Grade>), ExitCode> {
    let presentation = session.presentation();
    let policy = session.policy;
    let sprite_size = session.config.render.sprite_size;

    let (selector, cache, rng) = session.split();
    let resolved = resolve_draws(&selector, cache, rng, policy, count).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })?;
    tracing::info!(count, cached = cache.len(), "resolved draws");

    let frames = render_all(&resolved, sprite_size, &presentation).map_err(|e| {
        eprintln!("Error: {}", e);
        ExitCode::from(EXIT_ERROR)
    })?;
    let grades = resolved.iter().map(|r| r.rarity.grade).collect();
    Ok((frames, grades))
}

/// Run the batch command
pub fn run_batch(global: &GlobalOpts, render: &RenderArgs, count: usize) -> ExitCode {
    if count == 0 {
        eprintln!("Error: count must be at least 1");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut session = match Session::open(global, render) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let dir = batch_dir(session.out_dir(), count, session.config.render.scale, &timestamp_slug());
    let plan = BatchPlan {
        dir: &dir,
        count,
        chunk: BATCH_CHUNK,
        sprite_size: session.config.render.sprite_size,
        presentation: session.presentation(),
        policy: session.policy,
    };

    let (selector, cache, rng) = session.split();
    let grades = match write_batch(&selector, cache, rng, &plan) {
        Ok(grades) => grades,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    println!("Saved {} characters to {}", count, dir.display());
    println!("  Grades: {}", grade_summary(&grades));

    session.record(&grades);
    ExitCode::from(EXIT_SUCCESS)
}

/// Run the tile command
pub fn run_tile(global: &GlobalOpts, render: &RenderArgs, cols: u32, rows: u32) -> ExitCode {
    if cols == 0 || rows == 0 {
        eprintln!("Error: columns and rows must be at least 1");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let mut session = match Session::open(global, render) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let cell = session.config.render.sprite_size * session.presentation().scale;
    if let Err(e) = sheet_dimensions(cols, rows, cell, cell) {
        eprintln!("Error: {}", e);
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let count = cols as usize * rows as usize;
    let (frames, grades) = match produce(&mut session, count) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let path = tile_path(session.out_dir(), cols, rows, session.config.render.scale, &timestamp_slug());
    let saved = tile_grid(&frames, cols, session.presentation().background).and_then(|sheet| save_png(&sheet, &path));
    if let Err(e) = saved {
        eprintln!("Error: Failed to write '{}': {}", path.display(), e);
        return ExitCode::from(EXIT_ERROR);
    }

    print_tile(&path, cols, rows, &grades);
    session.record(&grades);
    ExitCode::from(EXIT_SUCCESS)
}

fn print_tile(path: &Path, cols: u32, rows: u32, grades: &[Grade]) {
    println!("Saved {}x{} tile to {}", cols, rows, path.display());
    println!("  Grades: {}", grade_summary(grades));
}
