//! Shared setup for rendering commands: config, catalogs, grade table, RNG

use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{GlobalOpts, RenderArgs, EXIT_ERROR, EXIT_INVALID_ARGS};
use crate::assets::{DirectoryAssets, ImageCache, MissingAssetPolicy};
use crate::catalog::Catalogs;
use crate::config::loader::{load_config, CliOverrides};
use crate::config::CharagenConfig;
use crate::generator::CharacterSelector;
use crate::output::Presentation;
use crate::rarity::{Grade, GradeTable};
use crate::stats::StatsRecord;

/// Everything a rendering command needs, loaded once.
pub(crate) struct Session {
    pub config: CharagenConfig,
    pub catalogs: Catalogs,
    pub grades: GradeTable,
    pub cache: ImageCache<DirectoryAssets>,
    pub rng: Pcg32,
    pub policy: MissingAssetPolicy,
    pub record_stats: bool,
}

impl Session {
    /// Load config and catalogs, apply overrides and seed the RNG.
    ///
    /// Errors are reported on stderr; the returned code is the exit status.
    pub fn open(global: &GlobalOpts, render: &RenderArgs) -> Result<Self, ExitCode> {
        let config = load_effective_config(global, &render.overrides())?;

        let grades = config.grade_table().map_err(|e| {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_INVALID_ARGS)
        })?;

        let catalogs = load_catalogs(&config.project.resources);
        let cache = ImageCache::new(DirectoryAssets::new(&config.project.assets));

        let rng = match global.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_entropy(),
        };

        let policy = if render.skip_missing {
            MissingAssetPolicy::Skip
        } else {
            MissingAssetPolicy::Abort
        };

        Ok(Self {
            config,
            catalogs,
            grades,
            cache,
            rng,
            policy,
            record_stats: !render.no_stats,
        })
    }

    /// Selector plus the mutable state it draws and renders with.
    pub fn split(&mut self) -> (CharacterSelector<'_>, &mut ImageCache<DirectoryAssets>, &mut Pcg32) {
        let selector =
            CharacterSelector::new(&self.catalogs, &self.grades).with_sprite_size(self.config.render.sprite_size);
        (selector, &mut self.cache, &mut self.rng)
    }

    pub fn presentation(&self) -> Presentation {
        self.config.presentation()
    }

    pub fn out_dir(&self) -> &Path {
        &self.config.project.out
    }

    /// Count finished generations. Failures only warn.
    pub fn record(&self, grades: &[Grade]) {
        if !self.record_stats || grades.is_empty() {
            return;
        }
        let path = &self.config.project.stats;
        if let Err(e) = StatsRecord::record(path, grades) {
            tracing::warn!(path = %path.display(), error = %e, "could not update stats");
        }
    }
}

/// Load the config file (explicit or discovered) and apply CLI overrides.
///
/// The merged result is validated again so bad flag values are reported
/// as invalid arguments.
pub(crate) fn load_effective_config(
    global: &GlobalOpts,
    overrides: &CliOverrides,
) -> Result<CharagenConfig, ExitCode> {
    let mut config = load_config(global.config.as_deref()).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        ExitCode::from(EXIT_ERROR)
    })?;

    overrides.apply_to(&mut config);

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("Error: {}", e);
        }
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    Ok(config)
}

/// Read the resource descriptor, falling back to default catalogs.
fn load_catalogs(path: &Path) -> Catalogs {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "resource descriptor not found, using default catalogs");
        return Catalogs::fallback();
    }
    match Catalogs::load(path) {
        Ok(catalogs) => {
            tracing::info!(path = %path.display(), "loaded resource descriptor");
            catalogs
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "unusable resource descriptor, using default catalogs");
            Catalogs::fallback()
        }
    }
}

/// Default file name for a single generated character.
pub(crate) fn default_character_path(out: &Path, stamp: &str) -> PathBuf {
    out.join(format!("character_{}.png", stamp))
}
