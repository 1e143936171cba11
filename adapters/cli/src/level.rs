//! Level files: level data plus the terrain grid in a single TOML document.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use castle_defence_core::{CellCoord, Gold, Grid, LevelConfig, TowerKind, Wave};
use serde::Deserialize;

/// Tower the driver builds as soon as the level starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerOrder {
    pub(crate) kind: TowerKind,
    pub(crate) column: u32,
    pub(crate) row: u32,
}

impl TowerOrder {
    pub(crate) const fn cell(&self) -> CellCoord {
        CellCoord::new(self.column, self.row)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    map: String,
    starting_gold: Gold,
    starting_lives: u32,
    #[serde(default)]
    initial_delay_secs: f32,
    grid: Vec<Vec<u32>>,
    #[serde(default)]
    towers: Vec<TowerOrder>,
    waves: Vec<Wave>,
}

/// Decoded and validated level.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) grid: Grid,
    pub(crate) config: LevelConfig,
    pub(crate) towers: Vec<TowerOrder>,
}

/// Reads and validates the level stored at `path`.
pub(crate) fn load(path: &Path) -> Result<Level> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid level file {}", path.display()))
}

fn parse(contents: &str) -> Result<Level> {
    let file: LevelFile =
        toml::from_str(contents).context("failed to parse level toml contents")?;
    let grid = Grid::from_rows(&file.grid).context("level grid is malformed")?;
    let config = LevelConfig {
        map: file.map,
        starting_gold: file.starting_gold,
        starting_lives: file.starting_lives,
        initial_delay_secs: file.initial_delay_secs,
        waves: file.waves,
    };
    config.validate().context("level data is invalid")?;

    Ok(Level {
        grid,
        config,
        towers: file.towers,
    })
}
