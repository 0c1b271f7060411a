use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::Rgb;
use thiserror::Error;

use crate::shared::constants::DEFAULT_PALETTE;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("could not read palette {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("palette {path} must map category names to [r, g, b]: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Category → outline color lookup for rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    colors: HashMap<String, Rgb<u8>>,
}

impl Palette {
    pub fn builtin() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .map(|(name, rgb)| (name.to_string(), Rgb(*rgb)))
                .collect(),
        }
    }

    /// Built-in colors extended (or overridden) by a JSON object such as
    /// `{"truck": [0, 0, 255]}`.
    pub fn from_json_file(path: &Path) -> Result<Self, PaletteError> {
        let text = fs::read_to_string(path).map_err(|source| PaletteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let overrides: HashMap<String, [u8; 3]> =
            serde_json::from_str(&text).map_err(|source| PaletteError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut palette = Self::builtin();
        for (name, rgb) in overrides {
            palette.insert(name, Rgb(rgb));
        }
        Ok(palette)
    }

    pub fn insert(&mut self, category: impl Into<String>, color: Rgb<u8>) {
        self.colors.insert(category.into(), color);
    }

    pub fn color(&self, category: &str) -> Option<Rgb<u8>> {
        self.colors.get(category).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::builtin()
    }
}
