use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::rules::SessionSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    /// Plain rectangles, clipped and stroked as boxes.
    Grid,
    /// Interlocking tabs and notches on every internal edge.
    #[default]
    Jigsaw,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub rows: u32,
    pub cols: u32,
    #[serde(default)]
    pub kind: BoundaryKind,
    pub time_limit: u32,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// Image for the stage, relative to the asset directory.
    #[serde(default)]
    pub image: Option<String>,
}

impl Stage {
    /// Rows and columns after applying the user's grid multiplier.
    pub fn grid_size(&self, settings: &SessionSettings) -> (u32, u32) {
        (
            settings.scaled_count(self.rows),
            settings.scaled_count(self.cols),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read stage catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse stage catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("stage catalog has no stages")]
    Empty,
    #[error("stage {index} ('{title}') must have at least one row and one column")]
    EmptyGrid { index: usize, title: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageCatalog {
    pub stages: Vec<Stage>,
}

impl StageCatalog {
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let catalog: StageCatalog = toml::from_str(contents)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.stages.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (index, stage) in self.stages.iter().enumerate() {
            if stage.rows == 0 || stage.cols == 0 {
                return Err(CatalogError::EmptyGrid {
                    index,
                    title: stage.title.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Share of the run already finished when `index` is the active stage.
    pub fn progress(&self, index: usize) -> f32 {
        if self.stages.is_empty() {
            return 0.0;
        }
        (index.min(self.stages.len()) as f32) / self.stages.len() as f32
    }
}

fn builtin_stage(rows: u32, cols: u32, time_limit: u32, title: &str, subtitle: &str, n: u32) -> Stage {
    Stage {
        rows,
        cols,
        kind: BoundaryKind::Jigsaw,
        time_limit,
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        image: Some(format!("stage_{n}.png")),
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self {
            stages: vec![
                builtin_stage(4, 4, 60, "The Beginning", "Piece together the first memory.", 1),
                builtin_stage(5, 5, 90, "Growing Stronger", "Complexity increases.", 2),
                builtin_stage(6, 6, 120, "Vivid Colors", "Focus on the details.", 3),
                builtin_stage(6, 6, 150, "Twists & Turns", "Life isn't always straight lines.", 4),
                builtin_stage(8, 8, 180, "The Masterpiece", "The final challenge.", 5),
            ],
        }
    }
}
