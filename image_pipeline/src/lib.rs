use std::path::{Path, PathBuf};

use base64::Engine;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

pub const IMAGE_MAX_DIMENSION_DEFAULT: u32 = 1280;
pub const IMAGE_MAX_DIMENSION_MIN: u32 = 64;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("image decode failed: {0}")]
    Decode(String),
    #[error("image encode failed: {0}")]
    Encode(String),
    #[error("invalid image dimensions")]
    Dimensions,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Longest side after loading; `None` keeps the decoded size.
    pub max_dim: Option<u32>,
    pub filter: FilterType,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_dim: Some(IMAGE_MAX_DIMENSION_DEFAULT),
            filter: FilterType::Lanczos3,
        }
    }
}

/// Decoded stage artwork in 8-bit sRGBA.
#[derive(Debug, Clone)]
pub struct StageImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
}

impl StageImage {
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        encode_png(&self.pixels)
    }

    /// `data:image/png;base64,...` for embedding in SVG or HTML.
    pub fn to_png_data_url(&self) -> Result<String, PipelineError> {
        let bytes = self.to_png_bytes()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        ))
    }
}

pub struct ImagePipeline {
    config: PipelineConfig,
}

impl Default for ImagePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl ImagePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let max_dim = config
            .max_dim
            .map(|max_dim| max_dim.max(IMAGE_MAX_DIMENSION_MIN));
        Self {
            config: PipelineConfig { max_dim, ..config },
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn process(&self, bytes: &[u8]) -> Result<StageImage, PipelineError> {
        let decoded =
            image::load_from_memory(bytes).map_err(|err| PipelineError::Decode(err.to_string()))?;
        let rgba = resize_rgba8_to_max_dim(decoded.to_rgba8(), self.config.max_dim, self.config.filter);
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::Dimensions);
        }
        Ok(StageImage {
            width,
            height,
            pixels: rgba,
        })
    }

    pub fn load(&self, path: &Path) -> Result<StageImage, PipelineError> {
        let bytes = std::fs::read(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = self.process(&bytes)?;
        log::debug!(
            "loaded {} as {}x{}{}",
            path.display(),
            image.width,
            image.height,
            if is_png(&bytes) { " (png)" } else { "" }
        );
        Ok(image)
    }
}

pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, PipelineError> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::Dimensions);
    }
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|err| PipelineError::Encode(err.to_string()))?;
    Ok(out)
}

fn resize_rgba8_to_max_dim(rgba: RgbaImage, max_dim: Option<u32>, filter: FilterType) -> RgbaImage {
    let Some(max_dim) = max_dim else {
        return rgba;
    };
    let (width, height) = rgba.dimensions();
    let max_axis = width.max(height);
    if max_axis <= max_dim {
        return rgba;
    }
    let scale = max_dim as f32 / max_axis as f32;
    let next_width = ((width as f32) * scale).round().max(1.0) as u32;
    let next_height = ((height as f32) * scale).round().max(1.0) as u32;
    image::imageops::resize(&rgba, next_width, next_height, filter)
}

fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(b"\x89PNG\r\n\x1a\n")
}
