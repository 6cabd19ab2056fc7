//! Render payload sent to the canvas backend.
//!
//! The wire shape is
//! `{"size":[w,h],"files":[{"name","code"}],"assets":[{"name","url"}|{"name","literal"}]}`.

use serde::{Deserialize, Serialize};

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(512, 670)
    }
}

impl From<[u32; 2]> for CanvasSize {
    fn from([width, height]: [u32; 2]) -> Self {
        Self { width, height }
    }
}

impl From<CanvasSize> for [u32; 2] {
    fn from(size: CanvasSize) -> Self {
        [size.width, size.height]
    }
}

/// A named script file executed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptFile {
    pub name: String,
    pub code: String,
}

/// A named input made available to the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Asset {
    /// Remote image fetched by the backend.
    Image { name: String, url: String },
    /// Value substituted into the script verbatim.
    Literal { name: String, literal: String },
}

impl Asset {
    pub fn image(name: impl Into<String>, url: impl Into<String>) -> Self {
        Asset::Image {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn literal(name: impl Into<String>, literal: impl Into<String>) -> Self {
        Asset::Literal {
            name: name.into(),
            literal: literal.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Asset::Image { name, .. } | Asset::Literal { name, .. } => name,
        }
    }
}

/// A complete render job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub size: CanvasSize,
    pub files: Vec<ScriptFile>,
    pub assets: Vec<Asset>,
}

impl RenderRequest {
    /// Creates a request running a single script.
    pub fn new(size: CanvasSize, script: ScriptFile, assets: Vec<Asset>) -> Self {
        Self {
            size,
            files: vec![script],
            assets,
        }
    }

    /// Returns the asset with the given name, if present.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name() == name)
    }
}
