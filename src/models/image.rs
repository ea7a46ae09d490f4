//! Boot image catalog entries and selections

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An installed boot image directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootImage {
    /// Directory name under `rpiboot/`
    pub name: String,
    pub path: PathBuf,
    pub description: String,
}

/// Image chosen for the device that is currently attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSelection {
    pub path: PathBuf,
    /// Use this image for every following device without asking
    pub remember: bool,
}

impl ImageSelection {
    pub fn once(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            remember: false,
        }
    }

    pub fn remembered(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            remember: true,
        }
    }
}
