//! Discovery and validation of installed boot image folders
//!
//! Images live in `<data dir>/rpiboot/<name>/` for each XDG system data
//! directory and the user data directory. A folder is only a boot image if it
//! contains `bootcode.bin`.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{Result, UsbBootError};
use crate::models::image::BootImage;

/// Marker file every bootable image folder must contain
pub const BOOTCODE_FILE: &str = "bootcode.bin";
/// Optional human readable description inside an image folder
pub const DESCRIPTION_FILE: &str = "description.txt";
/// Subdirectory of a data directory holding image folders
pub const IMAGE_SUBDIR: &str = "rpiboot";

const DEFAULT_XDG_DATA_DIRS: &str = "/usr/local/share:/usr/share";

/// Check that `path` exists and contains the boot marker file
pub fn validate_image_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(UsbBootError::ImageMissing(path.to_path_buf()));
    }
    if !path.join(BOOTCODE_FILE).exists() {
        return Err(UsbBootError::ImageNotBootable(path.to_path_buf()));
    }
    Ok(())
}

/// Data directories searched for images: XDG system dirs, then the user dir
pub fn default_data_dirs() -> Vec<PathBuf> {
    let system_dirs = std::env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_XDG_DATA_DIRS.to_string());

    let mut data_dirs: Vec<PathBuf> = std::env::split_paths(&system_dirs)
        .filter(|dir| !dir.as_os_str().is_empty())
        .collect();
    if let Some(user_dir) = dirs::data_dir() {
        data_dirs.push(user_dir);
    }
    data_dirs
}

fn describe(name: &str, folder: &Path) -> String {
    let description_path = folder.join(DESCRIPTION_FILE);
    if let Ok(content) = fs::read_to_string(&description_path) {
        let content = content.trim();
        if !content.is_empty() {
            return content.to_string();
        }
    }

    match name {
        "gpioexpand" => "GPIO expansion board".to_string(),
        "msd" => "eMMC / SD card reader".to_string(),
        _ => name.to_string(),
    }
}

fn scan_data_dir(data_dir: &Path) -> Vec<BootImage> {
    let image_root = data_dir.join(IMAGE_SUBDIR);
    let Ok(entries) = fs::read_dir(&image_root) else {
        return Vec::new();
    };

    let mut images: Vec<BootImage> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir())
        .filter(|entry| entry.path().join(BOOTCODE_FILE).exists())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?.to_string();
            let path = entry.path();
            let description = describe(&name, &path);
            Some(BootImage {
                name,
                path,
                description,
            })
        })
        .collect();

    images.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!(
        "Found {} boot image(s) in {}",
        images.len(),
        image_root.display()
    );
    images
}

/// Boot images installed on this system
#[derive(Debug, Clone, Default)]
pub struct ImageCatalog {
    images: Vec<BootImage>,
}

impl ImageCatalog {
    /// Scan the default data directories
    pub fn discover() -> Self {
        Self::scan(&default_data_dirs())
    }

    /// Scan the given data directories in order, skipping duplicates
    pub fn scan(data_dirs: &[PathBuf]) -> Self {
        let mut scanned = HashSet::new();
        let mut images = Vec::new();

        for data_dir in data_dirs {
            if !scanned.insert(data_dir.clone()) {
                continue;
            }
            images.extend(scan_data_dir(data_dir));
        }

        Self { images }
    }

    pub fn from_images(images: Vec<BootImage>) -> Self {
        Self { images }
    }

    pub fn images(&self) -> &[BootImage] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Look an image up by folder name or full path
    pub fn find(&self, name_or_path: &str) -> Option<&BootImage> {
        self.images
            .iter()
            .find(|image| image.name == name_or_path || image.path == Path::new(name_or_path))
    }
}
