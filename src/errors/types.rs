//! Custom error types for usbboot-launcher

use std::fmt;
use std::path::PathBuf;

/// Main error type for usbboot-launcher operations
#[derive(Debug)]
pub enum UsbBootError {
    /// Configuration related errors
    Config(String),
    /// USB device enumeration errors
    Device(String),
    /// Image folder does not exist
    ImageMissing(PathBuf),
    /// Image folder exists but has no `bootcode.bin`
    ImageNotBootable(PathBuf),
    /// The helper process could not be started
    Launch {
        program: String,
        source: std::io::Error,
    },
    /// The helper process ran but exited with a non-zero status
    Helper(Option<i32>),
    /// General I/O errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
}

impl fmt::Display for UsbBootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbBootError::Config(msg) => write!(f, "Configuration error: {}", msg),
            UsbBootError::Device(msg) => write!(f, "Device error: {}", msg),
            UsbBootError::ImageMissing(path) => {
                write!(f, "Specified image folder does not exist: {}", path.display())
            }
            UsbBootError::ImageNotBootable(path) => write!(
                f,
                "Specified image folder does not contain bootable files (bootcode.bin missing): {}",
                path.display()
            ),
            UsbBootError::Launch { program, source } => {
                write!(f, "Error starting {}: {}", program, source)
            }
            UsbBootError::Helper(Some(code)) => {
                write!(f, "Error executing helper (exit code {})", code)
            }
            UsbBootError::Helper(None) => {
                write!(f, "Error executing helper (terminated by signal)")
            }
            UsbBootError::Io(err) => write!(f, "I/O error: {}", err),
            UsbBootError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for UsbBootError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UsbBootError::Io(err) => Some(err),
            UsbBootError::Launch { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for UsbBootError {
    fn from(err: std::io::Error) -> Self {
        UsbBootError::Io(err)
    }
}

impl From<serde_json::Error> for UsbBootError {
    fn from(err: serde_json::Error) -> Self {
        UsbBootError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for UsbBootError {
    fn from(err: toml::de::Error) -> Self {
        UsbBootError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for UsbBootError {
    fn from(err: toml::ser::Error) -> Self {
        UsbBootError::Serialization(err.to_string())
    }
}

/// Result type alias for usbboot-launcher operations
pub type Result<T> = std::result::Result<T, UsbBootError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_mentions_program() {
        let err = UsbBootError::Launch {
            program: "rpiboot".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().starts_with("Error starting rpiboot"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_helper_error_messages() {
        assert_eq!(
            UsbBootError::Helper(Some(2)).to_string(),
            "Error executing helper (exit code 2)"
        );
        assert!(UsbBootError::Helper(None).to_string().contains("signal"));
    }
}
