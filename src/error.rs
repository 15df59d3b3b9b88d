//! Structured errors and their mapping onto the exit codes of §6/§7.

use std::path::PathBuf;

use nix::unistd::Uid;

/// Process exit codes as specified: 0 success, 1 configuration error,
/// 2 device/directory open failure, 3 image geometry error.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{0}")]
    Config(String),

    #[error("cannot open device {path}: {source}")]
    Device {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "image size {image_size} is not a multiple of disk_chunk {disk_chunk}"
    )]
    Geometry { image_size: u64, disk_chunk: u64 },

    #[error("cannot open pattern directory {path}: {source}")]
    PatternDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::Config(_) => 1,
            ScanError::Device { .. } => 2,
            ScanError::Geometry { .. } => 3,
            ScanError::PatternDir { .. } => 2,
        }
    }

    /// Print the diagnostic the way §7 asks for, hinting at privileges on a
    /// device-open failure when we're not running as root.
    pub fn report(&self) {
        eprintln!("scar: {self}");

        if let ScanError::Device { .. } = self {
            if !Uid::effective().is_root() {
                eprintln!("scar: hint: opening a raw device usually requires root privileges");
            }
        }
    }
}
