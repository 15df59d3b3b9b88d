//! Command-line parsing (§6) and the immutable engine configuration derived
//! from it (§9 "Global mutable configuration" redesign flag: no process-wide
//! mutable state, everything lands in one `EngineConfig` built once in
//! `main`).

use std::path::PathBuf;

use clap::Parser;

use crate::comparator::{SECTOR_SIZE, WORD_SIZE};
use crate::error::ScanError;

const DEFAULT_DISK_CHUNK: u64 = 1 << 20;
const DEFAULT_FILE_CHUNK: u64 = 1 << 16;
const DEFAULT_THREADS: usize = 8;
const DEFAULT_PATTERN_DIR: &str = "./patterns";

/// Scan a disk image for surviving fragments of previously known files.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Opt {
    /// Path to the raw image or block device
    #[arg(short = 'd', long = "device")]
    pub device: PathBuf,

    /// Directory containing pattern files to search for
    #[arg(short = 'p', long = "patterns", default_value = DEFAULT_PATTERN_DIR)]
    pub patterns: PathBuf,

    /// Number of worker slots
    #[arg(short = 't', long = "threads", default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Streaming read granularity over the image, in bytes (multiple of 512)
    #[arg(short = 'c', long = "disk-chunk", default_value_t = DEFAULT_DISK_CHUNK)]
    pub disk_chunk: u64,

    /// Streaming read granularity over pattern files, in bytes (multiple of 512)
    #[arg(short = 'f', long = "file-chunk", default_value_t = DEFAULT_FILE_CHUNK)]
    pub file_chunk: u64,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'l', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Immutable configuration handed to the engine at construction.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub device: PathBuf,
    pub patterns: PathBuf,
    pub threads: usize,
    pub disk_chunk: u64,
    pub file_chunk: u64,
}

impl EngineConfig {
    /// Validate and convert parsed CLI flags. Configuration errors map to
    /// exit code 1 per §6/§7.
    pub fn from_opt(opt: Opt) -> Result<Self, ScanError> {
        if opt.threads == 0 {
            return Err(ScanError::Config("-t must be at least 1".into()));
        }

        check_multiple_of_sector(opt.disk_chunk, "-c")?;
        check_multiple_of_sector(opt.file_chunk, "-f")?;

        if opt.file_chunk > opt.disk_chunk {
            return Err(ScanError::Config(
                "-f (file_chunk) must not exceed -c (disk_chunk)".into(),
            ));
        }

        if opt.file_chunk < WORD_SIZE as u64 {
            return Err(ScanError::Config(format!(
                "-f (file_chunk) must be at least the machine word size ({WORD_SIZE})"
            )));
        }

        Ok(Self {
            device: opt.device,
            patterns: opt.patterns,
            threads: opt.threads,
            disk_chunk: opt.disk_chunk,
            file_chunk: opt.file_chunk,
        })
    }
}

fn check_multiple_of_sector(value: u64, flag: &str) -> Result<(), ScanError> {
    if value == 0 || value % SECTOR_SIZE as u64 != 0 {
        return Err(ScanError::Config(format!(
            "{flag} must be a positive multiple of {SECTOR_SIZE}, got {value}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(disk_chunk: u64, file_chunk: u64, threads: usize) -> Opt {
        Opt {
            device: PathBuf::from("/tmp/image"),
            patterns: PathBuf::from("./patterns"),
            threads,
            disk_chunk,
            file_chunk,
            verbose: 0,
        }
    }

    #[test]
    fn rejects_non_multiple_of_512() {
        let err = EngineConfig::from_opt(opt(1000, 512, 8)).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn rejects_file_chunk_larger_than_disk_chunk() {
        let err = EngineConfig::from_opt(opt(512, 1024, 8)).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn accepts_sane_defaults() {
        let cfg = EngineConfig::from_opt(opt(1 << 20, 1 << 16, 8)).unwrap();
        assert_eq!(cfg.threads, 8);
    }
}
