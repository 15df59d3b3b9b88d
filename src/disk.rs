//! Double-buffered streaming reader over the raw image.

use std::fs::File;
use std::io::{Read, Result, Seek, SeekFrom};

use crate::error::ScanError;

/// Opens the image read-only, validates its size against `disk_chunk`, and
/// streams it in `disk_chunk`-sized passes using two ping-pong buffers.
pub struct DiskStreamer {
    pub(crate) file: File,
    pub disk_chunk: usize,
    pub disk_loops: u64,
    pub(crate) buffers: [Vec<u8>; 2],
    pub(crate) which: usize,
}

impl DiskStreamer {
    /// Open `path` read-only and determine its size by seeking to the end
    /// (§4.6). If the image is smaller than `disk_chunk`, shrink the chunk
    /// size to match and force a single loop. Otherwise the image size must
    /// be an exact multiple of `disk_chunk`.
    pub fn open(path: &std::path::Path, disk_chunk: u64) -> std::result::Result<Self, ScanError> {
        let mut file = File::open(path).map_err(|source| ScanError::Device {
            path: path.to_owned(),
            source,
        })?;

        let image_size = file
            .seek(SeekFrom::End(0))
            .map_err(|source| ScanError::Device {
                path: path.to_owned(),
                source,
            })?;

        let (disk_chunk, disk_loops) = if image_size < disk_chunk {
            (image_size, 1)
        } else if image_size % disk_chunk != 0 {
            return Err(ScanError::Geometry {
                image_size,
                disk_chunk,
            });
        } else {
            (disk_chunk, image_size / disk_chunk)
        };

        file.seek(SeekFrom::Start(0))
            .map_err(|source| ScanError::Device {
                path: path.to_owned(),
                source,
            })?;

        let disk_chunk = disk_chunk as usize;

        Ok(Self {
            file,
            disk_chunk,
            disk_loops,
            buffers: [vec![0u8; disk_chunk], vec![0u8; disk_chunk]],
            which: 0,
        })
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// The buffer currently available for workers to scan.
    pub fn current(&self) -> &[u8] {
        &self.buffers[self.which]
    }

    /// Fill the *other* buffer from the stream and flip `which` to point at
    /// it, returning the number of bytes actually read. A short read (less
    /// than `disk_chunk`) signals the end of this outer sweep.
    pub fn read_next(&mut self) -> Result<usize> {
        let target = 1 - self.which;
        let mut total_read = 0;

        while total_read < self.disk_chunk {
            match self.file.read(&mut self.buffers[target][total_read..])? {
                0 => break,
                n => total_read += n,
            }
        }

        self.which = target;
        Ok(total_read)
    }

    /// Fill the current buffer directly, used only for the first read of an
    /// outer sweep before any flip has happened.
    pub fn read_first(&mut self) -> Result<usize> {
        let mut total_read = 0;

        while total_read < self.disk_chunk {
            match self.file.read(&mut self.buffers[self.which][total_read..])? {
                0 => break,
                n => total_read += n,
            }
        }

        Ok(total_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::SECTOR_SIZE;
    use std::io::Write;

    fn image(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(bytes).unwrap();
        tmp
    }

    #[test]
    fn exact_multiple_divides_into_loops() {
        let tmp = image(&vec![0u8; SECTOR_SIZE * 8]);
        let streamer = DiskStreamer::open(tmp.path(), (SECTOR_SIZE * 2) as u64).unwrap();
        assert_eq!(streamer.disk_loops, 4);
        assert_eq!(streamer.disk_chunk, SECTOR_SIZE * 2);
    }

    #[test]
    fn smaller_than_chunk_shrinks_and_forces_one_loop() {
        let tmp = image(&vec![0u8; SECTOR_SIZE * 2]);
        let streamer = DiskStreamer::open(tmp.path(), (SECTOR_SIZE * 8) as u64).unwrap();
        assert_eq!(streamer.disk_loops, 1);
        assert_eq!(streamer.disk_chunk, SECTOR_SIZE * 2);
    }

    #[test]
    fn non_multiple_is_a_geometry_error() {
        let tmp = image(&vec![0u8; SECTOR_SIZE * 3]);
        let err = DiskStreamer::open(tmp.path(), (SECTOR_SIZE * 2) as u64).unwrap_err();
        assert!(matches!(err, ScanError::Geometry { .. }));
    }

    #[test]
    fn double_buffer_never_aliases_between_passes() {
        let tmp = image(&vec![0xABu8; SECTOR_SIZE * 4]);
        let mut streamer = DiskStreamer::open(tmp.path(), (SECTOR_SIZE * 2) as u64).unwrap();
        let n = streamer.read_first().unwrap();
        assert_eq!(n, SECTOR_SIZE * 2);
        let current_ptr = streamer.current().as_ptr();
        streamer.read_next().unwrap();
        let next_ptr = streamer.current().as_ptr();
        assert_ne!(current_ptr, next_ptr);
    }
}
