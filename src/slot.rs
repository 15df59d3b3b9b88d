//! Per-worker pattern-file state and its lifecycle state machine.

use std::fs::File;

use crate::comparator::SECTOR_SIZE;

/// Lifecycle state of a [`Slot`], driven entirely by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// No pattern file is loaded; ready to be assigned the next filename.
    Available,
    /// A file is open but its pattern buffer needs a (re)fill.
    NeedsData,
    /// The pattern buffer holds sectors awaiting a worker pass.
    NeedsCpu,
    /// All sectors scored; ready for the reporter to collect.
    Completed,
}

/// One in-flight pattern file and everything the scheduler needs to drive it
/// through the disk image.
pub struct Slot {
    pub state: SlotState,
    pub filename: Option<String>,
    file: Option<File>,
    pub total_sectors: u64,
    pattern_buffer: Vec<u8>,
    pub sector_read_count: usize,
    pub current_sector: u64,
    pub scores: Vec<u8>,
    pub scans: u64,
}

impl Slot {
    /// Build an idle slot with a pattern buffer pre-sized to `file_chunk`
    /// bytes, reused across every file this slot ever holds.
    pub fn new(file_chunk: usize) -> Self {
        Self {
            state: SlotState::Available,
            filename: None,
            file: None,
            total_sectors: 0,
            pattern_buffer: vec![0u8; file_chunk],
            sector_read_count: 0,
            current_sector: 0,
            scores: Vec::new(),
            scans: 0,
        }
    }

    /// Assign a freshly opened pattern file to this slot. Caller has already
    /// opened `file`; this computes `total_sectors` by seeking to its end and
    /// resets all per-file bookkeeping.
    pub fn assign(&mut self, filename: String, mut file: File) -> std::io::Result<()> {
        use std::io::{Seek, SeekFrom};

        let size = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(0))?;

        // The trailing partial sector of the file is deliberately excluded:
        // it can never be scored against full 512-byte disk sectors.
        let total_sectors = size / SECTOR_SIZE as u64;

        self.filename = Some(filename);
        self.file = Some(file);
        self.total_sectors = total_sectors;
        self.sector_read_count = 0;
        self.current_sector = 0;
        self.scores = vec![0u8; total_sectors as usize];
        self.scans = 0;
        self.state = SlotState::NeedsData;

        Ok(())
    }

    /// Read up to `file_chunk` bytes of pattern data starting at the file's
    /// current cursor. Updates `sector_read_count` to the number of whole
    /// sectors read and transitions state accordingly (§4.4: NEEDS_DATA →
    /// NEEDS_CPU on ≥1 sector, NEEDS_DATA → COMPLETED on EOF).
    pub fn fill(&mut self) -> std::io::Result<()> {
        use std::io::Read;

        let file = self.file.as_mut().expect("fill requires an open file");
        let mut total_read = 0;

        while total_read < self.pattern_buffer.len() {
            match file.read(&mut self.pattern_buffer[total_read..])? {
                0 => break,
                n => total_read += n,
            }
        }

        self.sector_read_count = total_read / SECTOR_SIZE;

        self.state = if self.sector_read_count > 0 {
            SlotState::NeedsCpu
        } else {
            SlotState::Completed
        };

        Ok(())
    }

    /// The loaded pattern sector at local index `i` (`< sector_read_count`).
    pub fn pattern_sector(&self, i: usize) -> &[u8] {
        &self.pattern_buffer[i * SECTOR_SIZE..(i + 1) * SECTOR_SIZE]
    }

    /// Whether every scored sector has reached bucket 10 (early-exit rule).
    pub fn all_tens(&self) -> bool {
        !self.scores.is_empty() && self.scores.iter().all(|&s| s == 10)
    }

    /// Advance to the next pattern chunk after a full set of disk passes:
    /// bump `current_sector`, reset `scans`, and go back to NEEDS_DATA.
    pub fn advance_chunk(&mut self) {
        self.current_sector += self.sector_read_count as u64;
        self.scans = 0;
        self.state = SlotState::NeedsData;
    }

    /// Release the file handle and filename, returning to AVAILABLE. Called
    /// by the reaper once a completed slot's report has been emitted.
    pub fn release(&mut self) -> (String, Vec<u8>, u64) {
        let filename = self.filename.take().expect("release requires a filename");
        let scores = std::mem::take(&mut self.scores);
        let total_sectors = self.total_sectors;

        self.file = None;
        self.total_sectors = 0;
        self.sector_read_count = 0;
        self.current_sector = 0;
        self.scans = 0;
        self.state = SlotState::Available;

        (filename, scores, total_sectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn slot_with_file(contents: &[u8], file_chunk: usize) -> Slot {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(contents).unwrap();
        let path = tmp.path().to_owned();
        let file = File::open(&path).unwrap();

        let mut slot = Slot::new(file_chunk);
        slot.assign("p".to_string(), file).unwrap();
        slot
    }

    #[test]
    fn trailing_partial_sector_is_excluded() {
        let mut contents = vec![0xAAu8; SECTOR_SIZE * 2];
        contents.extend_from_slice(&[0xBBu8; 100]);
        let slot = slot_with_file(&contents, 65536);
        assert_eq!(slot.total_sectors, 2);
    }

    #[test]
    fn fill_transitions_to_needs_cpu_on_data() {
        let contents = vec![0x11u8; SECTOR_SIZE * 4];
        let mut slot = slot_with_file(&contents, SECTOR_SIZE * 2);
        slot.fill().unwrap();
        assert_eq!(slot.sector_read_count, 2);
        assert_eq!(slot.state, SlotState::NeedsCpu);
    }

    #[test]
    fn fill_transitions_to_completed_on_eof() {
        let slot_contents: Vec<u8> = Vec::new();
        let mut slot = slot_with_file(&slot_contents, SECTOR_SIZE);
        slot.fill().unwrap();
        assert_eq!(slot.sector_read_count, 0);
        assert_eq!(slot.state, SlotState::Completed);
    }

    #[test]
    fn advance_chunk_bumps_current_sector_and_resets_scans() {
        let contents = vec![0x11u8; SECTOR_SIZE * 4];
        let mut slot = slot_with_file(&contents, SECTOR_SIZE * 2);
        slot.fill().unwrap();
        slot.scans = 3;
        slot.advance_chunk();
        assert_eq!(slot.current_sector, 2);
        assert_eq!(slot.scans, 0);
        assert_eq!(slot.state, SlotState::NeedsData);
    }

    #[test]
    fn all_tens_requires_nonempty_scores() {
        let contents = vec![0x11u8; SECTOR_SIZE];
        let mut slot = slot_with_file(&contents, SECTOR_SIZE);
        slot.fill().unwrap();
        assert!(!slot.all_tens());
        slot.scores[0] = 10;
        assert!(slot.all_tens());
    }
}
