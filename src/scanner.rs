//! Sector scanner (§4.2) and worker task (§4.3).

use crate::comparator::{score_sector, SECTOR_SIZE};
use crate::slot::Slot;

/// Sweep every disk sector in `disk_chunk` against one pattern sector,
/// raising `*score` to the best bucket seen. No-op if `*score` is already 10.
pub fn scan_sector(disk_chunk: &[u8], pattern_sector: &[u8], score: &mut u8) {
    if *score == 10 {
        return;
    }

    let mut offset = 0;

    while offset + SECTOR_SIZE <= disk_chunk.len() {
        let disk_sector = &disk_chunk[offset..offset + SECTOR_SIZE];
        let candidate = score_sector(disk_sector, pattern_sector);

        if candidate > *score {
            *score = candidate;

            if *score == 10 {
                break;
            }
        }

        offset += SECTOR_SIZE;
    }
}

/// Run every loaded pattern sector of `slot` against `disk_chunk`. The only
/// slot field this mutates is the score vector, in the range
/// `[current_sector, current_sector + sector_read_count)`.
pub fn run_worker(slot: &mut Slot, disk_chunk: &[u8]) {
    if slot.sector_read_count == 0 {
        log::log!(log::Level::Trace, "worker invoked with an empty pattern buffer");
        slot.state = crate::slot::SlotState::Completed;
        return;
    }

    for i in 0..slot.sector_read_count {
        let right_place = (slot.current_sector + i as u64) as usize;
        let pattern_sector = slot.pattern_sector(i);
        scan_sector(disk_chunk, pattern_sector, &mut slot.scores[right_place]);
    }
}
