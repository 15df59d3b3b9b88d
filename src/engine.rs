//! §4.7 Engine / scheduler: the outer control loop.

use std::fs::File;

use bytesize::ByteSize;

use crate::config::EngineConfig;
use crate::disk::DiskStreamer;
use crate::error::ScanError;
use crate::pattern_source::PatternSource;
use crate::report;
use crate::scanner::run_worker;
use crate::slot::{Slot, SlotState};

pub struct Engine {
    config: EngineConfig,
    slots: Vec<Slot>,
    source: PatternSource,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ScanError> {
        let source = PatternSource::open(&config.patterns).map_err(|source_err| ScanError::PatternDir {
            path: config.patterns.clone(),
            source: source_err,
        })?;

        let slots = (0..config.threads)
            .map(|_| Slot::new(config.file_chunk as usize))
            .collect();

        Ok(Self {
            config,
            slots,
            source,
        })
    }

    /// Run the scanner to completion: every slot reaches AVAILABLE and the
    /// pattern source is exhausted.
    pub fn run(&mut self) -> Result<(), ScanError> {
        let mut disk = DiskStreamer::open(&self.config.device, self.config.disk_chunk)?;
        let mut more_files = true;

        log::info!(
            "streaming in passes of {} ({} loops per sweep)",
            ByteSize::b(disk.disk_chunk as u64),
            disk.disk_loops
        );

        loop {
            disk.rewind().map_err(|source| ScanError::Device {
                path: self.config.device.clone(),
                source,
            })?;

            disk.which = 0;

            let first_read = disk.read_first().map_err(|source| ScanError::Device {
                path: self.config.device.clone(),
                source,
            })?;

            if first_read < disk.disk_chunk {
                log::warn!("short initial read of {first_read} bytes from the image");
                break;
            }

            let keep_going = self.inner_sweep(&mut disk, &mut more_files)?;

            if !keep_going {
                break;
            }
        }

        Ok(())
    }

    /// One full rewind-to-rewind inner sweep: keeps streaming disk_chunk
    /// reads while the stream still yields full chunks, reconciling slot
    /// state and dispatching workers each iteration.
    fn inner_sweep(&mut self, disk: &mut DiskStreamer, more_files: &mut bool) -> Result<bool, ScanError> {
        let mut last_read = disk.disk_chunk;

        while last_read == disk.disk_chunk {
            self.reap();
            self.assign(more_files)?;
            self.load()?;

            // Dispatch + overlap: launch workers against the current buffer
            // while the coordinator streams the next one into the other
            // buffer, all within one join barrier.
            //
            // Split the streamer's two buffers by direct field access (not
            // through a method call) so the borrow checker can see that the
            // "current" read-only borrow and the "next" mutable borrow are
            // disjoint halves of the same fixed two-element array, and that
            // `disk.file` is an unrelated field free to borrow alongside
            // them.
            let which = disk.which;
            let (half_a, half_b) = disk.buffers.split_at_mut(1);
            let (current, next): (&[u8], &mut Vec<u8>) = if which == 0 {
                (half_a[0].as_slice(), &mut half_b[0])
            } else {
                (half_b[0].as_slice(), &mut half_a[0])
            };

            let device_path = &self.config.device;
            let slots = &mut self.slots;
            let mut read_result: std::io::Result<usize> = Ok(0);

            std::thread::scope(|scope| {
                let mut handles = Vec::new();

                for slot in slots.iter_mut().filter(|s| s.state == SlotState::NeedsCpu) {
                    handles.push(scope.spawn(move || run_worker(slot, current)));
                }

                let mut total_read = 0;

                read_result = (|| -> std::io::Result<usize> {
                    while total_read < next.len() {
                        match disk.file.read(&mut next[total_read..])? {
                            0 => break,
                            n => total_read += n,
                        }
                    }

                    Ok(total_read)
                })();

                for handle in handles {
                    handle.join().expect("worker thread panicked");
                }
            });

            last_read = read_result.map_err(|source| ScanError::Device {
                path: device_path.clone(),
                source,
            })?;

            disk.which = 1 - which;

            // Every slot still NeedsCpu at this point is exactly the set
            // that was dispatched above (workers never change slot state on
            // the normal path), so this is the "increment each dispatched
            // slot's scans" step from the design.
            for slot in &mut self.slots {
                if slot.state == SlotState::NeedsCpu {
                    slot.scans += 1;
                }
            }

            // Early-exit check.
            for slot in &mut self.slots {
                if slot.state == SlotState::NeedsCpu && slot.all_tens() {
                    slot.state = SlotState::Completed;
                }
            }

            // Chunk advance.
            let disk_loops = disk.disk_loops;
            for slot in &mut self.slots {
                if slot.state == SlotState::NeedsCpu && slot.scans == disk_loops {
                    slot.advance_chunk();
                }
            }

            if self.all_idle(*more_files) {
                return Ok(false);
            }
        }

        Ok(!self.all_idle(*more_files))
    }

    fn reap(&mut self) {
        for slot in &mut self.slots {
            if slot.state == SlotState::Completed {
                let (filename, scores, total_sectors) = slot.release();
                report::emit(&filename, total_sectors, &scores);
            }
        }
    }

    /// For each AVAILABLE slot, take the next filename and try to open it.
    /// A failed open, or a failure while sizing an opened file, is logged
    /// and the slot is left AVAILABLE rather than retried immediately within
    /// this tick (§9 open question: the slot is only refilled on the next
    /// scheduler tick, not by looping here). Only the pattern directory
    /// itself being unreadable is fatal.
    fn assign(&mut self, more_files: &mut bool) -> Result<(), ScanError> {
        for slot in &mut self.slots {
            if slot.state != SlotState::Available {
                continue;
            }

            match self.source.next().map_err(|source| ScanError::PatternDir {
                path: self.config.patterns.clone(),
                source,
            })? {
                None => *more_files = false,
                Some(path) => match File::open(&path) {
                    Ok(file) => {
                        let filename = path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.to_string_lossy().into_owned());
                        if let Err(err) = slot.assign(filename, file) {
                            log::warn!("cannot read pattern file {}: {err}", path.display());
                            continue;
                        }
                    }
                    Err(err) => {
                        log::warn!("cannot open pattern file {}: {err}", path.display());
                    }
                },
            }
        }

        Ok(())
    }

    fn load(&mut self) -> Result<(), ScanError> {
        for slot in &mut self.slots {
            if slot.state == SlotState::NeedsData {
                slot.fill().map_err(|source| ScanError::Device {
                    path: self.config.device.clone(),
                    source,
                })?;
            }
        }

        Ok(())
    }

    fn all_idle(&self, more_files: bool) -> bool {
        !more_files && self.slots.iter().all(|s| s.state == SlotState::Available)
    }
}
