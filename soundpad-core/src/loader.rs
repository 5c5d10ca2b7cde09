use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{error, info, warn};

use crate::channels::AudioBlock;
use crate::dispatcher::NoteHandler;
use crate::error::LoadError;
use crate::queue::BlockSender;
use crate::stream::SampleStream;

/// A directory of samples named `{bank}_{pitch}_{anything}`.
#[derive(Clone, Debug)]
pub struct SampleLibrary {
    dir: PathBuf,
}

impl SampleLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> SampleLibrary {
        SampleLibrary { dir: dir.into() }
    }

    /// Finds the single file for `bank` and `pitch`.
    pub fn resolve(&self, bank: u8, pitch: u8) -> Result<PathBuf, LoadError> {
        let prefix = format!("{}_{}_", bank, pitch);
        let mut candidates = Vec::new();
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::SampleMissing { bank, pitch });
            }
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let matches = entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with(&prefix))
                .unwrap_or(false);
            if matches && entry.file_type()?.is_file() {
                candidates.push(entry.path());
            }
        }
        match candidates.len() {
            0 => Err(LoadError::SampleMissing { bank, pitch }),
            1 => Ok(candidates.remove(0)),
            n => Err(LoadError::AmbiguousSample {
                bank,
                pitch,
                candidates: n,
            }),
        }
    }
}

/// Streams samples into the outbound queue.
pub struct SampleLoader {
    library: SampleLibrary,
    blocks: BlockSender,
    recycled: ringbuf::Consumer<AudioBlock>,
    block_size: Arc<AtomicUsize>,
    sample_rate: Option<u32>,
}

impl SampleLoader {
    pub fn new(
        library: SampleLibrary,
        blocks: BlockSender,
        recycled: ringbuf::Consumer<AudioBlock>,
        block_size: Arc<AtomicUsize>,
    ) -> SampleLoader {
        SampleLoader {
            library,
            blocks,
            recycled,
            block_size,
            sample_rate: None,
        }
    }

    /// Sets the rate samples are expected to be recorded at.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = Some(sample_rate);
    }

    /// Streams the sample for `bank` and `pitch`, returning the number of
    /// blocks queued.
    pub fn play(&mut self, bank: u8, pitch: u8) -> Result<usize, LoadError> {
        let path = self.library.resolve(bank, pitch)?;
        info!("Playing: path={}", path.display());
        let mut stream = SampleStream::open(&path)?;
        if let (Some(expected), Some(actual)) = (self.sample_rate, stream.sample_rate()) {
            if expected != actual {
                warn!(
                    "{} has sample rate {} but the output runs at {}.",
                    path.display(),
                    actual,
                    expected
                );
            }
        }

        let mut queued = 0;
        let mut dropped = 0;
        let mut spare = None;
        loop {
            let mut block = match spare.take() {
                Some(block) => self.fit_block_size(block),
                None => self.next_free_block(),
            };
            if !stream.next_block(&mut block)? {
                break;
            }
            match self.blocks.push(block)? {
                None => queued += 1,
                Some(rejected) => {
                    dropped += 1;
                    spare = Some(rejected);
                }
            }
        }
        if dropped > 0 {
            warn!(
                "Dropped {} blocks of {}: output queue full.",
                dropped,
                path.display()
            );
        }
        Ok(queued)
    }

    fn next_free_block(&mut self) -> AudioBlock {
        match self.recycled.pop() {
            Some(block) => self.fit_block_size(block),
            None => AudioBlock::new(self.block_size()),
        }
    }

    fn fit_block_size(&self, mut block: AudioBlock) -> AudioBlock {
        let block_size = self.block_size();
        if block.buffer_size() != block_size {
            block.set_buffer_size(block_size);
        }
        block
    }

    fn block_size(&self) -> usize {
        self.block_size.load(Ordering::Relaxed).max(1)
    }
}

impl NoteHandler for SampleLoader {
    fn note_on(&mut self, bank: u8, pitch: u8) {
        match self.play(bank, pitch) {
            Ok(_) => (),
            Err(e @ LoadError::SampleMissing { .. }) => warn!("{}", e),
            Err(e @ LoadError::AmbiguousSample { .. }) => warn!("{}", e),
            Err(e) => error!("Failed to play bank={} pitch={}: {}", bank, pitch, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::queue::{self, OverflowPolicy};

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn resolve_single_match() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0_60_kick.wav");
        touch(dir.path(), "0_6_hat.wav");
        touch(dir.path(), "10_60_snare.wav");
        let library = SampleLibrary::new(dir.path());
        assert_eq!(
            library.resolve(0, 60).unwrap(),
            dir.path().join("0_60_kick.wav")
        );
        assert_eq!(
            library.resolve(0, 6).unwrap(),
            dir.path().join("0_6_hat.wav")
        );
    }

    #[test]
    fn resolve_missing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "2_100_clap.wav");
        let library = SampleLibrary::new(dir.path());
        assert!(matches!(
            library.resolve(2, 10),
            Err(LoadError::SampleMissing { bank: 2, pitch: 10 })
        ));
    }

    #[test]
    fn resolve_ambiguous() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1_40_a.wav");
        touch(dir.path(), "1_40_b.flac");
        let library = SampleLibrary::new(dir.path());
        assert!(matches!(
            library.resolve(1, 40),
            Err(LoadError::AmbiguousSample { candidates: 2, .. })
        ));
    }

    #[test]
    fn resolve_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("3_30_dir")).unwrap();
        let library = SampleLibrary::new(dir.path());
        assert!(matches!(
            library.resolve(3, 30),
            Err(LoadError::SampleMissing { .. })
        ));
    }

    #[test]
    fn resolve_without_directory_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let library = SampleLibrary::new(dir.path().join("nope"));
        assert!(matches!(
            library.resolve(2, 10),
            Err(LoadError::SampleMissing { bank: 2, pitch: 10 })
        ));
    }

    #[test]
    fn spare_blocks_follow_block_size() {
        let dir = tempfile::tempdir().unwrap();
        let (block_tx, _block_rx) = queue::outbound(1, OverflowPolicy::Drop);
        let (_, recycled) = queue::recycler(1);
        let block_size = Arc::new(AtomicUsize::new(64));
        let loader = SampleLoader::new(
            SampleLibrary::new(dir.path()),
            block_tx,
            recycled,
            block_size.clone(),
        );
        let spare = AudioBlock::new(64);
        block_size.store(32, Ordering::Relaxed);
        assert_eq!(loader.fit_block_size(spare).buffer_size(), 32);
    }
}
