use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Sample missing: bank={bank} pitch={pitch}")]
    SampleMissing { bank: u8, pitch: u8 },

    #[error("Sample ambiguous: bank={bank} pitch={pitch} matches {candidates} files")]
    AmbiguousSample { bank: u8, pitch: u8, candidates: usize },

    #[error("No audio track in {0}")]
    NoAudioTrack(PathBuf),

    #[error("Audio file error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audio block queue disconnected")]
    Disconnected,
}
