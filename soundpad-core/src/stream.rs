use std::fs::File;
use std::path::Path;

use log::warn;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::channels::AudioBlock;
use crate::error::LoadError;

/// Decodes an audio file into consecutive fixed size stereo blocks.
pub struct SampleStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: Option<u32>,
    // Interleaved samples of the last decoded packet.
    pending: Vec<f32>,
    position: usize,
    channels: usize,
    finished: bool,
}

impl SampleStream {
    pub fn open(path: &Path) -> Result<SampleStream, LoadError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            hint.with_extension(extension);
        }
        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| LoadError::NoAudioTrack(path.to_path_buf()))?;
        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate;
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
        let decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        Ok(SampleStream {
            format,
            decoder,
            track_id,
            sample_rate,
            pending: Vec::new(),
            position: 0,
            channels,
            finished: false,
        })
    }

    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// Fills `block` with the next frames of the file, zero padding past the
    /// end. Returns `false` once no frames are left.
    pub fn next_block(&mut self, block: &mut AudioBlock) -> Result<bool, LoadError> {
        let frames = block.buffer_size();
        let mut written = 0;
        while written < frames {
            if self.position >= self.pending.len() {
                if !self.refill()? {
                    break;
                }
                continue;
            }
            let end = (self.position + self.channels).min(self.pending.len());
            block.write_frame(written, &self.pending[self.position..end]);
            self.position = end;
            written += 1;
        }
        if written == 0 {
            return Ok(false);
        }
        block.clear_from(written);
        Ok(true)
    }

    fn refill(&mut self) -> Result<bool, LoadError> {
        while !self.finished {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(e) => match classify(e) {
                    ReadFailure::EndOfStream => {
                        self.finished = true;
                        break;
                    }
                    ReadFailure::Reset => {
                        self.decoder.reset();
                        continue;
                    }
                    ReadFailure::Fatal(e) => return Err(e.into()),
                },
            };
            if packet.track_id() != self.track_id {
                continue;
            }
            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    match self.decoder.decode(&packet) {
                        Ok(decoded) => decoded,
                        Err(e) => return Err(e.into()),
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!("Skipping corrupt packet: {}", e);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            if decoded.frames() == 0 {
                continue;
            }
            let spec = *decoded.spec();
            let mut samples = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);
            self.channels = spec.channels.count().max(1);
            self.pending.clear();
            self.pending.extend_from_slice(samples.samples());
            self.position = 0;
            return Ok(true);
        }
        Ok(false)
    }
}

/// How a failed packet read affects the stream.
#[derive(Debug)]
enum ReadFailure {
    EndOfStream,
    /// A new segment started. The decoder must be reset before continuing.
    Reset,
    Fatal(SymphoniaError),
}

fn classify(error: SymphoniaError) -> ReadFailure {
    match error {
        SymphoniaError::IoError(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            ReadFailure::EndOfStream
        }
        SymphoniaError::ResetRequired => ReadFailure::Reset,
        e => ReadFailure::Fatal(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_continues_the_stream() {
        assert!(matches!(
            classify(SymphoniaError::ResetRequired),
            ReadFailure::Reset
        ));
    }

    #[test]
    fn eof_ends_the_stream() {
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "end of stream");
        assert!(matches!(
            classify(SymphoniaError::IoError(eof)),
            ReadFailure::EndOfStream
        ));
    }

    #[test]
    fn other_errors_are_fatal() {
        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            classify(SymphoniaError::IoError(denied)),
            ReadFailure::Fatal(_)
        ));
        assert!(matches!(
            classify(SymphoniaError::Unsupported("codec")),
            ReadFailure::Fatal(_)
        ));
    }
}
