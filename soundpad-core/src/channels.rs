use std::fmt::Debug;

/// A block of audio with `N` channels stored channel after channel.
pub struct FixedChannels<const N: usize> {
    audio: Vec<f32>,
}

/// The unit of audio exchanged between the loader and the processor.
pub type AudioBlock = FixedChannels<2>;

impl<const N: usize> FixedChannels<N> {
    pub fn new(buffer_size: usize) -> FixedChannels<N> {
        FixedChannels {
            audio: vec![0.0; buffer_size * N],
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.audio.len() / N
    }

    /// Resizes the block and fills it with silence.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.audio.clear();
        self.audio.resize(buffer_size * N, 0.0);
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        let buffer_size = self.buffer_size();
        &self.audio[index * buffer_size..(index + 1) * buffer_size]
    }

    pub fn iter_channels(&self) -> impl ExactSizeIterator + Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size.
        self.audio.chunks_exact(self.buffer_size().max(1))
    }

    /// Writes one frame at `frame`. `samples` holds one value per source
    /// channel: a single value is copied to every channel, extra values are
    /// ignored.
    pub fn write_frame(&mut self, frame: usize, samples: &[f32]) {
        let buffer_size = self.buffer_size();
        for channel in 0..N {
            let value = match samples.len() {
                0 => 0.0,
                1 => samples[0],
                _ => samples.get(channel).copied().unwrap_or(0.0),
            };
            self.audio[channel * buffer_size + frame] = value;
        }
    }

    /// Zeroes every frame from `frame` to the end of the block.
    pub fn clear_from(&mut self, frame: usize) {
        let buffer_size = self.buffer_size();
        for channel in self.audio.chunks_mut(buffer_size.max(1)) {
            for x in channel.iter_mut().skip(frame) {
                *x = 0.0;
            }
        }
    }

    /// Copies each channel into the matching destination. Destinations longer
    /// than the block get silence past the end of the block.
    pub fn copy_to<'a, I>(&self, destinations: I)
    where
        I: IntoIterator<Item = &'a mut [f32]>,
    {
        for (src, dst) in self.iter_channels().zip(destinations) {
            let n = src.len().min(dst.len());
            dst[..n].copy_from_slice(&src[..n]);
            clear_buffer(&mut dst[n..]);
        }
    }
}

impl<const N: usize> Debug for FixedChannels<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("FixedChannels")
            .field("channels", &N)
            .field("buffer_size", &self.buffer_size())
            .finish()
    }
}

pub(crate) fn clear_buffer(buffer: &mut [f32]) {
    for x in buffer {
        *x = 0.0;
    }
}
