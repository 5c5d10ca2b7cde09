use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use command::Command;
use crossbeam_channel::Sender;

pub mod channels;
pub mod command;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod midi;
pub mod queue;
pub mod stream;

pub use command::Controller;
pub use dispatcher::{Dispatcher, NoteHandler};
pub use error::LoadError;
pub use loader::{SampleLibrary, SampleLoader};
pub use queue::OverflowPolicy;

#[derive(Copy, Clone, Debug)]
pub struct RawMidi<'a> {
    pub frame: usize,
    pub data: &'a [u8],
}

pub struct IO<'a, M> {
    pub out_left: &'a mut [f32],
    pub out_right: &'a mut [f32],
    pub midi: M,
}

/// Tells the audio driver whether to keep calling the processor.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub samples_dir: PathBuf,
    /// Frames per block. Follows the driver once processing starts.
    pub block_size: usize,
    /// Output sample rate, if known. Only used to warn about mismatched files.
    pub sample_rate: Option<u32>,
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            samples_dir: PathBuf::from("samples"),
            block_size: 1024,
            sample_rate: None,
            queue_capacity: 20,
            overflow: OverflowPolicy::Block,
        }
    }
}

/// Everything needed to run a soundpad: the processor belongs on the audio
/// thread, the dispatcher on its own thread and the controller with whoever
/// decides when to stop.
pub struct Parts {
    pub processor: SoundpadCore,
    pub dispatcher: Dispatcher<SampleLoader>,
    pub controller: Controller,
}

pub fn create(config: &Config) -> Parts {
    let (event_tx, event_rx) = queue::inbound();
    let (block_tx, block_rx) = queue::outbound(config.queue_capacity, config.overflow);
    let (recycle_tx, recycle_rx) = queue::recycler(config.queue_capacity);
    let (command_tx, command_rx) = ringbuf::RingBuffer::<Command>::new(16).split();
    let (halted_tx, halted_rx) = crossbeam_channel::bounded(1);
    let block_size = Arc::new(AtomicUsize::new(config.block_size));

    let mut loader = SampleLoader::new(
        SampleLibrary::new(config.samples_dir.clone()),
        block_tx,
        recycle_rx,
        block_size.clone(),
    );
    if let Some(sample_rate) = config.sample_rate {
        loader.set_sample_rate(sample_rate);
    }
    Parts {
        processor: SoundpadCore {
            events: event_tx,
            blocks: block_rx,
            recycled: recycle_tx,
            command_queue: command_rx,
            halted: halted_tx,
            block_size,
            stopped: false,
        },
        dispatcher: Dispatcher::new(event_rx, loader),
        controller: Controller::new(command_tx, halted_rx),
    }
}

/// The real-time half of the soundpad. `process` never blocks, allocates or
/// logs.
pub struct SoundpadCore {
    events: queue::EventSender,
    blocks: queue::BlockReceiver,
    recycled: ringbuf::Producer<channels::AudioBlock>,
    command_queue: ringbuf::Consumer<Command>,
    halted: Sender<()>,
    block_size: Arc<AtomicUsize>,
    stopped: bool,
}

impl SoundpadCore {
    pub fn process<'a, M: Iterator<Item = RawMidi<'a>>>(&mut self, io: IO<'_, M>) -> Flow {
        self.handle_command_queue();
        if self.stopped {
            channels::clear_buffer(io.out_left);
            channels::clear_buffer(io.out_right);
            let _ = self.halted.try_send(());
            return Flow::Halt;
        }

        if let Some(block) = self.blocks.try_pop() {
            block.copy_to([io.out_left, io.out_right]);
            // Only fails if the loader stopped taking blocks back.
            let _ = self.recycled.push(block);
        }

        for message in io.midi {
            if let Some(event) = midi::intake(message.data) {
                self.events.push(event);
            }
        }
        Flow::Continue
    }

    /// Subsequent blocks are produced with `buffer_size` frames.
    pub fn set_buffer_size(&mut self, buffer_size: usize) {
        self.block_size.store(buffer_size, Ordering::Relaxed);
    }

    pub fn buffer_size(&self) -> usize {
        self.block_size.load(Ordering::Relaxed)
    }

    fn handle_command_queue(&mut self) {
        let mut stopped = self.stopped;
        self.command_queue.pop_each(
            |c| {
                match c {
                    Command::Stop => stopped = true,
                };
                true
            },
            None,
        );
        self.stopped = stopped;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::midi::MidiEvent;

    fn events<'a>(messages: &'a [&'a [u8]]) -> impl Iterator<Item = RawMidi<'a>> {
        messages
            .iter()
            .enumerate()
            .map(|(frame, data)| RawMidi { frame, data })
    }

    #[test]
    fn underrun_leaves_outputs_untouched() {
        let Parts {
            mut processor,
            dispatcher,
            ..
        } = create(&Config::default());
        let mut left = [0.25; 8];
        let mut right = [-0.25; 8];
        let flow = processor.process(IO {
            out_left: &mut left,
            out_right: &mut right,
            midi: events(&[&[0x90, 0x3C, 0x7F]]),
        });
        assert_eq!(flow, Flow::Continue);
        assert_eq!(left, [0.25; 8]);
        assert_eq!(right, [-0.25; 8]);
        assert_eq!(dispatcher.pending(), 1);
    }

    #[test]
    fn only_three_byte_messages_are_queued() {
        let Parts {
            mut processor,
            dispatcher,
            ..
        } = create(&Config::default());
        let mut left = [0.0; 4];
        let mut right = [0.0; 4];
        processor.process(IO {
            out_left: &mut left,
            out_right: &mut right,
            midi: events(&[
                &[0xF8],
                &[0x80, 0x40, 0x00],
                &[0xC0, 0x05],
                &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7],
                &[0x91, 0x24, 0x50],
            ]),
        });
        assert_eq!(dispatcher.pending(), 2);
        assert_eq!(
            dispatcher.try_next(),
            Some(MidiEvent::decode([0x80, 0x40, 0x00]))
        );
        assert_eq!(
            dispatcher.try_next(),
            Some(MidiEvent::decode([0x91, 0x24, 0x50]))
        );
    }

    #[test]
    fn stop_silences_and_halts() {
        let Parts {
            mut processor,
            mut controller,
            ..
        } = create(&Config::default());
        let waiter = std::thread::spawn(move || controller.stop(Duration::from_secs(5)));
        let mut left = [0.5; 16];
        let mut right = [0.5; 16];
        let mut flow = Flow::Continue;
        while flow == Flow::Continue {
            flow = processor.process(IO {
                out_left: &mut left,
                out_right: &mut right,
                midi: std::iter::empty(),
            });
            std::thread::sleep(Duration::from_millis(1));
        }
        assert!(waiter.join().unwrap());
        assert_eq!(left, [0.0; 16]);
        assert_eq!(right, [0.0; 16]);
    }

    #[test]
    fn set_buffer_size_is_shared() {
        let Parts { mut processor, .. } = create(&Config::default());
        assert_eq!(processor.buffer_size(), 1024);
        processor.set_buffer_size(256);
        assert_eq!(processor.buffer_size(), 256);
    }
}
