//! The queues shared between the real-time processor and the dispatcher
//! thread.
//!
//! MIDI events flow from the processor to the dispatcher through an unbounded
//! queue so that the processor never waits. Audio blocks flow back through a
//! bounded queue whose capacity throttles the loader. Spent blocks return to
//! the loader through a fixed size ring so the processor never frees them.
use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::channels::AudioBlock;
use crate::error::LoadError;
use crate::midi::RawEvent;

pub fn inbound() -> (EventSender, EventReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender { tx }, EventReceiver { rx })
}

pub fn outbound(capacity: usize, policy: OverflowPolicy) -> (BlockSender, BlockReceiver) {
    let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
    (BlockSender { tx, policy }, BlockReceiver { rx })
}

/// Ring of spent blocks. Sized to hold every block that can be in flight.
pub fn recycler(
    capacity: usize,
) -> (ringbuf::Producer<AudioBlock>, ringbuf::Consumer<AudioBlock>) {
    ringbuf::RingBuffer::new(capacity.max(1) + 2).split()
}

pub struct EventSender {
    tx: Sender<RawEvent>,
}

impl EventSender {
    /// Never blocks. Events are dropped once the dispatcher has gone away.
    pub fn push(&self, event: RawEvent) {
        let _ = self.tx.send(event);
    }
}

pub struct EventReceiver {
    rx: Receiver<RawEvent>,
}

impl EventReceiver {
    /// Blocks until an event arrives. Returns `None` once every sender is
    /// dropped and the queue is empty.
    pub fn pop(&self) -> Option<RawEvent> {
        self.rx.recv().ok()
    }

    pub fn try_pop(&self) -> Option<RawEvent> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// What the loader does when the outbound queue is full.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Wait for the processor to make room.
    #[default]
    Block,
    /// Discard the block and keep decoding.
    Drop,
}

impl std::str::FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "block" => Ok(OverflowPolicy::Block),
            "drop" => Ok(OverflowPolicy::Drop),
            _ => Err(format!("invalid overflow policy {:?}", s)),
        }
    }
}

pub struct BlockSender {
    tx: Sender<AudioBlock>,
    policy: OverflowPolicy,
}

impl BlockSender {
    /// Queues `block` according to the overflow policy. A block rejected by
    /// [`OverflowPolicy::Drop`] is handed back so it can be reused.
    pub fn push(&self, block: AudioBlock) -> Result<Option<AudioBlock>, LoadError> {
        match self.policy {
            OverflowPolicy::Block => self
                .tx
                .send(block)
                .map(|_| None)
                .map_err(|_| LoadError::Disconnected),
            OverflowPolicy::Drop => match self.tx.try_send(block) {
                Ok(()) => Ok(None),
                Err(TrySendError::Full(block)) => Ok(Some(block)),
                Err(TrySendError::Disconnected(_)) => Err(LoadError::Disconnected),
            },
        }
    }
}

pub struct BlockReceiver {
    rx: Receiver<AudioBlock>,
}

impl BlockReceiver {
    /// Never blocks.
    pub fn try_pop(&self) -> Option<AudioBlock> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
