use log::{debug, info};

use crate::midi::MidiEvent;
use crate::queue::EventReceiver;

/// Receives the notes picked out of the MIDI stream.
pub trait NoteHandler {
    fn note_on(&mut self, bank: u8, pitch: u8);
}

/// Consumes raw MIDI events off the real-time thread and triggers playback.
pub struct Dispatcher<H> {
    events: EventReceiver,
    handler: H,
}

impl<H: NoteHandler> Dispatcher<H> {
    pub fn new(events: EventReceiver, handler: H) -> Dispatcher<H> {
        Dispatcher { events, handler }
    }

    /// Handles events until every producer is gone. A note on is handled to
    /// completion before the next event is read.
    pub fn run(&mut self) {
        while let Some(data) = self.events.pop() {
            self.handle(MidiEvent::decode(data));
        }
        debug!("MIDI event queue closed.");
    }

    pub fn handle(&mut self, event: MidiEvent) {
        info!(
            "Event: status={} bank={} pitch={} velocity={}",
            event.status, event.channel, event.pitch, event.velocity
        );
        if event.is_note_on() {
            self.handler.note_on(event.channel, event.pitch);
        }
    }

    /// Number of events waiting to be handled.
    pub fn pending(&self) -> usize {
        self.events.len()
    }

    #[cfg(test)]
    pub(crate) fn try_next(&self) -> Option<MidiEvent> {
        self.events.try_pop().map(MidiEvent::decode)
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}
