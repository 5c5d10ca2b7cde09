/// Status nibble of a note off message.
pub const NOTE_OFF: u8 = 0x8;
/// Status nibble of a note on message.
pub const NOTE_ON: u8 = 0x9;

/// The raw bytes of a three byte MIDI message.
pub type RawEvent = [u8; 3];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    pub status: u8,
    /// The MIDI channel. Selects the sample bank.
    pub channel: u8,
    pub pitch: u8,
    pub velocity: u8,
}

impl MidiEvent {
    pub fn decode(data: RawEvent) -> MidiEvent {
        let [status, pitch, velocity] = data;
        MidiEvent {
            status: (status >> 4) & 0xF,
            channel: status & 0xF,
            pitch,
            velocity,
        }
    }

    pub fn is_note_on(&self) -> bool {
        self.status == NOTE_ON
    }

    pub fn is_note_off(&self) -> bool {
        self.status == NOTE_OFF
    }
}

/// Accepts only messages that are exactly three bytes long.
pub fn intake(data: &[u8]) -> Option<RawEvent> {
    data.try_into().ok()
}
