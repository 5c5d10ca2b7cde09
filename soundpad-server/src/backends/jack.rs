use crossbeam_channel::{Receiver, Sender};
use jack::PortSpec;
use log::{error, info, warn};

use super::STOP_TIMEOUT;
use crate::{Exit, Options};

pub fn run(
    options: &Options,
    exit_tx: Sender<Exit>,
    exit_rx: Receiver<Exit>,
) -> Result<Exit, Box<dyn std::error::Error>> {
    let (client, status) =
        jack::Client::new(&options.client_name, jack::ClientOptions::NO_START_SERVER)?;
    info!("Started client {} with status {:?}.", client.name(), status);

    let soundpad_core::Parts {
        processor,
        dispatcher,
        mut controller,
    } = soundpad_core::create(&crate::config(
        options,
        client.buffer_size() as usize,
        client.sample_rate() as u32,
    ));
    crate::spawn_dispatcher(dispatcher)?;

    let processor = Processor {
        midi_in: client.register_port("midi_in", jack::MidiIn::default())?,
        outputs: [
            client.register_port("left", jack::AudioOut::default())?,
            client.register_port("right", jack::AudioOut::default())?,
        ],
        inner: processor,
    };
    let client_name = client.name().to_string();
    let client = client.activate_async(Notifications { exit: exit_tx }, processor)?;

    if !options.no_auto_connect {
        let playback = client.as_client().ports(
            None,
            Some(jack::AudioIn::default().jack_port_type()),
            jack::PortFlags::IS_INPUT | jack::PortFlags::IS_PHYSICAL,
        );
        for (source, target) in ["left", "right"].iter().zip(playback.iter()) {
            let source = format!("{}:{}", client_name, source);
            if let Err(e) = client.as_client().connect_ports_by_name(&source, target) {
                warn!("Failed to connect {} to {}: {:?}", source, target, e);
            }
        }
    }
    if let Some(midi_source) = &options.midi_source {
        let midi_in = format!("{}:midi_in", client_name);
        if let Err(e) = client
            .as_client()
            .connect_ports_by_name(midi_source, &midi_in)
        {
            warn!("Failed to connect {} to {}: {:?}", midi_source, midi_in, e);
        }
    }
    crate::print_banner();

    let reason = exit_rx.recv()?;
    // After a driver shutdown the callback is gone and cannot acknowledge.
    if !controller.stop(STOP_TIMEOUT) && matches!(reason, Exit::UserRequest) {
        warn!("Audio callback did not acknowledge stop.");
    }
    if let Err(e) = client.deactivate() {
        error!("Failed to deactivate client: {:?}", e);
    }
    Ok(reason)
}

struct Processor {
    midi_in: jack::Port<jack::MidiIn>,
    outputs: [jack::Port<jack::AudioOut>; 2],
    inner: soundpad_core::SoundpadCore,
}

impl jack::ProcessHandler for Processor {
    fn process(&mut self, _: &jack::Client, ps: &jack::ProcessScope) -> jack::Control {
        let [out_left, out_right] = &mut self.outputs;
        let io = soundpad_core::IO {
            out_left: out_left.as_mut_slice(ps),
            out_right: out_right.as_mut_slice(ps),
            midi: self.midi_in.iter(ps).map(|m| soundpad_core::RawMidi {
                frame: m.time as usize,
                data: m.bytes,
            }),
        };
        match self.inner.process(io) {
            soundpad_core::Flow::Continue => jack::Control::Continue,
            soundpad_core::Flow::Halt => jack::Control::Quit,
        }
    }

    fn buffer_size(&mut self, _: &jack::Client, buffer_size: jack::Frames) -> jack::Control {
        self.inner.set_buffer_size(buffer_size as usize);
        jack::Control::Continue
    }
}

struct Notifications {
    exit: Sender<Exit>,
}

impl jack::NotificationHandler for Notifications {
    fn shutdown(&mut self, status: jack::ClientStatus, reason: &str) {
        let _ = self.exit.try_send(Exit::DriverShutdown {
            status: format!("{:?}", status),
            reason: reason.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use jack::NotificationHandler;

    use super::*;

    #[test]
    fn shutdown_reports_status_and_reason() {
        let (exit_tx, exit_rx) = crossbeam_channel::bounded(2);
        let mut notifications = Notifications { exit: exit_tx };
        notifications.shutdown(jack::ClientStatus::empty(), "device unplugged");
        match exit_rx.try_recv() {
            Ok(Exit::DriverShutdown { reason, .. }) => assert_eq!(reason, "device unplugged"),
            other => panic!("unexpected exit {:?}", other),
        }
    }
}
