use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{info, warn};

use super::STOP_TIMEOUT;
use crate::{Exit, Options};

pub const SAMPLE_RATE: u32 = 44100;

/// Drives the processor from a timer thread, discarding its output.
pub fn run(options: &Options, exit: Receiver<Exit>) -> Result<Exit, Box<dyn std::error::Error>> {
    let block_size = options.block_size.max(1);
    let soundpad_core::Parts {
        mut processor,
        dispatcher,
        mut controller,
    } = soundpad_core::create(&crate::config(options, block_size, SAMPLE_RATE));
    crate::spawn_dispatcher(dispatcher)?;

    let period = Duration::from_secs_f64(block_size as f64 / SAMPLE_RATE as f64);
    let audio_thread = std::thread::Builder::new()
        .name("dummy_audio".to_string())
        .spawn(move || {
            let mut left = vec![0.0; block_size];
            let mut right = vec![0.0; block_size];
            loop {
                // Add a delay to simulate the block cadence.
                std::thread::sleep(period);
                let io = soundpad_core::IO {
                    out_left: &mut left,
                    out_right: &mut right,
                    midi: std::iter::empty(),
                };
                if processor.process(io) == soundpad_core::Flow::Halt {
                    break;
                }
            }
        })?;
    info!(
        "Dummy backend running with {} frames at {} Hz.",
        block_size, SAMPLE_RATE
    );
    crate::print_banner();

    let reason = exit.recv()?;
    if !controller.stop(STOP_TIMEOUT) {
        warn!("Audio thread did not acknowledge stop.");
    }
    audio_thread
        .join()
        .map_err(|_| "dummy audio thread panicked")?;
    Ok(reason)
}
