use std::path::PathBuf;

use log::{info, warn};
use structopt::StructOpt;

pub mod backends;

#[derive(Debug, StructOpt)]
pub struct Options {
    #[structopt(long, default_value = "jack")]
    backend: Backend,

    #[structopt(long, default_value = "soundpad")]
    client_name: String,

    /// Directory holding samples named `{bank}_{pitch}_{name}`.
    #[structopt(long, default_value = "samples", parse(from_os_str))]
    samples_dir: PathBuf,

    /// Number of audio blocks buffered ahead of the output.
    #[structopt(long, default_value = "20")]
    queue_capacity: usize,

    /// Either `block` or `drop`.
    #[structopt(long, default_value = "block")]
    overflow: soundpad_core::OverflowPolicy,

    /// Leave the outputs disconnected.
    #[structopt(long)]
    no_auto_connect: bool,

    /// MIDI port to connect to the soundpad input.
    #[structopt(long)]
    midi_source: Option<String>,

    /// Frames per block for the dummy backend.
    #[structopt(long, default_value = "1024")]
    block_size: usize,
}

/// Why the process is shutting down.
#[derive(Debug)]
pub enum Exit {
    UserRequest,
    DriverShutdown { status: String, reason: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let options = Options::from_args();

    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let (exit_tx, exit_rx) = crossbeam_channel::bounded(2);
    let stdin_exit = exit_tx.clone();
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = stdin_exit.send(Exit::UserRequest);
    });

    info!("Running soundpad with backend {:?}.", options.backend);
    let exit = match options.backend {
        Backend::Dummy => backends::dummy::run(&options, exit_rx)?,
        Backend::Jack => backends::jack::run(&options, exit_tx, exit_rx)?,
    };
    match exit {
        Exit::UserRequest => info!("Exiting"),
        Exit::DriverShutdown { status, reason } => {
            warn!("Audio driver shut down!");
            warn!("status: {}", status);
            warn!("reason: {}", reason);
        }
    }
    Ok(())
}

/// Starts the dispatcher thread. It is never joined; it ends with the
/// process.
fn spawn_dispatcher(
    dispatcher: soundpad_core::Dispatcher<soundpad_core::SampleLoader>,
) -> std::io::Result<()> {
    let mut dispatcher = dispatcher;
    std::thread::Builder::new()
        .name("midi_in".to_string())
        .spawn(move || dispatcher.run())?;
    Ok(())
}

fn config(options: &Options, block_size: usize, sample_rate: u32) -> soundpad_core::Config {
    soundpad_core::Config {
        samples_dir: options.samples_dir.clone(),
        block_size,
        sample_rate: Some(sample_rate),
        queue_capacity: options.queue_capacity,
        overflow: options.overflow,
    }
}

fn print_banner() {
    println!("* Sound pad is Running. *");
    println!("Hit Return to quit");
}

#[derive(Debug)]
enum Backend {
    Dummy,
    Jack,
}

impl std::str::FromStr for Backend {
    type Err = Box<dyn std::error::Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dummy" => Ok(Backend::Dummy),
            "jack" => Ok(Backend::Jack),
            _ => Err(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "invalid backend",
            ))),
        }
    }
}
