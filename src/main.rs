mod config;
mod device;
mod dump;
mod error;
mod geometry;
mod input;
mod pointer;
mod session;
mod signal;

use std::thread;

use clap::Parser;

use crate::config::{Cli, Command, Config};
use crate::device::SourceDevice;
use crate::error::Error;
use crate::geometry::Mapper;
use crate::input::RecordReader;
use crate::pointer::VirtualPointer;
use crate::session::Session;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = Config::load(&cli);

    let result = match cli.command {
        Some(Command::Dump) => dump::run_dump(&config),
        None => run(&config),
    };

    if let Err(e) = result {
        eprintln!("padtab: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), Error> {
    config.validate()?;
    let shutdown = signal::install()?;
    let path = config.device_path()?;

    let cal = &config.calibration;
    log::info!(
        "padtab starting (device={}, mode={}, grab={}, working area {}x{} mm of {}x{} mm -> {}x{})",
        path,
        config.mode,
        config.grab,
        cal.working_width_mm,
        cal.working_height_mm,
        cal.sensor_width_mm,
        cal.sensor_height_mm,
        cal.screen_width,
        cal.screen_height
    );

    let source = SourceDevice::open(&path, config.grab)?.with_wake(shutdown.wake);
    let pointer = VirtualPointer::create(config.mode, cal)?;

    // Give udev/libinput time to attach before sending events (kernel uinput docs).
    thread::sleep(config.settle());

    let reader = RecordReader::new(source, config.record_layout);
    let mut session = Session::new(reader, pointer, Mapper::new(cal));
    let result = session.run(shutdown.flag);
    session.finish();
    result.map(|_| ())
}
