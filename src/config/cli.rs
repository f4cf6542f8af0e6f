use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::input::RecordLayout;
use crate::pointer::PointerMode;

#[derive(Parser)]
#[command(name = "padtab")]
#[command(about = "Turn a touchpad into a tablet-style pointer with a centred working area")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Touchpad event device (default: first device named "touchpad")
    #[arg(long, env = "PADTAB_DEVICE")]
    pub device: Option<String>,

    /// Pointer mode (absolute, relative)
    #[arg(long, value_parser = clap::value_parser!(PointerMode))]
    pub mode: Option<PointerMode>,

    /// Do not take an exclusive grab on the touchpad
    #[arg(long)]
    pub no_grab: bool,

    /// Input record layout (native, compat32)
    #[arg(long, value_parser = clap::value_parser!(RecordLayout))]
    pub record_layout: Option<RecordLayout>,

    /// Maximum raw X reported by the touchpad (see `evtest`)
    #[arg(long)]
    pub sensor_max_x: Option<i32>,

    /// Maximum raw Y reported by the touchpad
    #[arg(long)]
    pub sensor_max_y: Option<i32>,

    /// Physical touchpad width in millimetres
    #[arg(long)]
    pub sensor_width_mm: Option<f64>,

    /// Physical touchpad height in millimetres
    #[arg(long)]
    pub sensor_height_mm: Option<f64>,

    /// Width of the centred working area in millimetres
    #[arg(long)]
    pub working_width_mm: Option<f64>,

    /// Height of the centred working area in millimetres
    #[arg(long)]
    pub working_height_mm: Option<f64>,

    /// Target screen width in pixels
    #[arg(long)]
    pub screen_width: Option<i32>,

    /// Target screen height in pixels
    #[arg(long)]
    pub screen_height: Option<i32>,

    /// Milliseconds to wait after creating the virtual pointer
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file
    #[arg(long, env = "PADTAB_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print decoded touchpad events and mapped positions
    Dump,
}
