use clap::Parser;
use std::path::PathBuf;

// Build version with engine info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Engine: emulated-inertia scroll (eased tween)\n",
    "Host:   eframe/egui\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Scroll-narrative presentation engine
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    /// Jump to a section id after startup (e.g. "tunnel")
    #[arg(short = 's', long = "section", value_name = "ID")]
    pub section: Option<String>,

    /// Start in fullscreen mode
    #[arg(short = 'F', long = "fullscreen")]
    pub fullscreen: bool,

    /// Disable smooth wheel (direct positioning, no inertia)
    #[arg(long = "no-smooth")]
    pub no_smooth: bool,

    /// Skip the startup preloader lock
    #[arg(long = "no-preloader")]
    pub no_preloader: bool,

    /// Particle count override for the starfield chapter
    #[arg(long = "particles", value_name = "N")]
    pub particles: Option<usize>,

    /// Verbosity: -v info, -vv debug, -vvv trace (default: warn)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,

    /// Log to file instead of console; optional path
    #[arg(long = "log", value_name = "FILE")]
    pub log_file: Option<Option<PathBuf>>,
}
