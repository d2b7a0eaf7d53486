//! CLI argument parsing

use clap::Parser;
use dyesub_rs::PrinterModel;
use std::path::PathBuf;

/// Parse a model short name, such as `es40` or `cp900`
fn parse_model(s: &str) -> Result<PrinterModel, String> {
    s.parse::<PrinterModel>().map_err(|e| e.to_string())
}

/// Generate help text listing the model names
fn model_help() -> String {
    let names: Vec<&str> = PrinterModel::ALL.iter().map(|model| model.short_name()).collect();
    format!(
        "Print as this model instead of the detected one, only the model sharing the job's header layout is accepted [available: {}]",
        names.join(", ")
    )
}

#[derive(Parser)]
#[command(name = "dyesub-print")]
#[command(author, version, about = "Prints spooled jobs on Canon SELPHY and Kodak 6800 printers", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Spooled job to print, `-` reads standard input
    pub input: String,

    /// Character device to print through, such as /dev/usb/lp0. USB is used when omitted
    pub outdevice: Option<PathBuf>,

    /// Number of copies
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub copies: u32,

    #[arg(long, value_parser = parse_model, help = model_help())]
    pub model: Option<PrinterModel>,

    /// Only use the USB printer reporting this serial number
    #[arg(long)]
    pub serial: Option<String>,

    /// Wait between two identical readbacks, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub poll_interval_ms: u64,

    /// Give up the job when the printer reports the wrong paper, instead of waiting for it to be changed
    #[arg(long)]
    pub abort_on_paper_mismatch: bool,

    /// Print what the job header says as JSON, without touching any printer
    #[arg(long)]
    pub describe: bool,
}
