//! dyesub-print - prints a spooled job on a dye-sublimation printer
//!
//! The job header decides which printer is looked for. Without an output device the printer is
//! found on USB; the CP series and the CP900 share a header layout, so either one is accepted
//! unless `--model` says otherwise.

mod cli;

use clap::Parser;
use cli::Cli;
use dyesub_rs::{
    Error, FilePrinter, JobOptions, JobReader, PaperPolicy, Printer, SpooledJob, Transport,
    UsbPrinter, DEFAULT_USB_TIMEOUT,
};
use std::fs::File;
use std::io::{self, Read};
use std::process::ExitCode;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

/// Why the run stopped early
enum Failure {
    /// Nothing was sent to a printer yet
    Setup(Error),
    /// The printer was in the middle of a job
    Aborted(Error),
}

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also end up here
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let terminate = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    register_signals(&terminate);

    match run(&cli, terminate) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Setup(e)) => {
            log::error!("{}", e);
            ExitCode::from(1)
        }
        Err(Failure::Aborted(e)) => {
            log::error!("Job aborted: {}", e);
            ExitCode::from(2)
        }
    }
}

/// The first signal stops after the current copy, a second one exits right away
#[cfg(unix)]
fn register_signals(terminate: &Arc<AtomicBool>) {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};

    for signal in [SIGINT, SIGTERM].iter() {
        let registered = signal_hook::flag::register_conditional_shutdown(*signal, 1, Arc::clone(terminate))
            .and_then(|_| signal_hook::flag::register(*signal, Arc::clone(terminate)));
        if let Err(e) = registered {
            log::warn!("Could not register a handler for signal {}: {}", signal, e);
        }
    }
}

fn run(cli: &Cli, terminate: Arc<AtomicBool>) -> Result<(), Failure> {
    let source: Box<dyn Read> = if cli.input == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(File::open(&cli.input).map_err(|e| Failure::Setup(e.into()))?)
    };
    let mut reader = JobReader::new(source).map_err(Failure::Setup)?;
    if let Some(model) = cli.model {
        reader = reader.with_model(model).map_err(Failure::Setup)?;
    }

    if cli.describe {
        let description = serde_json::to_string_pretty(reader.descriptor())
            .map_err(|e| Failure::Setup(Error::Io(e.into())))?;
        println!("{}", description);
        return Ok(());
    }

    let options = JobOptions::builder()
        .with_copies(cli.copies)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))
        .with_paper_policy(if cli.abort_on_paper_mismatch {
            PaperPolicy::Abort
        } else {
            PaperPolicy::KeepPolling
        })
        .with_terminate(terminate)
        .build();

    match &cli.outdevice {
        Some(path) => {
            if cli.serial.is_some() {
                log::warn!("--serial only applies to USB printers, ignoring it");
            }
            let transport = FilePrinter::open(path).map_err(Failure::Setup)?;
            let job = reader.spool(options.buffer_capacity()).map_err(Failure::Setup)?;
            print(transport, options, &job)
        }
        None => {
            let detected = reader.descriptor().model();
            let mut models = vec![detected];
            if cli.model.is_none() {
                models.extend(detected.header_twin());
            }
            let (found, transport) = UsbPrinter::open_any(&models, cli.serial.as_deref(), DEFAULT_USB_TIMEOUT)
                .map_err(Failure::Setup)?;
            if found != detected {
                reader = reader.with_model(found).map_err(Failure::Setup)?;
            }
            let job = reader.spool(options.buffer_capacity()).map_err(Failure::Setup)?;
            print(transport, options, &job)
        }
    }
}

fn print<T: Transport>(transport: T, options: JobOptions, job: &SpooledJob) -> Result<(), Failure> {
    let mut printer = Printer::new(transport, options);
    printer.print(job).map_err(Failure::Aborted)?;
    Ok(())
}
