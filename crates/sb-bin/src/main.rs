//! selbuf entrypoint: patch a binary file through selection edits.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_buffer::{EditableBuffer, IndexSelection, SparseIndexedValues, UndoableEditableBuffer};
use core_config::{Config, load_from};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod select;

use select::{parse_byte, parse_selection};

#[derive(Parser, Debug)]
#[command(name = "selbuf", version, about = "Selection-based binary patcher")]
struct Args {
    /// File to read.
    input: PathBuf,
    /// Where to write the result. Defaults to rewriting INPUT in place.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Configuration file path (overrides discovery of `selbuf.toml`).
    #[arg(long = "config")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Overwrite every selected byte with VALUE.
    Fill {
        #[arg(long, value_parser = parse_selection)]
        select: IndexSelection,
        #[arg(long, value_parser = parse_byte)]
        value: u8,
    },
    /// XOR every selected byte with MASK.
    Xor {
        #[arg(long, value_parser = parse_selection)]
        select: IndexSelection,
        #[arg(long, value_parser = parse_byte)]
        mask: u8,
    },
    /// Delete the selected bytes.
    Remove {
        #[arg(long, value_parser = parse_selection)]
        select: IndexSelection,
    },
    /// Insert VALUE so that it ends up at each selected index.
    Insert {
        #[arg(long, value_parser = parse_selection)]
        at: IndexSelection,
        #[arg(long, value_parser = parse_byte)]
        value: u8,
    },
    /// Print the selected bytes as hex, one `index: byte` per line.
    Show {
        #[arg(long, value_parser = parse_selection)]
        select: IndexSelection,
    },
}

impl Command {
    fn modifies(&self) -> bool {
        !matches!(self, Command::Show { .. })
    }

    /// `name selection` for error context, e.g. `remove {1, 3}`.
    fn describe(&self) -> String {
        let (name, selection) = match self {
            Command::Fill { select, .. } => ("fill", select),
            Command::Xor { select, .. } => ("xor", select),
            Command::Remove { select } => ("remove", select),
            Command::Insert { at, .. } => ("insert", at),
            Command::Show { select } => ("show", select),
        };
        format!("{name} {selection}")
    }
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    /// Load configuration, then install logging according to it.
    fn run(&mut self, args: &Args) -> Result<Config> {
        // Config problems are reported on stderr before the real subscriber exists.
        let bootstrap = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("warn"))
            .with_writer(std::io::stderr)
            .finish();
        let config = tracing::subscriber::with_default(bootstrap, || {
            load_from(args.config.clone())
        })?;

        self.configure_logging(&config)?;
        Self::install_panic_hook();

        info!(
            target: "runtime.startup",
            input = %args.input.display(),
            config = config.source.as_ref().map(|p| p.display().to_string()).as_deref(),
            config_override = args.config.is_some(),
            history_limit = config.history_limit(),
            initial_capacity = config.effective_initial_capacity,
            "bootstrap_complete"
        );
        Ok(config)
    }

    fn configure_logging(&mut self, config: &Config) -> Result<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(config.log_filter()))
            .with_context(|| format!("invalid log filter `{}`", config.log_filter()))?;

        let installed = match &config.file.log.file {
            Some(path) => {
                let dir = path.parent().filter(|d| !d.as_os_str().is_empty());
                let dir = dir.unwrap_or(Path::new("."));
                let name = path
                    .file_name()
                    .with_context(|| format!("log file `{}` has no name", path.display()))?;
                let file_appender = tracing_appender::rolling::never(dir, name);
                let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
                let result = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(nb_writer)
                    .try_init();
                if result.is_ok() {
                    self.log_guard = Some(guard);
                }
                result
            }
            None => tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init(),
        };
        if installed.is_err() {
            // Global tracing subscriber already installed; keep using it.
            debug!(target: "runtime.startup", "subscriber_already_installed");
        }
        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn load_buffer(path: &Path, config: &Config) -> Result<UndoableEditableBuffer<u8>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    debug!(target: "io", file = %path.display(), size_bytes = bytes.len(), "file_read_ok");
    let mut buffer =
        EditableBuffer::with_capacity(config.effective_initial_capacity.max(bytes.len()));
    buffer.extend_from(&bytes);
    Ok(UndoableEditableBuffer::from(buffer).with_history_limit(config.history_limit()))
}

/// Run `command` against `buffer`. Returns the lines to print.
fn apply(buffer: &mut UndoableEditableBuffer<u8>, command: &Command) -> Result<Vec<String>> {
    match command {
        Command::Fill { select, value } => {
            buffer.transform_selection(select, |_| *value)?;
        }
        Command::Xor { select, mask } => {
            buffer.transform_selection(select, |b| b ^ mask)?;
        }
        Command::Remove { select } => {
            buffer.remove_selection(select)?;
        }
        Command::Insert { at, value } => {
            let values = SparseIndexedValues::new(at.clone()).map(|_| *value);
            buffer.insert_selection(&values)?;
        }
        Command::Show { select } => {
            let snapshot = buffer.snapshot(select)?;
            return Ok(snapshot
                .iter()
                .map(|(index, byte)| format!("{index:#010x}: {byte:02x}"))
                .collect());
        }
    }
    info!(
        target: "runtime",
        edit = buffer.undo_description().as_deref(),
        len = buffer.len(),
        version = buffer.version(),
        "edit_applied"
    );
    Ok(Vec::new())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    let config = startup.run(&args)?;

    let mut buffer = load_buffer(&args.input, &config)?;
    let lines = apply(&mut buffer, &args.command)
        .with_context(|| format!("applying {}", args.command.describe()))?;
    for line in lines {
        println!("{line}");
    }

    if args.command.modifies() {
        let dest = args.output.as_deref().unwrap_or(&args.input);
        std::fs::write(dest, buffer.as_slice())
            .with_context(|| format!("writing {}", dest.display()))?;
        info!(target: "io", file = %dest.display(), size_bytes = buffer.len(), "file_write_ok");
    }
    Ok(())
}
