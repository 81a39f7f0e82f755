//! Configuration loading and parsing.
//!
//! Parses `selbuf.toml` (or an override path provided by the binary). Every
//! section and field is optional; absent values take their defaults and
//! unknown fields are ignored so the file format can grow without warnings.
//!
//! ```toml
//! [buffer]
//! initial_capacity = 4096   # elements pre-allocated before loading
//!
//! [history]
//! max_entries = 256         # 0 keeps every edit
//!
//! [log]
//! filter = "info"           # EnvFilter directive, RUST_LOG wins when set
//! file = "selbuf.log"       # omit to log to stderr
//! ```
//!
//! `[history] max_entries` bounds the undo history of buffers built from this
//! config. One `selbuf` invocation records a single edit and never undoes it,
//! so the limit only shows up for library callers that keep a buffer open
//! across many edits.
//!
//! A file that fails to parse is reported at `warn` and replaced by defaults.
//! The raw `initial_capacity` is retained; the effective value is clamped to
//! [`MAX_INITIAL_CAPACITY`] when the file is loaded.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, io, path::PathBuf};
use tracing::{debug, info, warn};

pub const FILE_NAME: &str = "selbuf.toml";

/// Upper bound for the pre-allocated element count.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 28;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    #[serde(default)]
    pub initial_capacity: usize,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    #[serde(default)]
    pub max_entries: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LogConfig {
    #[serde(default = "LogConfig::default_filter")]
    pub filter: String,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: Self::default_filter(),
            file: None,
        }
    }
}

impl LogConfig {
    fn default_filter() -> String {
        String::from("info")
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub buffer: BufferConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,       // original file string (optional)
    pub source: Option<PathBuf>,   // path the file was read from
    pub file: ConfigFile,          // parsed (or default) data
    pub effective_initial_capacity: usize,
}

/// Best-effort config path: `./selbuf.toml` first, then the platform config
/// directory (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("selbuf").join(FILE_NAME);
    }
    local
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(target: "config", path = %path.display(), "config_not_found");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    let mut cfg = match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Config {
            raw: Some(content),
            source: Some(path),
            file,
            effective_initial_capacity: 0, // computed below
        },
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            return Ok(Config::default());
        }
    };
    cfg.apply_limits();
    Ok(cfg)
}

impl Config {
    /// History retention for `UndoableEditableBuffer::with_history_limit`:
    /// `None` keeps every entry.
    pub fn history_limit(&self) -> Option<usize> {
        match self.file.history.max_entries {
            0 => None,
            n => Some(n),
        }
    }

    pub fn log_filter(&self) -> &str {
        &self.file.log.filter
    }

    /// Clamp raw values into their supported ranges. Returns the effective
    /// initial capacity.
    pub fn apply_limits(&mut self) -> usize {
        let raw = self.file.buffer.initial_capacity;
        let clamped = raw.min(MAX_INITIAL_CAPACITY);
        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max = MAX_INITIAL_CAPACITY,
                "buffer_initial_capacity_clamped"
            );
        }
        self.effective_initial_capacity = clamped;
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex, MutexGuard};
    use tracing::Level;
    use tracing::subscriber::with_default;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone)]
    struct BufferWriter {
        inner: Arc<Mutex<Vec<u8>>>,
    }

    impl BufferWriter {
        fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
            let buf = Arc::new(Mutex::new(Vec::new()));
            (Self { inner: buf.clone() }, buf)
        }
    }

    struct LockedWriter<'a> {
        guard: MutexGuard<'a, Vec<u8>>,
    }

    impl<'a> Write for LockedWriter<'a> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.guard.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = LockedWriter<'a>;

        fn make_writer(&'a self) -> Self::Writer {
            LockedWriter {
                guard: self.inner.lock().expect("log buffer poisoned"),
            }
        }
    }

    fn capture<F: FnOnce()>(level: Level, f: F) -> String {
        let (writer, buffer) = BufferWriter::new();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(true)
            .with_ansi(false)
            .without_time()
            .with_writer(writer)
            .finish();
        with_default(subscriber, f);
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn load_str(content: &str) -> Config {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), content).unwrap();
        load_from(Some(tmp.path().to_path_buf())).unwrap()
    }

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert_eq!(cfg.file, ConfigFile::default());
        assert_eq!(cfg.history_limit(), None);
        assert_eq!(cfg.log_filter(), "info");
        assert!(cfg.raw.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let cfg = load_str(
            "[buffer]\ninitial_capacity = 64\n[history]\nmax_entries = 5\n\
             [log]\nfilter = \"debug,buffer.edit=trace\"\nfile = \"out.log\"\n",
        );
        assert_eq!(cfg.effective_initial_capacity, 64);
        assert_eq!(cfg.history_limit(), Some(5));
        assert_eq!(cfg.log_filter(), "debug,buffer.edit=trace");
        assert_eq!(cfg.file.log.file, Some(PathBuf::from("out.log")));
        assert!(cfg.source.is_some());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let cfg = load_str("[history]\nmax_entries = 0\nunknown = true\n");
        assert_eq!(cfg.history_limit(), None);
        assert_eq!(cfg.file.log, LogConfig::default());
        assert_eq!(cfg.file.buffer.initial_capacity, 0);
    }

    #[test]
    fn parse_error_falls_back_and_warns() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[history]\nmax_entries = \"many\"\n").unwrap();
        let mut cfg = None;
        let log_output = capture(Level::WARN, || {
            cfg = Some(load_from(Some(tmp.path().to_path_buf())).unwrap());
        });
        let cfg = cfg.unwrap();
        assert_eq!(cfg.file, ConfigFile::default());
        assert!(log_output.contains("WARN config:"));
        assert!(log_output.contains("config_parse_failed"));
    }

    #[test]
    fn oversized_capacity_is_clamped_and_logged() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[buffer]\ninitial_capacity = 1000000000000\n").unwrap();
        let mut cfg = None;
        let log_output = capture(Level::INFO, || {
            cfg = Some(load_from(Some(tmp.path().to_path_buf())).unwrap());
        });
        let cfg = cfg.unwrap();
        assert_eq!(cfg.file.buffer.initial_capacity, 1_000_000_000_000);
        assert_eq!(cfg.effective_initial_capacity, MAX_INITIAL_CAPACITY);
        assert!(log_output.contains("INFO config:"));
        assert!(log_output.contains("buffer_initial_capacity_clamped"));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from(Some(dir.path().to_path_buf())).unwrap_err();
        assert!(err.to_string().contains("reading config"));
    }
}
