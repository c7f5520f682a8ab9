use std::fmt::Write as _;
use std::fs;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use toml_edit::{DocumentMut, value};

use crate::logger::{DEFAULT_THRESHOLD, Logger};

const EXAMPLE_CONFIG: &str = r#"# priolog configuration

# Messages with a priority above this number are suppressed.
threshold = 2

# Log file, resolved against `dir` (or the working directory).
# Leave `file` out to log to standard error; set it to "" to discard output.
file = "priolog.log"
dir = "~/.priolog/logs"

# Fixed line prefix used instead of the wall-clock timestamp.
# simulated_time = "day 1"

# Every message is also forwarded to these loggers.
[[targets]]
file = "errors.log"
dir = "~/.priolog/logs"
threshold = 1
"#;

/// Root configuration document loaded from `~/.priolog/config.toml` by default.
#[derive(Debug, Default, Deserialize)]
pub struct PriologConfig {
    pub threshold: Option<u32>,
    pub file: Option<String>,
    pub dir: Option<String>,
    pub simulated_time: Option<String>,
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

/// A fan-out logger fed by the primary one.
#[derive(Debug, Deserialize)]
pub struct TargetConfig {
    pub file: Option<String>,
    pub dir: Option<String>,
    pub threshold: Option<u32>,
}

/// The primary logger plus the fan-out targets it holds weak references to.
#[derive(Debug)]
pub struct LoggerSet {
    pub primary: Rc<Logger>,
    pub targets: Vec<Rc<Logger>>,
}

impl LoggerSet {
    /// Add another fan-out target and keep it alive alongside the others.
    pub fn tee(&mut self, file: &str, dir: Option<&str>) -> Result<()> {
        let target = Rc::new(
            Logger::new(Some(file), dir, self.primary.threshold())
                .with_context(|| format!("opening tee target {}", file))?,
        );
        target.set_simulated_time(self.primary.simulated_time().as_deref());
        self.primary.register_fan_out(&target);
        self.targets.push(target);
        Ok(())
    }
}

impl PriologConfig {
    pub fn threshold(&self) -> u32 {
        self.threshold.unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn build(&self) -> Result<LoggerSet> {
        let primary = Rc::new(
            Logger::new(self.file.as_deref(), self.dir.as_deref(), self.threshold())
                .context("configuring primary logger")?,
        );
        primary.set_simulated_time(self.simulated_time.as_deref());

        let mut targets = Vec::with_capacity(self.targets.len());
        for (idx, target) in self.targets.iter().enumerate() {
            let logger = Logger::new(
                target.file.as_deref(),
                target.dir.as_deref(),
                target.threshold.unwrap_or(DEFAULT_THRESHOLD),
            )
            .with_context(|| format!("configuring fan-out target #{}", idx + 1))?;
            logger.set_simulated_time(self.simulated_time.as_deref());

            let logger = Rc::new(logger);
            primary.register_fan_out(&logger);
            targets.push(logger);
        }

        Ok(LoggerSet { primary, targets })
    }
}

/// `~/.priolog/config.toml`
pub fn default_path() -> Result<Utf8PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("could not determine home directory"))?;
    let home = Utf8PathBuf::from_path_buf(home)
        .map_err(|_| anyhow!("home directory is not valid UTF-8"))?;
    Ok(home.join(".priolog").join("config.toml"))
}

/// Load a configuration file from disk and deserialize it.
pub fn load_from_path(path: &Utf8Path) -> Result<PriologConfig> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path))
}

/// Like [`load_from_path`], but a missing file yields the defaults.
pub fn load_or_default(path: &Utf8Path) -> Result<PriologConfig> {
    if path.exists() {
        load_from_path(path)
    } else {
        tracing::debug!(%path, "no config file, using defaults");
        Ok(PriologConfig::default())
    }
}

pub fn write_example_config(path: &Utf8Path, overwrite: bool) -> Result<()> {
    if path.exists() && !overwrite {
        bail!("{} already exists; rerun with --force to overwrite", path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent))?;
    }
    fs::write(path, EXAMPLE_CONFIG).with_context(|| format!("writing config {}", path))
}

/// Update `threshold` in place, keeping the rest of the file untouched.
pub fn set_threshold(path: &Utf8Path, threshold: u32) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating directory {}", parent))?;
    }

    let mut doc: DocumentMut = if path.exists() {
        let raw = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        raw.parse()
            .with_context(|| format!("parsing config {}", path))?
    } else {
        DocumentMut::new()
    };

    doc["threshold"] = value(i64::from(threshold));

    fs::write(path, doc.to_string()).with_context(|| format!("writing config {}", path))
}

pub fn format_summary(config: &PriologConfig) -> String {
    let mut out = String::new();
    let file = match config.file.as_deref() {
        None => "<stderr>",
        Some("") => "<discard>",
        Some(file) => file,
    };

    let _ = writeln!(out, "Threshold: {}", config.threshold());
    let _ = writeln!(out, "File: {}", file);
    let _ = writeln!(out, "Directory: {}", config.dir.as_deref().unwrap_or("<cwd>"));
    let _ = writeln!(
        out,
        "Simulated time: {}",
        config.simulated_time.as_deref().unwrap_or("<off>")
    );
    let _ = writeln!(out, "Fan-out targets: {}", config.targets.len());
    for target in &config.targets {
        let _ = writeln!(
            out,
            "  - {} (dir: {}; threshold: {})",
            target.file.as_deref().unwrap_or("<stderr>"),
            target.dir.as_deref().unwrap_or("<cwd>"),
            target.threshold.unwrap_or(DEFAULT_THRESHOLD)
        );
    }

    out
}
