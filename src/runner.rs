use std::path::Path;

use anyhow::{Context, Result, anyhow};
use camino::Utf8PathBuf;

use priolog::config::{self, LoggerSet, PriologConfig};
use priolog::paths::{self, Destination};
use priolog::{LineReader, dates};

use crate::cli::{Cli, Command, ConfigCommand, DateCommand, LogArgs, LoggerArgs};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum ConfigPathSource {
    Explicit,
    HomeDefault,
}

impl ConfigPathSource {
    fn as_str(&self) -> &'static str {
        match self {
            ConfigPathSource::Explicit => "explicit",
            ConfigPathSource::HomeDefault => "home-default",
        }
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfigPath {
    path: Utf8PathBuf,
    source: ConfigPathSource,
}

impl ResolvedConfigPath {
    fn from_cli(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self {
                path: to_utf8(path)?,
                source: ConfigPathSource::Explicit,
            }),
            None => Ok(Self {
                path: config::default_path()?,
                source: ConfigPathSource::HomeDefault,
            }),
        }
    }

    fn load(&self) -> Result<PriologConfig> {
        match self.source {
            ConfigPathSource::Explicit => config::load_from_path(&self.path),
            ConfigPathSource::HomeDefault => config::load_or_default(&self.path),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config_path = ResolvedConfigPath::from_cli(cli.config.as_deref())?;
    tracing::debug!(path = %config_path.path, source = config_path.source.as_str(), "config path");

    match cli.command {
        Command::Config { command } => handle_config(&config_path, command),
        Command::Date { command } => handle_date(command),
        Command::Path { name } => handle_path(&name, cli.overrides.dir.as_deref()),
        Command::Log(args) => {
            let set = build_loggers(&config_path, &cli.overrides, &args.tee)?;
            handle_log(&set, args)
        }
        Command::Replay { path, tee } => {
            let set = build_loggers(&config_path, &cli.overrides, &tee)?;
            handle_replay(&set, &path)
        }
    }
}

fn build_loggers(
    config_path: &ResolvedConfigPath,
    overrides: &LoggerArgs,
    tee: &[String],
) -> Result<LoggerSet> {
    let mut config = config_path.load()?;
    if overrides.file.is_some() {
        config.file = overrides.file.clone();
    }
    if overrides.dir.is_some() {
        config.dir = overrides.dir.clone();
    }
    if overrides.sim_time.is_some() {
        config.simulated_time = overrides.sim_time.clone();
    }

    let mut set = config.build()?;
    if let Some(threshold) = overrides.threshold {
        set.primary.set_threshold(threshold);
    }
    for file in tee {
        set.tee(file, config.dir.as_deref())?;
    }
    Ok(set)
}

fn handle_log(set: &LoggerSet, args: LogArgs) -> Result<()> {
    let message = args.message.join(" ");
    set.primary.log(args.priority, &message)?;
    Ok(())
}

fn handle_replay(set: &LoggerSet, path: &Path) -> Result<()> {
    let reader =
        LineReader::open(path).with_context(|| format!("opening {}", path.display()))?;

    let mut count = 0usize;
    for line in reader {
        let (priority, message) = parse_replay_line(&line)?;
        set.primary.log(priority, message)?;
        count += 1;
    }
    tracing::info!(count, "replayed log lines");
    Ok(())
}

fn parse_replay_line(line: &str) -> Result<(u32, &str)> {
    let (priority, message) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let priority = priority
        .parse::<u32>()
        .with_context(|| format!("invalid priority in replay line `{}`", line))?;
    Ok((priority, message.trim_start()))
}

fn handle_path(name: &str, dir: Option<&str>) -> Result<()> {
    match paths::resolve(Some(name), dir)? {
        Destination::File(path) => println!("{}", path),
        Destination::Console => println!("<stderr>"),
        Destination::Discard => println!("<discard>"),
    }
    Ok(())
}

fn handle_date(command: DateCommand) -> Result<()> {
    match command {
        DateCommand::FromOrdinal { ordinal } => {
            println!("{}", dates::ordinal_to_string(ordinal)?);
        }
        DateCommand::ToOrdinal { date } => {
            println!("{}", dates::string_to_ordinal(&date)?);
        }
        DateCommand::Today => {
            let today = dates::today_ordinal();
            println!("{} {}", today, dates::ordinal_to_string(today)?);
        }
    }
    Ok(())
}

fn handle_config(config_path: &ResolvedConfigPath, command: Option<ConfigCommand>) -> Result<()> {
    match command.unwrap_or(ConfigCommand::Show) {
        ConfigCommand::Show => {
            let config = config_path.load()?;
            println!(
                "Config: {} ({})",
                config_path.path,
                config_path.source.as_str()
            );
            print!("{}", config::format_summary(&config));
        }
        ConfigCommand::Path => println!("{}", config_path.path),
        ConfigCommand::Init { force } => {
            config::write_example_config(&config_path.path, force)?;
            println!("Wrote example config to {}", config_path.path);
        }
        ConfigCommand::SetThreshold { threshold } => {
            config::set_threshold(&config_path.path, threshold)?;
            println!("Threshold set to {} in {}", threshold, config_path.path);
        }
    }
    Ok(())
}

fn to_utf8(path: &Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|p| anyhow!("path {} is not valid UTF-8", p.display()))
}
