use crate::poller::DEFAULT_POLL_INTERVAL;
use clap::Parser;
use enact_core::DEFAULT_TRACES_FILE;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug, Default)]
#[command(
    name = "enact-viewer",
    version,
    about = "Poll agent enaction traces and render them as glyph strips"
)]
pub struct Args {
    /// Traces file path, file:// URL or http(s) URL
    #[arg(long)]
    pub source: Option<String>,

    /// Delay between the end of one poll and the start of the next
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Print each new trace panel to stdout instead of running the terminal UI
    #[arg(long, default_value_t = false, conflicts_with = "once")]
    pub plain: bool,

    /// Poll once, print the panel and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,

    #[arg(long, default_value_t = false)]
    pub debug: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Terminal,
    Plain,
    Once,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub source: String,
    pub interval: Duration,
    pub mode: DisplayMode,
    pub debug: bool,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

pub fn load_config() -> Config {
    resolve_config(Args::parse(), |key| std::env::var(key).ok())
}

/// Flags win over `ENACT_*` variables, which win over defaults.
pub fn resolve_config<E>(args: Args, env: E) -> Config
where
    E: Fn(&str) -> Option<String>,
{
    let source = args
        .source
        .or_else(|| non_empty(env("ENACT_TRACES_SOURCE")))
        .unwrap_or_else(|| DEFAULT_TRACES_FILE.to_string());

    let interval = args
        .interval_ms
        .or_else(|| env("ENACT_POLL_INTERVAL_MS").and_then(|value| value.trim().parse().ok()))
        .map(|ms: u64| Duration::from_millis(ms.max(1)))
        .unwrap_or(DEFAULT_POLL_INTERVAL);

    let mode = if args.once {
        DisplayMode::Once
    } else if args.plain {
        DisplayMode::Plain
    } else {
        DisplayMode::Terminal
    };

    let debug = args.debug
        || env("ENACT_DEBUG")
            .and_then(|value| parse_bool_flag(&value))
            .unwrap_or(false);

    let log_level = if debug {
        "debug".to_string()
    } else {
        non_empty(env("ENACT_LOG_LEVEL")).unwrap_or_else(|| "info".to_string())
    };

    let log_file = args
        .log_file
        .or_else(|| non_empty(env("ENACT_LOG_FILE")).map(PathBuf::from));

    Config {
        source,
        interval,
        mode,
        debug,
        log_level,
        log_file,
    }
}

pub fn parse_bool_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_original_viewer() {
        let config = resolve_config(Args::default(), env_from(&[]));
        assert_eq!(config.source, "data/traces.json");
        assert_eq!(config.interval, Duration::from_millis(100));
        assert_eq!(config.mode, DisplayMode::Terminal);
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn env_overrides_defaults_and_flags_override_env() {
        let env = env_from(&[
            ("ENACT_TRACES_SOURCE", "http://localhost:8000/data/traces.json"),
            ("ENACT_POLL_INTERVAL_MS", "250"),
            ("ENACT_LOG_LEVEL", "warn"),
        ]);
        let config = resolve_config(Args::default(), &env);
        assert_eq!(config.source, "http://localhost:8000/data/traces.json");
        assert_eq!(config.interval, Duration::from_millis(250));
        assert_eq!(config.log_level, "warn");

        let args = Args::try_parse_from([
            "enact-viewer",
            "--source",
            "local.json",
            "--interval-ms",
            "0",
            "--plain",
        ])
        .unwrap();
        let config = resolve_config(args, &env);
        assert_eq!(config.source, "local.json");
        assert_eq!(config.interval, Duration::from_millis(1));
        assert_eq!(config.mode, DisplayMode::Plain);
    }

    #[test]
    fn debug_flag_from_env_forces_debug_level() {
        let env = env_from(&[("ENACT_DEBUG", "yes"), ("ENACT_LOG_LEVEL", "warn")]);
        let config = resolve_config(Args::default(), env);
        assert!(config.debug);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn invalid_interval_env_falls_back_to_default() {
        let env = env_from(&[("ENACT_POLL_INTERVAL_MS", "soon")]);
        let config = resolve_config(Args::default(), env);
        assert_eq!(config.interval, DEFAULT_POLL_INTERVAL);
    }

    #[test]
    fn plain_and_once_conflict() {
        assert!(Args::try_parse_from(["enact-viewer", "--plain", "--once"]).is_err());
        let args = Args::try_parse_from(["enact-viewer", "--once"]).unwrap();
        assert_eq!(resolve_config(args, env_from(&[])).mode, DisplayMode::Once);
    }

    #[test]
    fn parse_bool_flag_accepts_common_spellings() {
        assert_eq!(parse_bool_flag(" On "), Some(true));
        assert_eq!(parse_bool_flag("0"), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }
}
