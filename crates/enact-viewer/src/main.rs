mod config;
mod poller;
mod source;
mod state;
mod theme;
mod ui;
mod viewer;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use config::{Config, DisplayMode};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use enact_core::TracePanel;
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use source::TraceSource;
use std::{
    fs::OpenOptions,
    io::{self, Write},
    sync::{Arc, Mutex},
};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::TraceViewer;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load_config();
    init_logging(&config)?;

    let source = source::source_from_location(&config.source)
        .with_context(|| format!("invalid trace source {}", config.source))?;
    info!(
        event = "viewer_start",
        source = source.location(),
        mode = ?config.mode,
        debug = config.debug,
        interval_ms = config.interval.as_millis() as u64
    );

    match config.mode {
        DisplayMode::Once => run_once(source).await,
        DisplayMode::Plain => run_plain(&config, source).await,
        DisplayMode::Terminal => run_terminal(&config, source).await,
    }
}

async fn run_once(source: Arc<dyn TraceSource>) -> Result<()> {
    let mut stdout = io::stdout().lock();
    load_once(source.as_ref(), &mut stdout).await
}

/// A failed cycle is returned as an error, so the process exits non-zero.
async fn load_once<W: Write>(source: &dyn TraceSource, out: &mut W) -> Result<()> {
    let mut viewer = TraceViewer::new();
    viewer
        .poll_cycle(source)
        .await
        .with_context(|| format!("failed to load traces from {}", source.location()))?;
    info!(
        event = "traces_loaded",
        bytes = viewer.previous_payload().map_or(0, str::len),
        agents = viewer.panel().len()
    );
    write!(out, "{}", viewer.panel())?;
    out.flush()?;
    Ok(())
}

async fn run_plain(config: &Config, source: Arc<dyn TraceSource>) -> Result<()> {
    let handle = poller::spawn_poller(source, config.interval, TraceViewer::new(), print_panel);
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    handle.shutdown().await;
    Ok(())
}

fn print_panel(panel: &TracePanel) {
    let mut stdout = io::stdout().lock();
    if let Err(err) = write_stamped_panel(&mut stdout, panel, Local::now()) {
        error!(event = "stdout_write_failed", error = %err);
    }
}

fn write_stamped_panel<W: Write>(
    out: &mut W,
    panel: &TracePanel,
    at: DateTime<Local>,
) -> io::Result<()> {
    let stamp = at.format("%H:%M:%S%.3f");
    write!(out, "--- {stamp} ---\n{panel}")?;
    out.flush()
}

async fn run_terminal(config: &Config, source: Arc<dyn TraceSource>) -> Result<()> {
    let mut app = state::App::new(source.location().to_string(), config.interval);
    let (panel_tx, panel_rx) = watch::channel(TracePanel::new());
    let handle = poller::spawn_poller(
        source,
        config.interval,
        TraceViewer::new(),
        move |panel: &TracePanel| {
            panel_tx.send_replace(panel.clone());
        },
    );

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, panel_rx).await;
    restore_terminal(&mut terminal)?;
    handle.shutdown().await;

    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut state::App,
    mut panel_rx: watch::Receiver<TracePanel>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut poller_alive = true;

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            changed = panel_rx.changed(), if poller_alive => {
                match changed {
                    Ok(()) => {
                        let panel = panel_rx.borrow_and_update().clone();
                        app.apply_panel(panel);
                    }
                    Err(_) => poller_alive = false,
                }
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                            app.handle_key(key);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err).context("terminal event stream failed"),
                    None => break,
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}

/// The terminal UI owns stdout, so without a log file its logs are dropped.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if config.mode == DisplayMode::Terminal {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::scripted::{transport_error, ScriptedSource};
    use chrono::TimeZone;

    #[tokio::test]
    async fn once_mode_prints_the_panel() {
        let source = ScriptedSource::new(vec![Ok(
            r#"{"b": {"enaction": [["Feel", 0]]}, "a": {"enaction": [["Step", 0]]}}"#.to_string(),
        )]);
        let mut out = Vec::new();
        load_once(&source, &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\n →\nb\n ■\n");
    }

    #[tokio::test]
    async fn once_mode_fails_when_the_cycle_fails() {
        let mut out = Vec::new();

        let unreachable = ScriptedSource::new(vec![Err(transport_error())]);
        let err = load_once(&unreachable, &mut out).await.unwrap_err();
        assert!(err.to_string().contains("failed to load traces from scripted"));

        let malformed = ScriptedSource::new(vec![Ok("{not json".to_string())]);
        assert!(load_once(&malformed, &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn plain_mode_prefixes_each_panel_with_a_timestamp() {
        let dataset =
            enact_core::TraceDataset::parse(r#"{"A": {"enaction": [["Bump", 0]]}}"#).unwrap();
        let panel = TracePanel::from_dataset(&dataset);
        let at = Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap();

        let mut out = Vec::new();
        write_stamped_panel(&mut out, &panel, at).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "--- 09:30:15.000 ---\nA\n ⇝\n");
    }
}
