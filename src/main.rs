//! Terminal demo for the infinite grid.
//!
//! Scroll a grid of up to billions of cells while only a screenful (plus a
//! buffer) of cells exists. Content comes from a simulated backing store;
//! use `--latency-ms` to watch batches being throttled.

use std::fs::File;
use std::io::{self, stderr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::Rect,
    widgets::{Block, Borders},
    Terminal,
};
use tracing::info;

use infinite_grid::app::{
    event::{spawn_event_reader, AppEvent},
    handler,
    state::{ActiveView, AppState},
    store_runtime::StoreRuntime,
};
use infinite_grid::config::AppConfig;
use infinite_grid::core::{GeneratorStore, GridEngine, MemorySurface, RenderingMode};
use infinite_grid::ui::{
    grid_widget::GridWidget, layout::AppLayout, popup::ControlsPopup, spinner::FetchIndicator,
    status::StatusBar, theme::Theme,
};

// ───────────────────────────────────────── CLI ───────────────

/// Grid values override the config file. They are taken as signed so a
/// bad value gets a proper configuration error.
#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    about = "Scroll an arbitrarily large grid through a small recycled window",
    allow_negative_numbers = true
)]
struct Cli {
    /// Cell width in terminal columns.
    #[arg(long)]
    cell_width: Option<i64>,

    /// Cell height in terminal rows.
    #[arg(long)]
    cell_height: Option<i64>,

    /// Number of columns in the grid.
    #[arg(long)]
    columns: Option<i64>,

    /// Number of rows in the grid.
    #[arg(long)]
    rows: Option<i64>,

    /// Header rows with fixed labels.
    #[arg(long)]
    frozen_rows: Option<i64>,

    /// Leading columns pinned to the left edge.
    #[arg(long)]
    frozen_columns: Option<i64>,

    /// Extra columns kept beyond the visible area.
    #[arg(long)]
    buffer_x: Option<i64>,

    /// Extra rows kept beyond the visible area.
    #[arg(long)]
    buffer_y: Option<i64>,

    /// raw, text or bind.
    #[arg(long)]
    mode: Option<RenderingMode>,

    /// Concurrent batches allowed against the store.
    #[arg(long)]
    requests_allowed: Option<i64>,

    /// Deliver null content plus parked resources instead of inline content.
    #[arg(long)]
    resources: bool,

    /// Simulated store latency per batch.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Write logs here instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Save the effective configuration and exit.
    #[arg(long)]
    write_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        let g = &mut config.grid;
        let overrides = [
            (&mut g.cell_width, self.cell_width),
            (&mut g.cell_height, self.cell_height),
            (&mut g.cell_count_x, self.columns),
            (&mut g.cell_count_y, self.rows),
            (&mut g.frozen_rows, self.frozen_rows),
            (&mut g.frozen_columns, self.frozen_columns),
            (&mut g.buffer_x, self.buffer_x),
            (&mut g.buffer_y, self.buffer_y),
            (&mut g.requests_allowed, self.requests_allowed),
        ];
        for (field, value) in overrides {
            if let Some(v) = value {
                *field = v;
            }
        }
        if let Some(mode) = self.mode {
            g.rendering_mode = mode;
        }
    }
}

// ───────────────────────────────────────── setup ─────────────

fn init_tracing(log_file: Option<&PathBuf>) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env());
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.with_writer(io::stderr).init(),
    }
    Ok(())
}

fn build_store(mode: RenderingMode, resources: bool, latency: Duration) -> GeneratorStore {
    let store = GeneratorStore::for_mode(mode).with_latency(latency);
    if resources {
        store.with_resources(|x, y| Some(format!("[{x}:{y}]")))
    } else {
        store
    }
}

// ───────────────────────────────────────── main ─────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref())?;

    let mut config = AppConfig::load();
    cli.apply(&mut config);
    let settings = config
        .grid
        .validate()
        .context("invalid grid configuration")?;

    if cli.write_config {
        let path = config.save()?;
        println!("wrote {}", path.display());
        return Ok(());
    }

    let store = build_store(
        settings.rendering_mode(),
        cli.resources,
        Duration::from_millis(cli.latency_ms),
    );
    let (runtime, mut store_rx) = StoreRuntime::new(Arc::new(store));

    // ── terminal setup ────────────────────────────────────────
    enable_raw_mode()?;
    let mut stderr_handle = stderr();
    execute!(stderr_handle, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stderr());
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let (width, height) = AppState::surface_size(Rect::new(0, 0, size.width, size.height));
    info!(width, height, ?settings, "starting");
    let engine = GridEngine::new(settings, MemorySurface::new(), width, height);
    let mut state = AppState::new(engine, config);
    runtime.execute(state.engine.drain_commands());

    let mut events = spawn_event_reader(Duration::from_millis(100));

    // ── event loop ────────────────────────────────────────────
    let result: Result<()> = async {
        loop {
            terminal.draw(|frame| {
                let layout = AppLayout::from_area(frame.area());
                let title = format!(
                    " {} × {} ",
                    state.engine.settings().dimensions().cell_count_x(),
                    state.engine.settings().dimensions().cell_count_y(),
                );
                let block = Block::default()
                    .title(title)
                    .title_style(Theme::title_style())
                    .borders(Borders::ALL)
                    .border_style(Theme::border_style());
                frame.render_widget(GridWidget::new(&state.engine).block(block), layout.grid_area);
                frame.render_widget(
                    FetchIndicator {
                        in_progress: state.engine.in_progress(),
                        allowed: state.engine.requests_allowed(),
                        tick: state.tick,
                    },
                    layout.grid_area,
                );

                let hint = state.config.status_bar_hint();
                frame.render_widget(
                    StatusBar {
                        engine: &state.engine,
                        message: state.status_message.as_deref(),
                        hint: &hint,
                    },
                    layout.status_area,
                );

                if state.active_view == ActiveView::Controls {
                    frame.render_widget(ControlsPopup { config: &state.config }, frame.area());
                }
            })?;

            tokio::select! {
                biased;

                Some(event) = events.recv() => {
                    handle_event(&mut state, event);
                    while let Ok(event) = events.try_recv() {
                        handle_event(&mut state, event);
                    }
                }

                Some(update) = store_rx.recv() => {
                    // Batch-drain so a burst of deliveries costs one tick and one redraw.
                    state.apply(update);
                    while let Ok(update) = store_rx.try_recv() {
                        state.apply(update);
                    }
                }

                else => break,
            }

            state.engine.tick();
            runtime.execute(state.engine.drain_commands());

            if state.should_quit {
                break;
            }
        }
        Ok(())
    }
    .await;

    // ── teardown ──────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    let stats = state.engine.stats();
    let fetch = state.engine.fetch_stats();
    info!(?stats, ?fetch, "exiting");
    result
}

fn handle_event(state: &mut AppState, event: AppEvent) {
    match event {
        AppEvent::Key(k) => handler::handle_key(state, k),
        AppEvent::Mouse(m) => handler::handle_mouse(state, m),
        AppEvent::Resize(w, h) => state.resize(Rect::new(0, 0, w, h)),
        AppEvent::Tick => {
            if state.is_fetching() {
                state.tick = state.tick.wrapping_add(1);
            }
        }
    }
}
