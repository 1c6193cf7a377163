use anyhow::{Context, Result};
use bivariate_map::app::{App, Selection};
use bivariate_map::bivariate::{build_map, MapFrame, NoDataResult};
use bivariate_map::data::{CsvDirectory, DataAccess};
use bivariate_map::geo;
use bivariate_map::legend::{build_legend, LegendGrid};
use bivariate_map::map::ChoroplethRenderer;
use bivariate_map::ui;
use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bivariate-map",
    about = "Bivariate choropleth of European economic and social indicators"
)]
struct Args {
    /// Directory holding the indicator CSV files
    #[arg(long, default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Natural Earth admin-0 GeoJSON (default: looked up in the data directory)
    #[arg(long, global = true)]
    geometry: Option<PathBuf>,

    /// Primary variable key (gdp_growth, gdp_per_capita)
    #[arg(long, default_value = "gdp_growth", global = true)]
    primary: String,

    /// Secondary variable key
    #[arg(long, default_value = "health", global = true)]
    secondary: String,

    #[arg(long, default_value_t = 2018, global = true)]
    year: i32,

    /// How long a loaded table stays cached
    #[arg(long, default_value_t = 3600, global = true)]
    cache_ttl_secs: u64,

    /// Log file for the terminal UI
    #[arg(long, default_value = "bivariate-map.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the map and legend for one selection as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Either a built figure or the reason it could not be built
#[derive(Serialize)]
#[serde(untagged)]
enum Figure<T> {
    Ready(T),
    NoData(NoDataResult),
}

impl<T> From<Result<T, NoDataResult>> for Figure<T> {
    fn from(result: Result<T, NoDataResult>) -> Self {
        match result {
            Ok(figure) => Figure::Ready(figure),
            Err(no_data) => Figure::NoData(no_data),
        }
    }
}

#[derive(Serialize)]
struct Export {
    map: Figure<MapFrame>,
    legend: Figure<LegendGrid>,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let data = DataAccess::new(
        CsvDirectory::new(args.data_dir.clone()),
        Duration::from_secs(args.cache_ttl_secs),
    );

    match &args.command {
        Some(Command::Export { output }) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(io::stderr)
                .init();
            export(&args, &data, output.as_deref())
        }
        None => {
            let log = File::create(&args.log_file)
                .with_context(|| format!("failed to create log file {}", args.log_file.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(Mutex::new(log))
                .with_ansi(false)
                .init();
            run_tui(&args, data)
        }
    }
}

fn export(args: &Args, data: &DataAccess, output: Option<&Path>) -> Result<()> {
    info!(primary = %args.primary, secondary = %args.secondary, year = args.year, "exporting");
    let export = Export {
        map: build_map(&args.primary, &args.secondary, args.year, data).into(),
        legend: build_legend(&args.primary, &args.secondary).into(),
    };

    match output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &export)?;
            writer.flush()?;
            info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &export)?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn load_renderer(args: &Args) -> ChoroplethRenderer {
    let path = args
        .geometry
        .clone()
        .or_else(|| geo::find_geometry_file(&args.data_dir));
    let shapes = match path {
        Some(path) => geo::load_country_shapes(&path).unwrap_or_else(|e| {
            warn!("geometry unusable: {:#}", e);
            Vec::new()
        }),
        None => {
            warn!("no geometry file in {}, map panel stays empty", args.data_dir.display());
            Vec::new()
        }
    };
    ChoroplethRenderer::new(shapes)
}

fn run_tui(args: &Args, data: DataAccess) -> Result<()> {
    let selection = Selection {
        primary: args.primary.parse().context("invalid --primary")?,
        secondary: args.secondary.parse().context("invalid --secondary")?,
        year: args.year,
    };
    let renderer = load_renderer(args);

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let mut app = App::new(data, renderer, selection, size.width, size.height);
    let result = run(&mut terminal, &mut app);

    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    // Always track mouse position for cursor marker and hover
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Selectors
                    KeyCode::Char('p') | KeyCode::Char('P') => app.cycle_primary(),
                    KeyCode::Char('s') | KeyCode::Tab => app.next_secondary(),
                    KeyCode::Char('S') | KeyCode::BackTab => app.prev_secondary(),
                    KeyCode::Char(']') | KeyCode::Char('>') => app.step_year(1),
                    KeyCode::Char('[') | KeyCode::Char('<') => app.step_year(-1),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

                    KeyCode::Char('b') | KeyCode::Char('B') => app.renderer.toggle_borders(),
                    KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
