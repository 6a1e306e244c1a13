mod app;
mod calculator;
mod clipboard;
mod config;
mod theme;
mod ui;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use calculator::{Calculator, Field, QueryParams, ResultStatus};
use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "rubecalc")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "A terminal cubic-metre (루베) calculator")]
struct Args {
    /// Pre-fill from a query string or link, e.g. "length=10&width=5&thickness=20"
    #[arg(long)]
    query: Option<String>,

    /// Length in metres
    #[arg(long, allow_hyphen_values = true)]
    length: Option<String>,

    /// Width in metres
    #[arg(long, allow_hyphen_values = true)]
    width: Option<String>,

    /// Thickness (centimetres, or metres with --unit m)
    #[arg(long, allow_hyphen_values = true)]
    thickness: Option<String>,

    /// Unit of --thickness ("m" converts to centimetres)
    #[arg(long)]
    unit: Option<String>,

    /// Print the calculation as JSON and exit
    #[arg(short, long)]
    print: bool,

    /// Config file (default: ~/.config/rubecalc/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl Args {
    /// Startup parameters; individual flags override --query
    fn query_params(&self) -> QueryParams {
        let base = self
            .query
            .as_deref()
            .map(QueryParams::parse)
            .unwrap_or_default();

        base.merge(QueryParams {
            length: self.length.clone(),
            width: self.width.clone(),
            thickness: self.thickness.clone(),
            unit: self.unit.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so it stays out of --print output)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let params = args.query_params();

    if args.print {
        return print_result(&params);
    }

    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_default(),
    };

    run_tui(config, &params).await
}

fn print_result(params: &QueryParams) -> Result<()> {
    let mut calc = Calculator::new();
    calc.hydrate(params);

    let value = |field| calc.field(field).value.as_valid();
    let status = match calc.status() {
        ResultStatus::Idle => "idle",
        ResultStatus::NeedsInput => "needs_input",
        ResultStatus::Volume(_) => "ok",
    };

    let output = serde_json::json!({
        "length": value(Field::Length),
        "width": value(Field::Width),
        "thickness_cm": value(Field::Thickness),
        "volume": calc.result(),
        "text": calc.copy_text(),
        "status": status,
        "message": calc.status_text(),
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn run_tui(config: AppConfig, params: &QueryParams) -> Result<()> {
    // The widget needs a terminal to mount on
    if !io::stdout().is_terminal() {
        tracing::error!("rubecalc: stdout is not a terminal, nothing to draw on (try --print)");
        return Ok(());
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    app.hydrate(params);

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc if app.popup == Popup::None => {
                            return Ok(())
                        }
                        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            if let Err(e) = app.handle_key(key) {
                                tracing::error!("Key handling failed: {}", e);
                            }
                        }
                    }
                }
            }
        }

        // Let finished copies land and expire old feedback
        app.tick();
        tokio::task::yield_now().await;
    }
}
