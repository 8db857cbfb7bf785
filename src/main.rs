use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::KeyEventKind;
use tracing::info;

use jill::app::App;
use jill::config::{self, Config, load_config, load_config_from_path};
use jill::event::{Event, EventHandler};
use jill::logging::init_logging;
use jill::ui;

#[derive(Parser)]
#[command(
    name = "jill",
    about = "Live terminal dashboard for Linux: system status and a filterable process tree"
)]
struct Cli {
    /// Path to config file (TOML, or the legacy conf.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Refresh rate in milliseconds
    #[arg(long)]
    refresh_rate: Option<u64>,

    /// Box and tree characters: utf8, ascii
    #[arg(long)]
    char_mode: Option<String>,

    /// Where to write the log
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    let log_path = init_logging(&config.logging)?;
    info!(
        log = %log_path.display(),
        refresh_rate_ms = config.general.refresh_rate_ms,
        char_mode = config.general.char_mode().label(),
        "starting"
    );

    let app = App::new(&config)?;

    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run(&mut terminal, app, &config).await;

    ratatui::restore();
    info!("exiting");

    result
}

async fn run(terminal: &mut ratatui::DefaultTerminal, mut app: App, config: &Config) -> Result<()> {
    let tick_rate = Duration::from_millis(config.general.refresh_rate_ms.max(1));
    let mut events = EventHandler::new(tick_rate);

    let size = terminal.size()?;
    app.on_resize(size.width, size.height);
    terminal.draw(|frame| ui::draw(frame, &app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        match event {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = app.map_key(key);
                app.dispatch(action);
                if !app.running {
                    break;
                }
            }
            Event::Tick => app.refresh_data(),
            Event::Resize(width, height) => app.on_resize(width, height),
        }
        terminal.draw(|frame| ui::draw(frame, &app))?;
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(rate) = cli.refresh_rate {
        config.general.refresh_rate_ms = rate;
    }
    if let Some(ref mode) = cli.char_mode {
        config.general.char_mode = mode.clone();
    }
    if let Some(ref path) = cli.log_file {
        config.logging.file = Some(path.clone());
    }

    config
}
