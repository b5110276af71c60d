use anyhow::{Context, Result};
use covid_tracker::api::DiseaseShClient;
use covid_tracker::app::App;
use covid_tracker::config::Config;
use covid_tracker::controller::Controller;
use covid_tracker::{data, logging, ui};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::sync::Arc;
use std::time::Duration;

/// Event poll timeout; also bounds how long a finished fetch waits to be drawn.
const FRAME: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("reading configuration")?;
    logging::init(&config.log_path)?;
    tracing::info!(api = %config.api_url, "starting");

    let client = DiseaseShClient::from_config(&config).context("building HTTP client")?;
    let mut controller = Controller::from_config(Arc::new(client), &config);
    controller.mount();

    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, controller, &config);

    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

fn run(
    terminal: &mut DefaultTerminal,
    controller: Controller<DiseaseShClient>,
    config: &Config,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(controller, size.width, size.height);
    data::load_backdrop(&mut app.map_renderer, &config.data_dir);

    loop {
        app.tick();
        terminal.draw(|frame| ui::render(frame, &app))?;

        if event::poll(FRAME)? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key(key),
                Event::Mouse(mouse) => app.handle_mouse(mouse),
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    tracing::info!("quit");
    Ok(())
}
