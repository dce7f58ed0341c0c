use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};

use stock_watchlist::{
    api::HttpApi,
    app::App,
    config::{Cli, Config},
    input::{dispatch, handle_input, handle_mouse, Action},
    logging,
    store::WatchlistStore,
    ui,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_cli(Cli::parse())?;
    logging::init(&config.log_file)?;
    log::info!("using API at {}", config.api_url);

    let api = HttpApi::new(&config.api_url, config.timeout)?;
    let mut app = App::new(Arc::new(api), WatchlistStore::new(config.store_path()));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("{err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    app.refresh_all();

    loop {
        // Apply finished fetches and drop expired error cards (non-blocking)
        app.tick();

        terminal.draw(|f| ui::ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_input(app, key.code),
                Event::Mouse(mouse) => handle_mouse(app, mouse.kind, mouse.column, mouse.row),
                _ => Action::None,
            };

            if dispatch(app, action) {
                log::info!("quitting");
                return Ok(());
            }
        }
    }
}
