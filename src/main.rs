mod app;
mod catalog;
mod config;
mod diagram;
mod input;
mod loader;
mod logging;
mod model;
mod playback;
mod terminal;
mod timer;
mod ui;
mod view;

use std::time::Instant;

use anyhow::Context;
use crossterm::event::{Event, KeyEventKind};
use tokio::sync::mpsc;

use crate::app::App;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::terminal::TerminalSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    logging::init(&config.log_path)?;

    let catalog = Catalog::load(&config.catalog_path)?;

    if std::env::args().nth(1).as_deref() == Some("check") {
        return check(&catalog);
    }

    let initial = match &config.initial_flow {
        Some(name) => catalog.get(name)?.name.clone(),
        None => catalog.first().name.clone(),
    };
    let app = App::new(catalog, &initial, config.interval_ms);
    run(app).await
}

fn check(catalog: &Catalog) -> anyhow::Result<()> {
    let failed = catalog
        .check(&mut std::io::stdout().lock())
        .context("failed to write check report")?;
    if failed > 0 {
        anyhow::bail!("{failed} of {} flows failed to load", catalog.len());
    }
    Ok(())
}

async fn run(mut app: App) -> anyhow::Result<()> {
    let mut terminal = TerminalSession::new().context("failed to set up terminal")?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let reader = input::spawn_reader(tx);

    while !app.should_quit {
        terminal.draw(|f| ui::draw(f, &app))?;

        let deadline = app.timer.deadline();
        let sleep = tokio::time::sleep_until(
            deadline
                .map(tokio::time::Instant::from_std)
                .unwrap_or_else(tokio::time::Instant::now),
        );

        tokio::select! {
            received = rx.recv() => match received {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    app.handle_key(key, Instant::now());
                }
                // Resize and friends only need the redraw at the top of the loop.
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err).context("failed to read terminal input"),
                None => break,
            },
            _ = sleep, if deadline.is_some() => app.on_tick(Instant::now()),
        }
    }

    drop(rx);
    let _ = reader.await;
    tracing::info!("callflow exiting");
    Ok(())
}
