use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc, time::Duration};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use treenav::app::{self, App};
use treenav::async_task::{self, Task, TaskResult};
use treenav::cli::Cli;
use treenav::config::Config;
use treenav::error::Result;
use treenav::event;
use treenav::service::{FileService, HttpFileService};
use treenav::session::SessionState;
use treenav::ui;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to a file only when TREENAV_LOG names one; the terminal belongs
    // to the TUI.
    if let Ok(log_file) = std::env::var("TREENAV_LOG") {
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)?,
            )))
            .filter_level(log::LevelFilter::Debug)
            .init();

        log::info!("treenav starting up");
    }

    let cli = Cli::parse();
    let config = Config::new(&cli.server, Duration::from_secs(cli.timeout));

    let mut http = HttpFileService::new(&config.server.base_url, config.server.request_timeout)?;
    if let Some(dir) = cli.download_dir.clone() {
        http = http.with_download_dir(dir);
    }
    let service: Arc<dyn FileService> = Arc::new(http);

    run_interactive(service, config, &cli).await
}

async fn run_interactive(service: Arc<dyn FileService>, config: Config, cli: &Cli) -> Result<()> {
    let mut app = App::new(config);
    app.session_file = cli.session_file.clone().or_else(SessionState::default_path);
    if !cli.no_restore {
        app.pending_restore = app
            .session_file
            .as_deref()
            .and_then(SessionState::load);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Background worker and its channels
    let (task_sender, task_receiver) = mpsc::channel::<Task>(32);
    let (result_sender, mut result_receiver) = mpsc::channel::<TaskResult>(32);
    let shutdown = CancellationToken::new();
    let worker_handle = tokio::spawn(async_task::run_worker(
        service.clone(),
        task_receiver,
        result_sender,
        shutdown.clone(),
    ));

    // Initial listing
    app.is_loading = true;
    if let Err(e) = task_sender.send(Task::LoadTree).await {
        log::error!("failed to send initial listing task: {}", e);
        app.status_message = format!("Failed to load workspace: {}", e);
    }

    let tick_rate = Duration::from_millis(250);
    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if crossterm::event::poll(tick_rate)? {
            let raw = crossterm::event::read()?;
            // Handlers may issue the deliberately blocking file-open fetch.
            let outcome = tokio::task::block_in_place(|| {
                event::handle_event(raw, &mut app, service.as_ref(), &task_sender)
            });
            if let Err(e) = outcome {
                app.status_message = format!("Error handling event: {}", e);
            }
        }

        while let Ok(result) = result_receiver.try_recv() {
            log::debug!(
                "main: received task result: {:?}",
                std::mem::discriminant(&result)
            );
            tokio::task::block_in_place(|| {
                app::handle_task_result(&mut app, result, service.as_ref(), &task_sender)
            });
        }

        if app.should_quit {
            break;
        }
    }

    // Persist the session before tearing anything down.
    if let Some(path) = app.session_file.clone() {
        if let Err(e) = SessionState::capture(&app).save(&path) {
            log::warn!("could not save session state: {}", e);
        }
    }

    shutdown.cancel();
    worker_handle.abort();

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    Ok(())
}
