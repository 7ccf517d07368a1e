//! Aidwatch - dashboard for a wearable assistive device
//!
//! A terminal UI application that displays recent obstacle detections,
//! ML-prediction analytics, and device/system health for a camera-and-sensor
//! wearable backed by a Raspberry Pi.

use std::io;
use std::panic;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use aidwatch::app::{App, AppState};
use aidwatch::cli::{Cli, StartupConfig};
use aidwatch::logging;
use aidwatch::refresh::{self, RefreshConfig, RefreshHandle};
use aidwatch::ui;

/// Sets up a panic hook that restores the terminal before printing the panic
/// message. This ensures the terminal is usable even if the application
/// panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Renders the UI based on the current application state
fn render_ui(frame: &mut ratatui::Frame, app: &App) {
    match &app.state {
        AppState::Loading => {
            render_loading(frame);
        }
        AppState::DetectionLog => {
            ui::render_detection_log(frame, app);
        }
        AppState::DetectionDetail(id) => {
            ui::render_detection_detail(frame, app, *id);
        }
        AppState::Analytics => {
            ui::render_analytics(frame, app);
        }
        AppState::Health => {
            ui::render_health(frame, app);
        }
    }

    if app.show_help {
        ui::render_help_overlay(frame);
    }
}

/// Renders a loading message while data is being fetched
fn render_loading(frame: &mut ratatui::Frame) {
    use ratatui::{
        layout::{Alignment, Constraint, Direction, Layout},
        style::{Color, Style},
        widgets::Paragraph,
    };

    let area = frame.area();

    // Center the loading message vertically
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Percentage(45),
        ])
        .split(area);

    let loading_text = Paragraph::new("Loading dashboard data...")
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);

    frame.render_widget(loading_text, chunks[1]);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli)?;

    // Logs go to a file; stderr belongs to the TUI from here on
    if let Err(e) = logging::init(config.log_file.as_deref()) {
        eprintln!("warning: file logging disabled: {e}");
    }

    // Set up panic hook to restore terminal on crash
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app instance
    let mut app = App::new(config.clone());

    // Initial render to show loading state
    terminal.draw(|f| render_ui(f, &app))?;

    // Trigger initial data load
    app.load_all_data(false).await;

    // Background polling shares the app's clients, and through them the
    // same response caches
    let refresh_config = RefreshConfig {
        detections_interval: config.refresh_interval,
        detection_limit: config.detection_limit,
        enabled: config.refresh_enabled,
        ..Default::default()
    };
    let mut refresh_handle = RefreshHandle::spawn(
        refresh_config,
        app.detections_client(),
        app.device_client(),
        app.predictions_client(),
    );

    // Main event loop
    loop {
        // Render UI
        terminal.draw(|f| render_ui(f, &app))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        // Apply any updates from the background refresh
        while let Some(message) = refresh::try_recv(&mut refresh_handle) {
            app.apply_refresh_message(message);
        }

        // Handle manual refresh / cache clear requests
        if app.refresh_requested {
            app.refresh_requested = false;
            app.load_all_data(true).await;
        }
        if app.clear_requested {
            app.clear_requested = false;
            app.clear_caches();
            app.load_all_data(false).await;
        }

        // Check if we should quit
        if app.should_quit {
            break;
        }
    }

    refresh_handle.shutdown().await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}
