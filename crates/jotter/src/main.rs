use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
        EnableMouseCapture, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use directories::ProjectDirs;
use jotter::{ui, App};
use log::LevelFilter;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    fs::OpenOptions,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

static KEYBOARD_ENHANCED: AtomicBool = AtomicBool::new(false);

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    // Restore the terminal before the default hook prints the panic.
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_listener(Arc::clone(&shutdown));

    let mut app = match App::new().await {
        Ok(app) => {
            log::info!("Application initialized successfully");
            app
        }
        Err(e) => {
            eprintln!("Failed to start jotter: {:#}", e);
            return Err(e);
        }
    };

    if let Err(e) = enable_raw_mode() {
        eprintln!("Failed to initialize the terminal: {}", e);
        return Err(e.into());
    }
    let mut stdout = io::stdout();
    if let Err(e) = execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    ) {
        let _ = disable_raw_mode();
        eprintln!("Failed to configure the terminal: {}", e);
        return Err(e.into());
    }
    if matches!(supports_keyboard_enhancement(), Ok(true)) {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
        KEYBOARD_ENHANCED.store(true, Ordering::SeqCst);
        log::debug!("Keyboard enhancement enabled");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &shutdown).await;

    app.persist_on_exit();
    restore_terminal()?;

    if let Err(err) = res {
        log::error!("Application error: {}", err);
        eprintln!("jotter stopped with an error: {:#}", err);
    }

    Ok(())
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    shutdown: &AtomicBool,
) -> Result<()> {
    loop {
        if let Err(e) = terminal.draw(|f| ui::draw(f, app)) {
            log::error!("Terminal draw error: {}", e);
        }

        app.update_status();

        if app.should_quit() {
            log::info!("Application shutdown requested");
            break;
        }
        if shutdown.load(Ordering::SeqCst) {
            log::info!("Shutting down on signal");
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            let event = event::read()?;
            if let Err(e) = app.handle_event(event).await {
                log::error!("Event handling error: {}", e);
                app.ui_state.status.error(e.to_string());
            }
        }
    }

    Ok(())
}

/// Logs go to `jotter.log` in the data directory; the terminal belongs to
/// the editor while it runs.
fn init_logger() {
    let mut logger = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        logger.filter_level(LevelFilter::Info);
        logger.filter_module("jotter", LevelFilter::Debug);
    }

    let log_file = ProjectDirs::from("com", "jotter", "jotter").and_then(|dirs| {
        let dir = dirs.data_dir();
        std::fs::create_dir_all(dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("jotter.log"))
            .ok()
    });
    match log_file {
        Some(file) => {
            logger.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            logger.target(env_logger::Target::Stderr);
        }
    }
    logger.init();
}

fn spawn_signal_listener(shutdown: Arc<AtomicBool>) {
    tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(()) => {
                log::info!("Termination signal received");
                shutdown.store(true, Ordering::SeqCst);
            }
            Err(e) => log::warn!("Signal listener unavailable: {}", e),
        }
    });
}

#[cfg(unix)]
async fn wait_for_termination() -> io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    tokio::select! {
        _ = terminate.recv() => {}
        _ = hangup.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_termination() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}

fn restore_terminal() -> Result<()> {
    let mut stdout = io::stdout();
    if KEYBOARD_ENHANCED.swap(false, Ordering::SeqCst) {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(
        stdout,
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    let _ = execute!(stdout, crossterm::cursor::Show);
    Ok(())
}
