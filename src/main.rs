use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    style::Print,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dhv_session_timer::{
    app::{App, AppCommand},
    app_dirs::AppDirs,
    config::FileStore,
    logging,
    notify::DesktopNotifier,
    runtime::{AppEvent, CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    update::{self, GithubReleases, UpdateStatus, RELEASES_PAGE},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::{mpsc, Arc},
};

/// staged temperature timer for dry-herb vaporizer sessions
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Counts up through a vaporizer session and tells you when to raise the temperature. Stage times, temperatures, notifications and the chime are configured from the in-app options screen."
)]
pub struct Cli {
    /// settings file to use instead of the per-user one
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// sound file played at each stage change
    #[clap(long)]
    sound: Option<PathBuf>,

    /// skip the startup check for a newer release
    #[clap(long)]
    no_update_check: bool,

    /// write logs here instead of the per-user data directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// start the session immediately
    #[clap(short = 's', long)]
    start: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum ExitType {
    Quit,
    OpenReleases,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(e) = logging::init(&log_path) {
        eprintln!("logging disabled ({}): {e}", log_path.display());
    }

    let store = Arc::new(match &cli.config {
        Some(path) => FileStore::open(path),
        None => FileStore::open_default(),
    });
    log::info!("settings file: {}", store.path().display());

    let (events_tx, events_rx) = mpsc::channel();
    let notifier = Arc::new(DesktopNotifier::new(
        cli.sound.clone().or_else(AppDirs::sound_asset),
        events_tx.clone(),
    ));

    let mut app = App::new(store.clone(), notifier);
    if !cli.no_update_check {
        if let UpdateStatus::Available(version) = update::check(&GithubReleases::new(), &*store) {
            app = app.with_update_prompt(version);
        }
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::with_channel(events_tx, events_rx),
        FixedTicker::default(),
    );
    if cli.start && app.request_start() == AppCommand::RestartTicks {
        runner.rearm();
    }
    let result = start_tui(&mut terminal, &mut app, &runner, &mut io::stdout());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    if result? == ExitType::OpenReleases {
        if let Err(e) = webbrowser::open(RELEASES_PAGE) {
            log::warn!("could not open {RELEASES_PAGE}: {e}");
            println!("Download the latest release from {RELEASES_PAGE}");
        }
    }

    Ok(())
}

/// Runs until the app asks to exit. The bell is written to `bell_out`
/// between draws so it never splits a frame.
fn start_tui<B: Backend, E: EventSource, T: Ticker, W: Write>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
    bell_out: &mut W,
) -> Result<ExitType, Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            AppEvent::Tick => {
                app.on_tick();
            }
            AppEvent::Resize => {}
            AppEvent::Bell => execute!(bell_out, Print('\x07'))?,
            AppEvent::Key(key) => match app.on_key(key) {
                AppCommand::Continue => {}
                AppCommand::RestartTicks => runner.rearm(),
                AppCommand::OpenReleasesPage => return Ok(ExitType::OpenReleases),
                AppCommand::Quit => return Ok(ExitType::Quit),
            },
        }
    }
}
