use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod accounts;
mod app;
mod backend;
mod dates;
mod directory;
mod grouping;
mod models;
mod schedule;
mod server;
mod session;
mod share;
mod shift_time;
mod storage;
mod ui;

use accounts::AccountRequestForm;
use app::App;
use backend::{MemoryStore, RowStore, SupabaseStore};
use server::SeedContext;
use storage::{Config, LocalStore};

#[derive(Debug, clap::Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Interactive schedule and directory (default).
    Tui,
    /// Serve the admin seeding endpoint.
    Serve {
        #[clap(long, default_value_t = 3000)]
        port: u16,
    },
    /// Create the admin account if it does not exist yet.
    SeedAdmin,
    /// Print the duration of a shift given as two HH:MM times.
    Hours { start: String, end: String },
    /// Submit an account request. The password is read from stdin.
    RequestAccount {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long)]
        department: String,
        #[clap(long)]
        phone: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Tui);
    init_tracing(matches!(command, Command::Tui));

    let config = Config::load();
    match command {
        Command::Tui => run_tui(&config),
        Command::Serve { port } => {
            let context = Arc::new(SeedContext {
                store: Arc::from(open_rows(&config)?),
                admin_password: config.admin_password.clone(),
            });
            let addr = SocketAddr::from(([0, 0, 0, 0], port));
            tokio::runtime::Runtime::new()?.block_on(server::serve(addr, context))?;
            Ok(())
        }
        Command::SeedAdmin => {
            let rows = open_rows(&config)?;
            let outcome =
                accounts::seed_admin(rows.as_ref(), config.admin_password.as_deref(), dates::today())?;
            println!("{}", outcome.message());
            Ok(())
        }
        Command::Hours { start, end } => {
            let hours = shift_time::shift_hours(&start, &end)?;
            println!("{start} - {end}: {hours:.2}h");
            Ok(())
        }
        Command::RequestAccount {
            name,
            email,
            department,
            phone,
        } => {
            let mut password = String::new();
            io::stdin().lock().read_line(&mut password)?;
            let form = AccountRequestForm {
                name,
                email,
                password: password.trim_end_matches(['\r', '\n']).to_string(),
                department,
                phone,
            };
            let rows = open_rows(&config)?;
            let request = accounts::create_registration_request(rows.as_ref(), &form, dates::today())?;
            println!(
                "Request submitted for {}. An administrator will review it.",
                request.email
            );
            Ok(())
        }
    }
}

fn run_tui(config: &Config) -> Result<(), Box<dyn Error>> {
    let rows: Box<dyn RowStore> = open_rows(config)?;
    if config.backend.is_none() {
        match accounts::seed_admin(rows.as_ref(), config.admin_password.as_deref(), dates::today()) {
            Ok(outcome) => info!("{}", outcome.message()),
            Err(err) => warn!("offline admin not seeded: {err}"),
        }
    }
    let mut app = App::new(LocalStore::open_default(), rows, config, dates::today());

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    loop {
        terminal.draw(|frame| ui::draw(frame, &mut app))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(120))? {
            let event = event::read()?;
            if let Event::Key(key) = event {
                app.handle_key_event(key);
            }
        }
    }

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

/// Must run before any tokio runtime exists; the blocking client owns one internally.
fn open_rows(config: &Config) -> Result<Box<dyn RowStore + Send + Sync>, backend::BackendError> {
    match &config.backend {
        Some(backend) => {
            info!(url = %backend.url, "using remote row store");
            Ok(Box::new(SupabaseStore::new(backend)?))
        }
        None => {
            warn!("no backend configured, accounts live in memory for this run");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

fn init_tracing(to_file: bool) {
    let filter = EnvFilter::try_from_env("SHIFTBOARD_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if to_file {
        let file = storage::log_path().and_then(|path| {
            OpenOptions::new().create(true).append(true).open(path).ok()
        });
        match file {
            Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
            None => builder.with_writer(io::sink).try_init(),
        }
    } else {
        builder.with_writer(io::stderr).try_init()
    };

    if let Err(err) = result {
        eprintln!("failed to set up logging: {err}");
    }
}
