use std::io;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use todo_service::Credentials;
use todo_store::FileStore;
use tokio::runtime::Runtime;
use tracing::info;

use todo_tui::account;
use todo_tui::app::{App, Outcome};
use todo_tui::config::{Command, Config, CredentialArgs};
use todo_tui::launch::{launch, ApiSettings, Launch};
use todo_tui::logging::{self, LogTarget};

const TICK: Duration = Duration::from_millis(100);

fn main() -> Result<ExitCode> {
    let config = Config::parse();
    let runtime = Runtime::new().context("failed to start async runtime")?;
    let store = FileStore::new(config.session_path());

    match config.command {
        Some(ref command) => {
            let _guard = logging::init(&config.log_level, LogTarget::Stderr)?;
            runtime.block_on(run_command(&config, command, &store))?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let _guard = logging::init(&config.log_level, LogTarget::File(config.log_path()))?;
            info!(server = %config.server_url, "todo starting");

            let settings = ApiSettings {
                server_url: config.server_url.clone(),
                api_prefix: config.api_prefix.clone(),
            };
            match launch(&store, &settings, runtime.handle().clone())? {
                Launch::SignInRequired => {
                    eprintln!("Not signed in. Run `todo signin --email <EMAIL>`");
                    Ok(ExitCode::from(2))
                }
                Launch::Ready(app) => {
                    let outcome = run_tui(*app)?;
                    if outcome == Outcome::SignOut {
                        runtime.block_on(account::sign_out(&store, &config.server_url))?;
                        println!("Signed out.");
                    }
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}

async fn run_command(config: &Config, command: &Command, store: &FileStore) -> Result<()> {
    match command {
        Command::Signin(args) => {
            let profile = account::sign_in(store, &config.server_url, &credentials(args)?).await?;
            println!("Signed in as {}", profile.email);
        }
        Command::Signup(args) => {
            let profile = account::sign_up(store, &config.server_url, &credentials(args)?).await?;
            println!("Account created. Signed in as {}", profile.email);
        }
        Command::Signout => {
            account::sign_out(store, &config.server_url).await?;
            println!("Signed out.");
        }
        Command::Whoami => match account::whoami(store)? {
            Some(session) => match session.profile {
                Some(profile) => println!("{}", profile.email),
                None => println!("Signed in (no cached profile)"),
            },
            None => println!("Not signed in."),
        },
    }
    Ok(())
}

fn credentials(args: &CredentialArgs) -> Result<Credentials> {
    let password = match args.password {
        Some(ref p) => p.clone(),
        None => account::read_password(&mut io::stdin().lock(), &mut io::stderr())?,
    };
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(Credentials {
        email: args.email.clone(),
        password,
    })
}

fn run_tui(app: App) -> Result<Outcome> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        eprintln!("Error: {e}");
    }

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
) -> Result<Outcome> {
    loop {
        app.pump();
        terminal.draw(|frame| app.render(frame))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if let Some(outcome) = app.outcome() {
            app.shutdown();
            return Ok(outcome);
        }
    }
}
