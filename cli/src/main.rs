#![warn(clippy::pedantic)]

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use library_client::{
    config::default_token_path, ApiClient, ApiError, BookList, BookStatus, BookUpdate,
    ClientConfig, FileTokenStore, LibraryApp, MemberList, MemberUpdate, NewBook, NewMember,
    ReqwestTransport, Role, Session, DEFAULT_BASE_URL,
};

use crate::terminal::{print_history, TerminalPresenter, TerminalRenderer};

mod terminal;

#[derive(Parser)]
#[command(about = "Manage books and members of a library server")]
struct Cli {
    /// Base URL of the library API
    #[arg(long, short, env = "LIBRARY_API_URL", default_value = DEFAULT_BASE_URL)]
    server: String,

    /// File the bearer token is kept in between runs
    #[arg(long, env = "LIBRARY_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and show the dashboard
    Login(Credentials),
    /// Create an account
    Signup {
        #[command(flatten)]
        credentials: Credentials,
        /// LIBRARIAN or MEMBER
        #[arg(long, default_value = "MEMBER")]
        role: Role,
    },
    /// Forget the stored token
    Logout,
    /// Show whether a token is stored
    Status,
    /// Show the dashboard (both lists)
    Dashboard,
    #[command(subcommand)]
    Books(BookCommand),
    #[command(subcommand)]
    Members(MemberCommand),
}

#[derive(Args)]
struct Credentials {
    #[arg(long, short)]
    username: String,

    /// Omit to be prompted; passing it on the command line is less secure.
    #[arg(long, short)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum BookCommand {
    /// List every book
    List,
    /// List books nobody has borrowed
    Available,
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
    },
    Edit {
        id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author: String,
        /// AVAILABLE or BORROWED
        #[arg(long)]
        status: Option<BookStatus>,
    },
    Delete {
        id: i64,
    },
    Borrow {
        id: i64,
    },
    Return {
        id: i64,
    },
}

#[derive(Subcommand)]
enum MemberCommand {
    /// List active members
    List,
    /// List deactivated members
    Deleted,
    Add(Credentials),
    Edit {
        id: i64,
        #[command(flatten)]
        credentials: Credentials,
        #[arg(long)]
        role: Option<Role>,
    },
    Delete {
        id: i64,
    },
    /// Borrow history of every member
    History,
    /// Your own borrow history
    MyHistory,
    /// Deactivate your own account
    DeleteMe,
}

fn password(credentials: &Credentials) -> anyhow::Result<String> {
    if credentials.password.is_some() {
        tracing::warn!(
            "The password has been provided on the command line. Note that this is less secure than providing it when requested."
        );
    }
    credentials
        .password
        .clone()
        .or_else(|| {
            tracing::debug!("Prompting for password...");
            rpassword::prompt_password("Password: ").ok()
        })
        .context("Failed to get password")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.verbose)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::default()
        .with_base_url(cli.server)
        .with_token_path(cli.token_file.unwrap_or_else(default_token_path));
    tracing::debug!(?config, "configuration");

    let client = ApiClient::new(&config.base_url, FileTokenStore::new(&config.token_path));
    let session = Session::new(client, ReqwestTransport::new(), TerminalPresenter);
    let mut app = LibraryApp::new(
        session,
        BookList::new(TerminalRenderer),
        MemberList::new(TerminalRenderer),
    );

    let outcome = run(&mut app, cli.command).await?;
    Ok(match outcome {
        Ok(()) => ExitCode::SUCCESS,
        // Already shown to the user by the session.
        Err(e) => {
            tracing::debug!("command failed: {e}");
            ExitCode::FAILURE
        }
    })
}

/// Run one command. The outer error is a local failure (no password); the
/// inner one an API failure that has already been alerted.
async fn run(
    app: &mut LibraryApp<ReqwestTransport>,
    command: Command,
) -> anyhow::Result<Result<(), ApiError>> {
    let outcome = match command {
        Command::Login(credentials) => {
            let password = password(&credentials)?;
            app.login(&credentials.username, &password).await
        }
        Command::Signup { credentials, role } => {
            let password = password(&credentials)?;
            app.signup(&credentials.username, &password, role).await
        }
        Command::Logout => {
            app.logout();
            Ok(())
        }
        Command::Status => {
            if app.session.is_authenticated() {
                println!("A token is stored for {}", app.session.client().base_url());
            } else {
                println!("Not logged in");
            }
            Ok(())
        }
        Command::Dashboard => {
            app.load().await;
            Ok(())
        }
        Command::Books(command) => match command {
            BookCommand::List => app.books.fetch_all(&mut app.session).await.map(drop),
            BookCommand::Available => app.books.fetch_available(&mut app.session).await.map(drop),
            BookCommand::Add { title, author } => app
                .books
                .add(&mut app.session, &NewBook { title, author })
                .await
                .map(drop),
            BookCommand::Edit {
                id,
                title,
                author,
                status,
            } => app
                .books
                .edit(&mut app.session, id, &BookUpdate { title, author, status })
                .await
                .map(drop),
            BookCommand::Delete { id } => app.books.delete(&mut app.session, id).await,
            BookCommand::Borrow { id } => app.books.borrow(&mut app.session, id).await.map(drop),
            BookCommand::Return { id } => app
                .books
                .return_book(&mut app.session, id)
                .await
                .map(drop),
        },
        Command::Members(command) => match command {
            MemberCommand::List => app.members.fetch_all(&mut app.session).await.map(drop),
            MemberCommand::Deleted => app.members.fetch_deleted(&mut app.session).await.map(drop),
            MemberCommand::Add(credentials) => {
                let password = password(&credentials)?;
                let input = NewMember {
                    username: credentials.username,
                    password,
                    role: Role::Member,
                };
                app.members.add(&mut app.session, &input).await.map(drop)
            }
            MemberCommand::Edit {
                id,
                credentials,
                role,
            } => {
                let password = password(&credentials)?;
                let input = MemberUpdate {
                    username: credentials.username,
                    password,
                    role,
                };
                app.members.edit(&mut app.session, id, &input).await.map(drop)
            }
            MemberCommand::Delete { id } => app.members.delete(&mut app.session, id).await,
            MemberCommand::History => app
                .members
                .history(&mut app.session)
                .await
                .map(|h| print_history(&h)),
            MemberCommand::MyHistory => app
                .members
                .my_history(&mut app.session)
                .await
                .map(|h| print_history(&h)),
            MemberCommand::DeleteMe => app
                .members
                .delete_own_account(&mut app.session)
                .await
                .map(drop),
        },
    };
    Ok(outcome)
}
