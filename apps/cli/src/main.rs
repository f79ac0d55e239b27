//! School Portal CLI - sign in and work with the admin API from a terminal.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use client_config::{init_logging, Config, Paths};
use commands::{Context, ListArgs, NotLoggedIn, ReviewAction, ThemeAction};
use output::OutputFormat;
use school_api::Resource;
use tracing::debug;

/// School Portal CLI - manage students, teachers, materials and schedules.
#[derive(Parser)]
#[command(name = "school-portal")]
#[command(about = "School Portal CLI for authentication and administration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Backend base URL, without the /api suffix
    #[arg(long, global = true, env = "SCHOOL_PORTAL_API_URL")]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Login with username and password
    Login {
        /// Username (prompted when omitted)
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Logout and clear the stored session
    Logout,

    /// Check authentication status
    Status,

    /// Show the logged-in account
    Whoami,

    /// Change the password of the logged-in account
    ChangePassword,

    /// Show dashboard statistics
    Dashboard,

    /// Manage admin users
    Users {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage students
    Students {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage teachers
    Teachers {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage learning materials
    Materials {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Manage class schedules
    Schedules {
        #[command(subcommand)]
        command: CollectionCommands,
    },

    /// Review student registrations
    Registrations {
        #[command(subcommand)]
        command: RegistrationCommands,
    },

    /// Show or change the theme preference
    Theme {
        #[arg(value_enum)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum CollectionCommands {
    /// List items
    List(ListArgs),
    /// Show one item
    Show {
        /// Item ID
        id: i64,
    },
    /// Delete an item
    Delete {
        /// Item ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum RegistrationCommands {
    /// List registrations
    List(ListArgs),
    /// Approve a pending registration
    Approve {
        /// Registration ID
        id: i64,
        /// Note stored with the decision
        #[arg(long)]
        notes: Option<String>,
    },
    /// Reject a pending registration
    Reject {
        /// Registration ID
        id: i64,
        /// Reason stored with the decision
        #[arg(long)]
        notes: Option<String>,
    },
}

async fn run(cli: Cli, ctx: &Context) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Commands::Login { username } => commands::login(ctx, username, format).await,
        Commands::Logout => commands::logout(ctx, format).await,
        Commands::Status => commands::status(ctx, format).await,
        Commands::Whoami => commands::whoami(ctx, format).await,
        Commands::ChangePassword => commands::change_password(ctx, format).await,
        Commands::Dashboard => commands::dashboard(ctx, format).await,
        Commands::Users { command } => collection(ctx, Resource::Users, command, format).await,
        Commands::Students { command } => {
            collection(ctx, Resource::Students, command, format).await
        }
        Commands::Teachers { command } => {
            collection(ctx, Resource::Teachers, command, format).await
        }
        Commands::Materials { command } => {
            collection(ctx, Resource::Materials, command, format).await
        }
        Commands::Schedules { command } => {
            collection(ctx, Resource::Schedules, command, format).await
        }
        Commands::Registrations { command } => match command {
            RegistrationCommands::List(args) => {
                commands::list_registrations(ctx, &args, format).await
            }
            RegistrationCommands::Approve { id, notes } => {
                commands::registration_review(ctx, id, ReviewAction::Approve, notes, format).await
            }
            RegistrationCommands::Reject { id, notes } => {
                commands::registration_review(ctx, id, ReviewAction::Reject, notes, format).await
            }
        },
        Commands::Theme { action } => commands::theme(ctx, action, format),
    }
}

async fn collection(
    ctx: &Context,
    resource: Resource,
    command: CollectionCommands,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        CollectionCommands::List(args) => commands::list(ctx, resource, &args, format).await,
        CollectionCommands::Show { id } => commands::show(ctx, resource, id, format).await,
        CollectionCommands::Delete { id, yes } => {
            commands::delete(ctx, resource, id, yes, format).await
        }
    }
}

fn load(cli: &Cli) -> anyhow::Result<(Paths, Config)> {
    let paths = Paths::new()?;
    paths.ensure_dirs()?;
    let mut config = Config::load(&paths)?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
        config.api_root()?;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok((paths, config))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.format;

    let (paths, config) = match load(&cli) {
        Ok(loaded) => loaded,
        Err(e) => {
            output::print_error(&e.to_string(), format);
            std::process::exit(1);
        }
    };

    init_logging("cli", &config.log_level, Some(paths.log_file()));
    debug!(api_base_url = %config.api_base_url, "CLI starting");

    let result = match Context::open(paths, &config) {
        Ok(ctx) => {
            let result = run(cli, &ctx).await;
            ctx.session.shutdown();
            result
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        if e.downcast_ref::<NotLoggedIn>().is_none() {
            output::print_error(&e.to_string(), format);
        }
        std::process::exit(1);
    }
}
