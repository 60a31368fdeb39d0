mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    activity::ActivitySubcommand, config::ConfigSubcommand, drill::DrillSubcommand,
    init::InitOptions, plan::PlanSubcommand, play::PlaySubcommand, roster::RosterSubcommand,
    scout::ScoutSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "courtflow",
    about = "Coaching staff records: roster, drills, playbook, scouting, and practice plans",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .courtflow/)
    #[arg(long, global = true, env = "COURTFLOW_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize courtflow in the current directory and create the organization
    Init {
        /// Organization name (default "My Team")
        #[arg(long)]
        org_name: Option<String>,
        /// Use a remote PostgREST backend at this URL instead of the local store
        #[arg(long)]
        remote_url: Option<String>,
        /// Email recorded on the coach profile
        #[arg(long)]
        email: Option<String>,
    },

    /// Show the signed-in coach and organization
    Whoami {
        /// Rename the organization
        #[arg(long)]
        rename: Option<String>,
    },

    /// Manage the player roster
    Roster {
        #[command(subcommand)]
        subcommand: RosterSubcommand,
    },

    /// Manage the drill library
    Drill {
        #[command(subcommand)]
        subcommand: DrillSubcommand,
    },

    /// Manage the playbook
    Play {
        #[command(subcommand)]
        subcommand: PlaySubcommand,
    },

    /// Manage scouting reports
    Scout {
        #[command(subcommand)]
        subcommand: ScoutSubcommand,
    },

    /// Manage practice plans
    Plan {
        #[command(subcommand)]
        subcommand: PlanSubcommand,
    },

    /// Edit the activities of a practice plan
    Activity {
        #[command(subcommand)]
        subcommand: ActivitySubcommand,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init {
            org_name,
            remote_url,
            email,
        } => cmd::init::run(
            &root,
            InitOptions {
                org_name: org_name.as_deref(),
                remote_url: remote_url.as_deref(),
                email: email.as_deref(),
            },
        ),
        Commands::Whoami { rename } => cmd::whoami::run(&root, rename.as_deref(), cli.json),
        Commands::Roster { subcommand } => cmd::roster::run(&root, subcommand, cli.json),
        Commands::Drill { subcommand } => cmd::drill::run(&root, subcommand, cli.json),
        Commands::Play { subcommand } => cmd::play::run(&root, subcommand, cli.json),
        Commands::Scout { subcommand } => cmd::scout::run(&root, subcommand, cli.json),
        Commands::Plan { subcommand } => cmd::plan::run(&root, subcommand, cli.json),
        Commands::Activity { subcommand } => cmd::activity::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
