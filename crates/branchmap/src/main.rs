//! Branchmap CLI - dependency graph of a legacy .NET branch.
//!
//! `scan` builds `db.json` from the branch's build files; every other verb
//! queries the saved graph.

use std::path::PathBuf;
use std::process::ExitCode;

use branchmap::{BuildDefinition, Severity};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod cli;

/// Branchmap: static dependency graph of solutions, projects and installers.
#[derive(Parser)]
#[command(name = "branchmap")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Branch root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    branch: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a branchmap.yaml at the branch root
    Init {
        /// Build definition as NAME=SOLUTION (repeatable)
        #[arg(short = 'd', long = "build", value_name = "NAME=SOLUTION")]
        build_definitions: Vec<BuildDefinition>,

        /// Import every solution under the branch on each scan
        #[arg(long)]
        all_solutions: bool,

        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Scan the branch and write its database
    Scan {
        /// Configuration file (defaults to <branch>/branchmap.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Also import every solution under the branch, not only build
        /// definitions
        #[arg(long)]
        all_solutions: bool,
    },

    /// Show one project
    Project {
        /// Project name
        name: String,
    },

    /// List the references of a project
    References {
        /// Project name
        name: String,

        /// Follow references transitively
        #[arg(short, long)]
        recursive: bool,

        /// List projects referencing this one instead
        #[arg(short, long)]
        incoming: bool,

        /// Only projects reached from a build definition
        #[arg(long, conflicts_with = "non_required")]
        required: bool,

        /// Only projects no build definition reaches
        #[arg(long)]
        non_required: bool,

        /// Leave out test projects
        #[arg(long)]
        exclude_tests: bool,

        /// Only names containing this text (case-insensitive)
        #[arg(short, long)]
        search: Option<String>,
    },

    /// List solutions and the builds that name them
    Solutions,

    /// Show the installers shipping a project
    Installers {
        /// Project name
        name: String,

        /// Include installers shipping projects that depend on it
        #[arg(short, long)]
        recursive: bool,
    },

    /// Detect circular project references
    Cycles,

    /// List scan diagnostics
    Errors {
        /// Lowest severity to show (warning, error, critical)
        #[arg(short, long, default_value = "warning")]
        min_severity: Severity,
    },

    /// Show database statistics
    Stats,

    /// List the branches under a directory
    Branches {
        /// Directory holding one subdirectory per branch
        root: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let branch = match cli.branch {
        Some(b) => b,
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!(
                    "{}: failed to get current directory: {e}",
                    "error".red().bold()
                );
                return ExitCode::FAILURE;
            }
        },
    };

    let result = match cli.command {
        Commands::Init {
            build_definitions,
            all_solutions,
            force,
        } => cli::init::run(&branch, build_definitions, all_solutions, force).await,
        Commands::Scan {
            config,
            all_solutions,
        } => cli::scan::run(&branch, config.as_deref(), all_solutions).await,
        Commands::Project { name } => cli::project::run(&branch, &name).await,
        Commands::References {
            name,
            recursive,
            incoming,
            required,
            non_required,
            exclude_tests,
            search,
        } => {
            let filter = cli::references::Filter {
                recursive,
                incoming,
                required,
                non_required,
                exclude_tests,
                search,
            };
            cli::references::run(&branch, &name, filter).await
        }
        Commands::Solutions => cli::solutions::run(&branch).await,
        Commands::Installers { name, recursive } => {
            cli::installers::run(&branch, &name, recursive).await
        }
        Commands::Cycles => cli::cycles::run(&branch).await,
        Commands::Errors { min_severity } => cli::errors::run(&branch, min_severity).await,
        Commands::Stats => cli::stats::run(&branch).await,
        Commands::Branches { root } => cli::branches::run(&root).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            for cause in e.chain().skip(1) {
                eprintln!("  {}: {cause}", "caused by".dimmed());
            }
            ExitCode::FAILURE
        }
    }
}
