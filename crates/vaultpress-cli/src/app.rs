//! The vaultpress application: logging setup and command dispatch.

use tracing_subscriber::EnvFilter;
use vaultpress_core::Result;
use vaultpress_core::traits::ConfigManager;

use crate::cli::{CliArgs, Command, ContentAction, NewsletterAction};
use crate::config::VaultpressConfig;
use crate::{commands, config_handlers};

/// Initialise tracing-based logging.
///
/// Uses `RUST_LOG` if set, otherwise a level chosen from the verbosity
/// flags. Library crates log through `log`; the subscriber picks those
/// records up as well.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // A subscriber may already be set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI with the given arguments.
pub async fn run(args: CliArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);
    let config_path = args.config.as_deref();

    let Some(command) = args.command else {
        println!(
            "vaultpress {}: use --help for usage",
            env!("CARGO_PKG_VERSION")
        );
        return Ok(());
    };

    tracing::debug!(?command, "dispatching");
    let load = || VaultpressConfig::load(config_path);

    match command {
        Command::Version => {
            println!("vaultpress {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Config(cmd) => config_handlers::handle_config_command(config_path, cmd.command),
        Command::Parse { table, json } => commands::cmd_parse(&load()?, table.as_deref(), json).await,
        Command::Sync {
            table,
            dry_run,
            generate,
        } => commands::cmd_sync(&load()?, table.as_deref(), dry_run, generate).await,
        Command::Newsletter(cmd) => match cmd.command {
            NewsletterAction::Save { draft, out } => {
                commands::cmd_newsletter_save(&load()?, &draft, out.as_deref())
                    .await
                    .map(|_| ())
            }
            NewsletterAction::Items { file, json } => commands::cmd_newsletter_items(&file, json).await,
        },
        Command::Content(cmd) => {
            let ContentAction::List { kind, query, json } = cmd.command;
            commands::cmd_content_list(&load()?, kind.as_deref(), query.as_deref(), json).await
        }
        Command::Publish => commands::cmd_publish(&load()?).await,
    }
}

// ============================================================================
// Tests
// ============================================================================
