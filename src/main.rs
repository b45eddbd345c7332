use clap::{CommandFactory, Parser};
use eimg::cli::commands;
use eimg::cli::{output, Cli, Commands, Context};

fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command.as_ref() else {
        // No subcommand: show help and exit cleanly.
        let _ = Cli::command().print_help();
        return;
    };

    let mut ctx = match Context::load() {
        Ok(ctx) => ctx,
        Err(e) => {
            output::error(&e.to_string());
            std::process::exit(1);
        }
    };

    // Logging and the cache layout are conveniences; never block a command on them.
    if let Err(e) = eimg::logging::init(&ctx.logs_dir(), ctx.settings.log_max_bytes) {
        output::warning(&format!("Logging disabled: {e}"));
    }
    if let Err(e) = ctx.cache() {
        output::warning(&format!("Cache unavailable: {e}"));
    }

    let result = match command {
        Commands::Set {
            assignment,
            insecure_plaintext,
        } => commands::set::execute(&mut ctx, assignment, *insecure_plaintext),
        Commands::Validate => commands::validate::execute(&mut ctx),
        Commands::Download => commands::download::execute_latest(&mut ctx, &cli),
        Commands::DownloadDate { date } => commands::download::execute_date(&mut ctx, &cli, date),
        Commands::Dates => commands::dates::execute(&mut ctx),
        Commands::Metadata { date } => commands::metadata::execute(&mut ctx, date.as_deref()),
        Commands::Config => commands::config_cmd::execute(&ctx),
        Commands::Wipe { yes } => commands::wipe::execute(&mut ctx, *yes),
        Commands::CacheInfo => commands::cache::execute_info(&ctx),
        Commands::CacheClear { kind } => commands::cache::execute_clear(&ctx, kind),
        Commands::LogsInfo => commands::logs::execute_info(&ctx),
        Commands::LogsClear { yes } => commands::logs::execute_clear(&ctx, *yes),
        Commands::OpenCache => commands::open::execute("cache", &ctx.cache_dir()),
        Commands::OpenLogs => commands::open::execute("logs", &ctx.logs_dir()),
        Commands::OpenConfig => commands::open::execute("config", &ctx.home),
        Commands::Test => commands::diagnostics::execute(&ctx),
        Commands::Version => commands::version::execute(),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        output::error(&e.to_string());
        std::process::exit(1);
    }
}
