use anyhow::{Context, Result};
use clap::Parser;
use podium::{Config, Engine, RequestContext};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod shutdown;

use cli::{Cli, Command, ThemeCommand};

fn main() -> Result<()> {
    let args = Cli::parse();

    let directive = if args.verbose { "podium=debug" } else { "podium=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Calibration needs no data directory
    if let Command::Calibrate {
        x,
        y,
        display,
        native,
        inverse,
    } = &args.command
    {
        return commands::calibrate::run(*x, *y, *display, *native, *inverse);
    }

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    debug!("Using data directory {}", config.storage.data_dir.display());

    let mutates = args.command.mutates();
    let engine = if mutates {
        Engine::open_exclusive(&config)
    } else {
        Engine::open(&config)
    }
    .with_context(|| {
        format!(
            "Failed to open data directory {}",
            config.storage.data_dir.display()
        )
    })?;
    let ctx = RequestContext::new(args.user, args.role);

    match args.command {
        Command::Submit {
            match_id,
            team,
            kills,
            placement,
            force,
        } => commands::score::submit(&engine, &ctx, match_id, team, kills, placement, force)?,
        Command::Remove { match_id, team } => {
            commands::score::remove(&engine, &ctx, match_id, team)?
        }
        Command::Standings {
            tournament,
            match_id,
            json,
        } => commands::standings::run(&engine, tournament, match_id, json)?,
        Command::Theme { command } => match command {
            ThemeCommand::Create { file } => commands::theme::create(&engine, &ctx, &file)?,
            ThemeCommand::Update { id, file } => {
                commands::theme::update(&engine, &ctx, id, &file)?
            }
            ThemeCommand::List { tournament, json } => {
                commands::theme::list(&engine, tournament, json)?
            }
            ThemeCommand::Show { id } => commands::theme::show(&engine, id)?,
            ThemeCommand::Delete { id } => commands::theme::delete(&engine, &ctx, id)?,
        },
        Command::Export {
            tournament,
            theme,
            page,
            archive,
            output,
        } => commands::export::run(&engine, tournament, theme, page, archive, &output)?,
        Command::Watch {
            tournament,
            interval_ms,
        } => commands::watch::run(&engine, &config, tournament, interval_ms)?,
        Command::Calibrate { .. } => {}
    }

    if mutates {
        engine.save().context("Failed to save data directory")?;
    }
    Ok(())
}
