mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::Path;

use cli::{CleanArgs, Cli, Command};
use reclaim::cleaner::{Category, CleanOptions};
use reclaim::config::Config;
use reclaim::logging::{self, Verbosity};
use reclaim::report;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(Verbosity::from_flags(cli.verbose, cli.quiet))?;

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Command::Clean(args) => run_clean(&config, args).await,
        Command::List => {
            print!("{}", report::render_categories(&config.categories));
            Ok(())
        }
        Command::Config { init } => run_config(cli.config.as_deref(), &config, init),
    }
}

async fn run_clean(config: &Config, args: CleanArgs) -> Result<()> {
    let mut opts = if args.all {
        CleanOptions::all().with_dry_run(config.dry_run)
    } else if !args.category.is_empty() {
        CleanOptions::new()
            .with_categories(args.category.iter().copied())
            .with_dry_run(config.dry_run)
    } else if let Some(ref name) = args.profile {
        config.profile_options(name)?
    } else {
        config.clean_options()
    };
    if args.dry_run {
        opts.dry_run = true;
    }

    if opts.is_empty() {
        println!(
            "{} no categories selected; use --all, --category KEY or --profile NAME (see `reclaim list`)",
            "Info:".cyan().bold()
        );
        return Ok(());
    }

    let selected: Vec<Category> = opts.categories.iter().copied().collect();
    let bar = progress_bar(selected.len() as u64, args.json);
    let progress = bar.clone();
    let opts = opts.with_progress(move |label, current, total| {
        if current == 0 {
            progress.set_message(label.to_string());
        } else if current == total {
            progress.inc(1);
        }
    });
    let dry_run = opts.dry_run;

    let result = config.cleaner().perform_clean(opts).await;
    bar.finish_and_clear();

    if args.json {
        let json = report::render_json(&result, &selected, dry_run).context("Failed to encode result")?;
        println!("{json}");
    } else {
        print!("{}", report::render_text(&result, dry_run));
    }
    Ok(())
}

fn progress_bar(len: u64, json: bool) -> ProgressBar {
    if json || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    match ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} categories | {msg}") {
        Ok(style) => bar.set_style(style.progress_chars("=>-")),
        Err(e) => tracing::debug!("progress template rejected: {e}"),
    }
    bar
}

fn run_config(path: Option<&Path>, config: &Config, init: bool) -> Result<()> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::default_path()?,
    };

    if init {
        if path.exists() {
            println!("{} {} already exists", "Info:".cyan().bold(), path.display());
        } else {
            Config::default().save_to(&path)?;
            println!("Wrote default config to {}", path.display().to_string().green());
        }
        return Ok(());
    }

    println!("{} {}", "# config file:".dimmed(), path.display());
    print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
    Ok(())
}
