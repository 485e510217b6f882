//! Printdown - Markdown viewer and PDF exporter
//!
//! Entry point for the headless host. Handles CLI argument parsing,
//! logging initialization, and application bootstrap.

use anyhow::{bail, Context};
use printdown::app::{Collaborators, OutputTargets, Printdown};
use printdown::config::Config;
use printdown::dialogs::CliDialogs;
use printdown::export::HeadlessBrowserPrinter;
use printdown::menu::Action;
use printdown::message::{FileMessage, Message, SystemMessage, ViewMessage};
use printdown::presentation::{FontScale, ImageScale, Orientation, PageSize, Theme};
use printdown::render::Engines;
use printdown::state::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;

/// Application name for logging
const APP_NAME: &str = "printdown";

/// Command line flags
#[derive(Debug, Default)]
struct Flags {
    files: Vec<PathBuf>,
    theme: Option<Theme>,
    font_scale: Option<f32>,
    image_scale: Option<f32>,
    page_size: Option<PageSize>,
    landscape: bool,
    no_paginate: bool,
    html: Option<PathBuf>,
    pdf: Option<PathBuf>,
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let flags = parse_args()?;
    log::info!("Starting {} {}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("{}; using default configuration", e);
        Config::default()
    });
    if !flags.watch {
        config.files.watch_files = false;
    }

    let session = SessionStore::default_location()
        .map_err(|e| log::warn!("{}; session will not be saved", e))
        .ok();
    let collaborators = Collaborators {
        engines: Engines::from_config(&config.engines),
        printer: Arc::new(HeadlessBrowserPrinter::from_config(&config.export)),
        dialogs: Arc::new(CliDialogs::new(flags.pdf.clone())),
        session,
    };
    let mut app = Printdown::new(config, collaborators);

    if flags.files.is_empty() {
        app.restore_session().await;
    } else {
        app.update(Message::File(FileMessage::OpenPaths(flags.files.clone())))
            .await;
    }
    apply_overrides(&mut app, &flags).await;

    let Some(rendered) = app.render_active().await else {
        if flags.html.is_some() || flags.pdf.is_some() {
            bail!("no document could be opened");
        }
        println!("No document open. Use --help for usage information.");
        return Ok(());
    };
    if let Some(pages) = rendered.page_count {
        log::info!("Rendered {} page(s)", pages);
    }

    let writes_files = flags.html.is_some() || flags.pdf.is_some();
    if !writes_files && !flags.watch {
        print!("{}", rendered.view.to_output_html());
    }

    app.set_outputs(OutputTargets {
        html: flags.html.clone(),
        pdf: flags.pdf.is_some(),
    });
    app.write_outputs().await.context("failed to write output")?;

    if flags.watch {
        spawn_command_reader(&app);
        spawn_interrupt_handler(&app);
        log::info!("Watching for changes; type an action name or press Ctrl+C to quit");
        app.run().await?;
    } else {
        app.update(Message::System(SystemMessage::Quit)).await;
    }

    Ok(())
}

/// Apply presentation options given on the command line
async fn apply_overrides(app: &mut Printdown, flags: &Flags) {
    if let Some(theme) = flags.theme {
        app.update(Message::View(ViewMessage::SetTheme(theme))).await;
    }
    if let Some(factor) = flags.font_scale {
        app.state.presentation.font_scale = FontScale::new(factor);
    }
    if let Some(factor) = flags.image_scale {
        app.state.presentation.image_scale = ImageScale::new(factor);
    }
    if flags.page_size.is_some() || flags.landscape {
        let mut page = app.state.presentation.page.clone();
        if let Some(size) = flags.page_size {
            page.size = size;
        }
        if flags.landscape {
            page.orientation = Orientation::Landscape;
        }
        app.update(Message::View(ViewMessage::SetPageSettings(page))).await;
    }
    if flags.no_paginate {
        app.state.pagination_enabled = false;
    }
}

/// Read action names from stdin, one per line
fn spawn_command_reader(app: &Printdown) {
    let tx = app.sender();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Action>() {
                Ok(action) => {
                    if tx.send(action.to_message()).is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("{}", e),
            }
        }
    });
}

fn spawn_interrupt_handler(app: &Printdown) {
    let tx = app.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Message::System(SystemMessage::Quit));
        }
    });
}

/// Initialize the logging system
fn init_logging() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info,printdown=debug"),
    )
    .format_timestamp_millis()
    .init();
}

/// Parse command line arguments
fn parse_args() -> anyhow::Result<Flags> {
    let mut args = std::env::args().skip(1);
    let mut flags = Flags::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--theme" => {
                let value = value_for(&mut args, "--theme")?;
                flags.theme = Some(value.parse().map_err(anyhow::Error::msg)?);
            }
            "--font-scale" => {
                let value = value_for(&mut args, "--font-scale")?;
                flags.font_scale = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid font scale '{}'", value))?,
                );
            }
            "--image-scale" => {
                let value = value_for(&mut args, "--image-scale")?;
                flags.image_scale = Some(
                    value
                        .parse()
                        .with_context(|| format!("invalid image scale '{}'", value))?,
                );
            }
            "--page-size" => {
                let value = value_for(&mut args, "--page-size")?;
                flags.page_size = Some(value.parse().map_err(anyhow::Error::msg)?);
            }
            "--landscape" => flags.landscape = true,
            "--no-paginate" => flags.no_paginate = true,
            "--html" => flags.html = Some(PathBuf::from(value_for(&mut args, "--html")?)),
            "--pdf" => flags.pdf = Some(PathBuf::from(value_for(&mut args, "--pdf")?)),
            "--watch" => flags.watch = true,
            arg if arg.starts_with('-') => {
                bail!("unknown option: {} (use --help for usage information)", arg);
            }
            _ => flags.files.push(PathBuf::from(arg)),
        }
    }

    Ok(flags)
}

fn value_for(args: &mut impl Iterator<Item = String>, option: &str) -> anyhow::Result<String> {
    args.next()
        .with_context(|| format!("{} requires a value", option))
}

/// Print help message
fn print_help() {
    let themes: Vec<&str> = Theme::ALL.iter().map(|t| t.name()).collect();
    println!(
        r#"Printdown - Markdown viewer and PDF exporter

USAGE:
    {APP_NAME} [OPTIONS] [FILES...]

With no files, the documents of the previous session are reopened.

OPTIONS:
    --theme NAME        Presentation theme
    --font-scale X      Font scale factor (0.5 to 2.0)
    --image-scale X     Maximum image width factor (0.3 to 2.0)
    --page-size SIZE    letter, a4 or legal
    --landscape         Landscape orientation
    --no-paginate       Continuous view instead of page preview
    --html OUT          Write the rendered view as standalone HTML
    --pdf OUT           Export the rendered view to PDF
    --watch             Keep running, re-render on external changes and
                        read action names from stdin
    -h, --help          Show this help message
    -v, --version       Show version information

THEMES:
    {}

ACTIONS:"#,
        themes.join(", ")
    );
    for action in Action::ALL {
        println!("    {:<22}{}", action.id(), action.shortcut());
    }
}

/// Print version information
fn print_version() {
    println!("{} {}", APP_NAME, env!("CARGO_PKG_VERSION"));
}
