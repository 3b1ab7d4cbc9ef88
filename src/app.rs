use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::filter::{self, ViewState};
use crate::output::{self, ErrorPanel, OutputFormat, Page, RenderOptions};
use crate::runner::{self, Options, Runner};

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mode {
    List(ViewState),
    Device(String),
    Brands,
    Interactive(ViewState),
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    mode: Mode,
    output: Option<String>,
    output_format: OutputFormat,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let output = args
        .output
        .or(cfg.output)
        .filter(|p| !p.trim().is_empty())
        .map(|p| config::expand_tilde_string(&p));

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false) || output.is_some()
    };

    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => OutputFormat::parse(&raw)
            .ok_or_else(|| format!("invalid output format '{raw}', expected text, json, or html"))?,
        None => output
            .as_deref()
            .and_then(output::infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let timeout = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let debounce_ms = args.debounce_ms.or(cfg.debounce_ms).unwrap_or(300);
    validation::validate_debounce_ms(debounce_ms)?;

    let catalog = args
        .catalog
        .or(cfg.catalog)
        .unwrap_or_else(|| runner::DEFAULT_CATALOG.to_string());
    let site_root = args.site_root.or(cfg.site_root);
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let user_agent = args
        .user_agent
        .or(cfg.user_agent)
        .unwrap_or_else(|| runner::DEFAULT_USER_AGENT.to_string());

    let render = RenderOptions {
        synthesize_history: args
            .synthesize_history
            .or(cfg.synthesize_history)
            .unwrap_or(false),
        listing_page: cfg
            .listing_page
            .unwrap_or_else(|| output::DEFAULT_LISTING_PAGE.to_string()),
    };

    let view = ViewState::new(
        args.brand.as_deref().unwrap_or(filter::ALL_BRANDS),
        args.search.as_deref().unwrap_or_default(),
    );
    let mode = if let Some(id) = args.device {
        Mode::Device(id)
    } else if args.brands {
        Mode::Brands
    } else if args.interactive {
        Mode::Interactive(view)
    } else {
        Mode::List(view)
    };

    Ok(RunConfig {
        options: Options {
            catalog,
            site_root,
            timeout_seconds: timeout,
            proxy,
            user_agent,
            debounce: Duration::from_millis(debounce_ms),
            render,
        },
        mode,
        output,
        output_format,
        no_color,
        verbose: args.verbose,
    })
}

fn fetch_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn emit(page: &Page, run: &RunConfig) -> Result<(), String> {
    let rendered = output::render(page, run.output_format)
        .map_err(|e| format!("failed to render page: {e}"))?;
    write_output(&rendered, run.output.as_deref()).await
}

async fn write_output(rendered: &[u8], path: Option<&str>) -> Result<(), String> {
    match path {
        Some(path) => {
            let mut outfile = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(rendered)
                .await
                .map_err(|e| format!("failed to write output file: {e}"))?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(rendered)
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
            stdout
                .flush()
                .await
                .map_err(|e| format!("failed to write to stdout: {e}"))?;
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    Quit,
    Brand(String),
    Query(String),
}

fn parse_command(line: &str) -> SessionCommand {
    let trimmed = line.trim();
    if trimmed == ":quit" || trimmed == ":q" {
        return SessionCommand::Quit;
    }
    if trimmed == ":brand" {
        return SessionCommand::Brand(filter::ALL_BRANDS.to_string());
    }
    if let Some(rest) = trimmed.strip_prefix(":brand ") {
        return SessionCommand::Brand(rest.trim().to_string());
    }
    SessionCommand::Query(line.to_string())
}

async fn run_interactive(runner: &Runner, initial: ViewState, run: &RunConfig) -> Result<(), String> {
    let listing = run.options.render.listing_page.clone();
    let mut session = match runner.session(initial).await {
        Ok(session) => session,
        Err(e) => {
            emit(&Page::Error(ErrorPanel::for_catalog(&e, &listing)), run).await?;
            return Err(e.to_string());
        }
    };
    tracing::info!(devices = session.catalog().len(), "interactive session started");
    emit(&Page::Catalog(session.current()), run).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    loop {
        // Once input is closed, still apply the last query before leaving.
        if !stdin_open && !session.has_pending_query() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => match parse_command(&line) {
                        SessionCommand::Quit => break,
                        SessionCommand::Brand(brand) => {
                            let view = session.set_filter(&brand);
                            emit(&Page::Catalog(view), run).await?;
                        }
                        SessionCommand::Query(query) => session.input_query(&query),
                    },
                    Ok(None) => stdin_open = false,
                    Err(e) => return Err(format!("failed to read stdin: {e}")),
                }
            }
            view = session.next_recompute() => {
                match view {
                    Some(view) => emit(&Page::Catalog(view), run).await?,
                    None => break,
                }
            }
        }
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    let listing = run.options.render.listing_page.clone();

    if run.verbose > 0 {
        format_kv_line("Catalog", &runner.catalog_location().to_string());
        format_kv_line(
            "Site root",
            run.options.site_root.as_deref().unwrap_or("(catalog directory)"),
        );
        format_kv_line("Timeout", &format!("{}s", run.options.timeout_seconds));
        format_kv_line(
            "Synthesize",
            format_bool(run.options.render.synthesize_history),
        );
    }

    match run.mode.clone() {
        Mode::List(view) => {
            let pb = fetch_spinner("loading devices");
            let result = runner.list(&view).await;
            pb.finish_and_clear();
            match result {
                Ok(view) => emit(&Page::Catalog(view), &run).await,
                Err(e) => {
                    emit(&Page::Error(ErrorPanel::for_catalog(&e, &listing)), &run).await?;
                    Err(e.to_string())
                }
            }
        }
        Mode::Device(id) => {
            let pb = fetch_spinner("loading device");
            let result = runner.device(Some(&id)).await;
            pb.finish_and_clear();
            match result {
                Ok(view) => emit(&Page::Device(view), &run).await,
                Err(e) => {
                    emit(&Page::Error(ErrorPanel::for_device(&e, &listing)), &run).await?;
                    Err(e.to_string())
                }
            }
        }
        Mode::Brands => {
            let pb = fetch_spinner("loading devices");
            let result = runner.load_catalog().await;
            pb.finish_and_clear();
            let catalog = match result {
                Ok(catalog) => catalog,
                Err(e) => {
                    emit(&Page::Error(ErrorPanel::for_catalog(&e, &listing)), &run).await?;
                    return Err(e.to_string());
                }
            };
            let brands = filter::brands(catalog.devices());
            let rendered = match run.output_format {
                OutputFormat::Json => serde_json::to_vec_pretty(&brands)
                    .map_err(|e| format!("failed to encode brands: {e}"))?,
                _ => {
                    let mut out = String::new();
                    for brand in brands.iter() {
                        out.push_str(brand);
                        out.push('\n');
                    }
                    out.into_bytes()
                }
            };
            write_output(&rendered, run.output.as_deref()).await
        }
        Mode::Interactive(view) => run_interactive(&runner, view, &run).await,
    }
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));

    if args.init_config {
        let path = user_config_path
            .clone()
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config path".to_string())?;
        if config::ensure_default_config_file(&path).map_err(|e| e.to_string())? {
            println!("wrote default config to {}", path.display());
        } else {
            println!("config already exists at {}", path.display());
        }
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false).map_err(|e| e.to_string())?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true).map_err(|e| e.to_string())?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;
    crate::logging::init(run.verbose, !run.no_color);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
