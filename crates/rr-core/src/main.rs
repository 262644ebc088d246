//! Report Relay - HTTP to PDF to chat
//!
//! The main entry point for rr-core, handling:
//! - The HTTP relay server
//! - One-shot local rendering
//! - One-shot rendering and delivery

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rr_core::config::RelayConfig;
use rr_core::delivery::TelegramClient;
use rr_core::exit_codes::ExitCode;
use rr_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use rr_core::pipeline::{prepare_report, PipelineError, ReportPipeline};
use rr_core::server::{RelayServer, ServerConfig};
use rr_core::signals::ShutdownSignals;
use rr_report::{PdfRenderer, ReportConfig, ReportError, ReportGenerator, ReportRequest};
use serde_json::json;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Report Relay - render vulnerability reports to PDF and deliver them to a chat
#[derive(Parser)]
#[command(name = "rr-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Report layout configuration (JSON file)
    #[arg(long, global = true, env = "RR_REPORT_CONFIG")]
    report_config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay (default)
    Serve(ServeArgs),
    /// Render a report locally without delivering it
    Render(RenderArgs),
    /// Render a report and deliver it once
    Send(SendArgs),
    /// Print version information
    Version,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Bind address (overrides RR_BIND)
    #[arg(long)]
    bind: Option<String>,

    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Worker threads (overrides RR_WORKERS)
    #[arg(long)]
    workers: Option<usize>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Request payload (JSON file, `-` for stdin)
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// PDF output path (default: derived file name in the current directory)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Write the HTML serialization here; without --output no PDF is produced
    #[arg(long)]
    html: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Request payload (JSON file, `-` for stdin)
    #[arg(long, short = 'i')]
    input: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = if cli.global.quiet || cli.global.verbose > 0 {
        Some(LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet))
    } else {
        None
    };
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let json_output = matches!(
        cli.command,
        Some(Commands::Render(_)) | Some(Commands::Send(_))
    );
    let result = match cli.command {
        None => run_serve(&cli.global, &ServeArgs::default()),
        Some(Commands::Serve(args)) => run_serve(&cli.global, &args),
        Some(Commands::Render(args)) => run_render(&cli.global, &args),
        Some(Commands::Send(args)) => run_send(&cli.global, &args),
        Some(Commands::Version) => {
            println!("rr-core {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => {
            eprintln!("rr-core: {}", err.message);
            if json_output {
                println!(
                    "{}",
                    json!({
                        "ok": false,
                        "code": err.code.code_name(),
                        "exit_code": err.code.as_i32(),
                        "error": err.message,
                    })
                );
            }
            err.code
        }
    };
    std::process::exit(exit_code.as_i32());
}

/// A command failure: operator-facing message plus exit code.
#[derive(Debug)]
struct CliError {
    code: ExitCode,
    message: String,
}

fn fail(code: ExitCode, err: impl std::fmt::Display) -> CliError {
    CliError {
        code,
        message: err.to_string(),
    }
}

fn report_error_code(err: &ReportError) -> ExitCode {
    match err {
        ReportError::InvalidConfig(_) | ReportError::JsonError(_) => ExitCode::ConfigError,
        ReportError::IoError(_) => ExitCode::IoError,
        _ => ExitCode::RenderError,
    }
}

fn load_report_config(global: &GlobalOpts) -> Result<ReportConfig, CliError> {
    let Some(path) = &global.report_config else {
        return Ok(ReportConfig::default());
    };
    let text = std::fs::read_to_string(path).map_err(|e| {
        fail(
            ExitCode::ConfigError,
            format!("cannot read report config {}: {}", path.display(), e),
        )
    })?;
    ReportConfig::from_json(&text).map_err(|e| {
        fail(
            ExitCode::ConfigError,
            format!("invalid report config {}: {}", path.display(), e),
        )
    })
}

fn build_generator(config: &ReportConfig) -> Result<ReportGenerator, CliError> {
    ReportGenerator::new(config.clone()).map_err(|e| fail(report_error_code(&e), e))
}

fn build_renderer(config: &ReportConfig) -> Result<PdfRenderer, CliError> {
    PdfRenderer::new(&config.fonts).map_err(|e| fail(report_error_code(&e), e))
}

fn read_input(path: &Path) -> Result<Vec<u8>, CliError> {
    let result = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf).map(|_| buf)
    } else {
        std::fs::read(path)
    };
    result.map_err(|e| {
        fail(
            ExitCode::IoError,
            format!("cannot read {}: {}", path.display(), e),
        )
    })
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|e| {
        fail(
            ExitCode::IoError,
            format!("cannot write {}: {}", path.display(), e),
        )
    })
}

fn relay_config() -> Result<RelayConfig, CliError> {
    RelayConfig::from_env().map_err(|e| fail(ExitCode::ConfigError, e))
}

fn run_serve(global: &GlobalOpts, args: &ServeArgs) -> Result<(), CliError> {
    let mut relay = relay_config()?;
    if let Some(bind) = &args.bind {
        relay.bind = bind.clone();
    }
    if let Some(port) = args.port {
        relay.port = port;
    }
    if let Some(workers) = args.workers {
        relay.workers = workers;
    }
    relay
        .validate()
        .map_err(|e| fail(ExitCode::ConfigError, e))?;

    let report_config = load_report_config(global)?;
    let generator = build_generator(&report_config)?;
    let renderer = build_renderer(&report_config)?;
    let client = TelegramClient::new(&relay);
    info!(config = ?relay, font = renderer.family_name(), "starting relay");

    let pipeline = Arc::new(ReportPipeline::new(
        generator,
        renderer,
        client,
        relay.chat_id.clone(),
    ));
    // Workers inherit the blocked mask, so the mask must be set first.
    let signals = ShutdownSignals::block().map_err(|e| {
        fail(
            ExitCode::InternalError,
            format!("cannot install signal handling: {}", e),
        )
    })?;
    let server = RelayServer::start(&ServerConfig::from(&relay), pipeline)
        .map_err(|e| fail(ExitCode::IoError, e))?;
    signals.notify(server.shutdown_flag()).map_err(|e| {
        fail(
            ExitCode::InternalError,
            format!("cannot install signal handling: {}", e),
        )
    })?;
    eprintln!("rr-core: listening on http://{}", server.addr());
    server.wait();
    info!("relay server stopped");
    Ok(())
}

fn run_send(global: &GlobalOpts, args: &SendArgs) -> Result<(), CliError> {
    let relay = relay_config()?;
    let report_config = load_report_config(global)?;
    let generator = build_generator(&report_config)?;
    let body = read_input(&args.input)?;
    let renderer = build_renderer(&report_config)?;

    let pipeline = ReportPipeline::new(
        generator,
        renderer,
        TelegramClient::new(&relay),
        relay.chat_id.clone(),
    );
    match pipeline.handle(&body) {
        Ok(receipt) => {
            println!("{}", json!({"ok": true, "receipt": receipt}));
            Ok(())
        }
        Err(e) => {
            let code = match e {
                PipelineError::Render(_) => ExitCode::RenderError,
                PipelineError::Delivery(_) => ExitCode::DeliveryError,
            };
            Err(fail(code, e))
        }
    }
}

fn run_render(global: &GlobalOpts, args: &RenderArgs) -> Result<(), CliError> {
    let report_config = load_report_config(global)?;
    let generator = build_generator(&report_config)?;
    let body = read_input(&args.input)?;
    let request = ReportRequest::from_json_bytes(&body);
    let now = Utc::now();

    let want_pdf = args.output.is_some() || args.html.is_none();
    let (report, pdf_path) = if want_pdf {
        let renderer = build_renderer(&report_config)?;
        let prepared = prepare_report(&generator, &renderer, &request, now)
            .map_err(|e| fail(report_error_code(&e), e))?;
        let path = args
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(&prepared.report.filename));
        write_output(&path, &prepared.pdf)?;
        (prepared.report, Some(path))
    } else {
        (generator.generate(&request, now), None)
    };

    if let Some(html_path) = &args.html {
        write_output(html_path, report.to_html().as_bytes())?;
    }

    println!(
        "{}",
        json!({
            "ok": true,
            "kind": request.kind(),
            "filename": report.filename,
            "caption": report.caption,
            "rows_total": report.rows_total,
            "rows_shown": report.rows_shown,
            "pdf": pdf_path.map(|p| p.display().to_string()),
            "html": args.html.as_ref().map(|p| p.display().to_string()),
        })
    );
    Ok(())
}
