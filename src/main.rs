mod cli;

use mediasort::{config, queue, scanner, server, streaming::Transcoder};
use mediasort_common::paths::{decode_path, encode_path, resolve_series_dir};
use mediasort_naming::{build, default_entries};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    input: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .or_else(config::find_default_config);
    let mut config = config::load_config_or_default(config_path.as_deref())?;

    // Override from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(input) = input {
        config.library.input_path = Some(input);
    }

    tracing::info!("Starting mediasort server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    server::start_server_with_options(config, config_path.as_deref()).await
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediasort=trace,mediasort_naming=debug,mediasort_db=debug,mediasort_common=debug,tower_http=debug".to_string()
        } else {
            "mediasort=info,mediasort_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port, input } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, input, cli.config.as_deref()))
        }
        Commands::Series { input } => list_series(input, cli.config.as_deref()),
        Commands::Plan {
            series,
            name,
            input,
            json,
        } => plan_series(&series, name, input, cli.config.as_deref(), json),
        Commands::EncodePath { path } => {
            println!("{}", encode_path(&path));
            Ok(())
        }
        Commands::DecodePath { token } => {
            println!("{}", decode_path(&token)?);
            Ok(())
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediasort {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn input_root(input: Option<PathBuf>, config_path: Option<&Path>) -> Result<PathBuf> {
    let mut config = config::load_config_or_default(config_path)?;
    if let Some(input) = input {
        config.library.input_path = Some(input);
    }
    config::require_input_root(&config)
}

fn list_series(input: Option<PathBuf>, config_path: Option<&Path>) -> Result<()> {
    let root = input_root(input, config_path)?;
    let series = scanner::list_series(&root)?;

    if series.is_empty() {
        println!("No series found under {}", root.display());
        return Ok(());
    }

    for s in &series {
        println!("{:>5}  {}", s.count, s.name);
    }
    println!("\n{} series", series.len());
    Ok(())
}

fn plan_series(
    series_dir: &str,
    name: Option<String>,
    input: Option<PathBuf>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<()> {
    let root = input_root(input, config_path)?;
    let dir = resolve_series_dir(&root, series_dir)?;
    let files = scanner::scan_series(&dir)?;
    let entries = default_entries(files);

    let series_name = name.unwrap_or_else(|| queue::default_series_name(series_dir));
    let items = build(&series_name, &entries)
        .with_context(|| format!("Failed to build assignments for {}", series_dir))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for item in &items {
        println!("{}", item.assignment.source());
        println!("  -> {}", item.assignment.destination());
    }
    println!("\n{} files", items.len());
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let transcoder = Transcoder::new(&config.transcode);
    let ffmpeg = transcoder.ffmpeg();

    let version = std::process::Command::new(ffmpeg)
        .arg("-version")
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).into_owned());

    match version {
        Some(version) => {
            println!(
                "✓ ffmpeg ({}) - {}",
                version.lines().next().unwrap_or(""),
                ffmpeg.display()
            );
            println!("\nAll required tools are available!");
        }
        None => {
            println!("✗ ffmpeg - {}", ffmpeg.display());
            println!("\nffmpeg is missing. MKV/AVI/WMV/FLV previews will fail to play.");
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Server: {}:{}", config.server.host, config.server.port);
            match &config.library.input_path {
                Some(input) => println!("  Input path: {}", input.display()),
                None => println!("  Input path: (not set, required to serve)"),
            }
            println!(
                "  Database: {}",
                config::database_path(&config, Some(p)).display()
            );
            println!("  Publisher: {:?}", config.publisher.kind);
            if let Some(url) = &config.publisher.url {
                println!("    URL: {}", url);
            }
            println!(
                "  Transcode: {} {} crf {}",
                config.transcode.video_codec, config.transcode.preset, config.transcode.crf
            );
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            println!("Default config:");
            println!("  Server: {}:{}", config.server.host, config.server.port);
        }
    }

    Ok(())
}
