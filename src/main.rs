use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use zt_wipe::crypto::Certificate;
use zt_wipe::io::{DeviceOpener, RawDeviceOpener};
use zt_wipe::*;

/// Erasure failed or was rejected
const EXIT_WIPE_FAILED: u8 = 1;
/// Erasure succeeded but its proof could not be recorded
const EXIT_RECORD_FAILED: u8 = 3;
/// Certificate is not verified by the custody service
const EXIT_NOT_VERIFIED: u8 = 4;

#[derive(Parser)]
#[command(name = "zt-wipe")]
#[command(about = "Storage erasure with hash-bound chain-of-custody certificates")]
#[command(version = "1.0.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Configuration file (defaults to the per-user config file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the root privilege check (for image files)
    #[arg(long, global = true)]
    unsafe_mode: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Wipe a device and produce its certificate
    Wipe {
        /// Device path (e.g., /dev/sda)
        device: String,

        /// Erasure method
        #[arg(short, long, value_enum)]
        method: MethodArg,

        /// Device model string for the certificate
        #[arg(long, default_value = "")]
        model: String,

        /// Device serial number for the certificate
        #[arg(long, default_value = "")]
        serial: String,

        /// Device size in bytes (queried from the device when omitted)
        #[arg(long)]
        size: Option<u64>,

        /// Write the certificate to this file
        #[arg(short, long)]
        cert_output: Option<PathBuf>,

        /// Do not record the certificate with the custody service
        #[arg(long)]
        no_record: bool,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Ask the custody service whether a certificate is on record
    Verify {
        /// Certificate file
        certificate: PathBuf,
    },

    /// Print the certificate and device hashes of a certificate file
    Hash {
        /// Certificate file
        certificate: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    /// Three zero-fill passes over the whole device
    Plain,
    /// Not supported by this build
    Encrypted,
    /// NVMe sanitize (crypto erase, block erase fallback)
    Firmware,
    /// ATA Security Erase via hdparm
    Ata,
}

impl From<MethodArg> for WipeMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Plain => WipeMethod::PlainOverwrite,
            MethodArg::Encrypted => WipeMethod::EncryptedOverwrite,
            MethodArg::Firmware => WipeMethod::FirmwareErase,
            MethodArg::Ata => WipeMethod::AtaSecureErase,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let config = match &cli.config {
        Some(path) => WipeConfig::load_from(Some(path.as_path()), true),
        None => WipeConfig::load(),
    }
    .context("Failed to load configuration")?;

    match cli.command {
        Commands::Wipe {
            device,
            method,
            model,
            serial,
            size,
            cert_output,
            no_record,
            yes,
        } => {
            if !cli.unsafe_mode && !is_root() {
                bail!("wiping requires root privileges; run with sudo or pass --unsafe-mode for image files");
            }
            let target = WipeTarget {
                path: device,
                method: method.into(),
                model,
                serial,
                size,
            };
            wipe(&config, target, cert_output.as_deref(), no_record, yes)
        }
        Commands::Verify { certificate } => verify(&config, &certificate),
        Commands::Hash { certificate } => hash(&certificate),
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

struct WipeTarget {
    path: String,
    method: WipeMethod,
    model: String,
    serial: String,
    size: Option<u64>,
}

fn wipe(
    config: &WipeConfig,
    target: WipeTarget,
    cert_output: Option<&Path>,
    no_record: bool,
    yes: bool,
) -> Result<ExitCode> {
    let size = match target.size {
        Some(size) => size,
        None => query_size(&target.path)?,
    };

    let device = Device::new(
        device_name(&target.path),
        target.path.as_str(),
        size,
        false,
        false,
        target.model,
        target.serial,
        DeviceClass::Unknown,
        vec![target.method],
    );

    println!("{}", "WARNING: this permanently destroys all data on the device".red().bold());
    println!("  Device: {} ({} bytes)", device.path, device.size_bytes);
    println!("  Method: {}", target.method);
    if !yes && !confirm("DESTROY")? {
        println!("Operation cancelled.");
        return Ok(ExitCode::SUCCESS);
    }

    let custody = if no_record {
        None
    } else {
        Some(CustodyClient::from_config(config).context("Failed to set up custody client")?)
    };

    let mut session = WipeSession::new(WipeOrchestrator::from_config(config), custody);
    let record = session.wipe_drive(&device, target.method);

    let elapsed = humantime::format_duration(Duration::from_secs(record.result.duration_secs()));
    match &record.result.failure {
        None => println!("{} wiped {} in {}", "✓".green(), device.path, elapsed),
        Some(e) => println!("{} wipe of {} failed: {}", "✗".red(), device.path, e),
    }

    if let Some(certificate) = &record.certificate {
        print_hashes(certificate);
        if let Some(path) = cert_output {
            certificate
                .save(path)
                .with_context(|| format!("Failed to write certificate to {}", path.display()))?;
            println!("  Certificate written to {}", path.display());
        }
    }

    match &record.custody {
        CustodyOutcome::Recorded => println!("{} proof recorded", "✓".green()),
        CustodyOutcome::Skipped => println!("  Recording skipped"),
        CustodyOutcome::NotAttempted => {}
        CustodyOutcome::RecordFailed(e) => {
            println!("{} proof not recorded: {}", "⚠".yellow(), e)
        }
        CustodyOutcome::CertificateFailed(e) => {
            println!("{} certificate not built: {}", "⚠".yellow(), e)
        }
    }

    let code = if !record.result.succeeded() {
        EXIT_WIPE_FAILED
    } else if matches!(
        record.custody,
        CustodyOutcome::RecordFailed(_) | CustodyOutcome::CertificateFailed(_)
    ) {
        EXIT_RECORD_FAILED
    } else {
        0
    };
    Ok(ExitCode::from(code))
}

fn verify(config: &WipeConfig, path: &Path) -> Result<ExitCode> {
    let document =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let client = CustodyClient::from_config(config).context("Failed to set up custody client")?;

    let result = client.verify(&document);
    if result.verified {
        println!("{} certificate is on record", "✓".green());
        println!("  Recorded at: {}", format_epoch(result.timestamp));
        if let Some(method) = result.wipe_method {
            println!("  Method:      {}", method);
        }
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} certificate not verified: {}",
            "✗".red(),
            result.error_message.as_deref().unwrap_or("unknown error")
        );
        Ok(ExitCode::from(EXIT_NOT_VERIFIED))
    }
}

fn hash(path: &Path) -> Result<ExitCode> {
    let certificate = Certificate::load(path)
        .with_context(|| format!("Failed to load certificate {}", path.display()))?;
    print_hashes(&certificate);
    Ok(ExitCode::SUCCESS)
}

fn print_hashes(certificate: &Certificate) {
    println!("  cert_hash:   {}", certificate.cert_hash().to_prefixed_hex());
    println!("  device_hash: {}", certificate.device_hash().to_prefixed_hex());
}

fn query_size(path: &str) -> Result<u64> {
    let mut handle = RawDeviceOpener
        .open_for_write(path)
        .with_context(|| format!("Failed to open {}", path))?;
    handle
        .capacity()
        .with_context(|| format!("Failed to query size of {}", path))
}

fn device_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn format_epoch(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| chrono::DateTime::from_timestamp(s, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

fn confirm(word: &str) -> Result<bool> {
    print!("\nType '{}' to confirm: ", word);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim() == word)
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}
