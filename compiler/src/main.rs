use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hlsc::emit::EmitOptions;
use hlsc::error::DriverError;
use hlsc::pipeline;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, clap::ValueEnum)]
enum EmitStage {
    Cpp,
    BuildInfo,
    Model,
}

#[derive(Parser, Debug)]
#[command(
    name = "hlsc",
    version,
    about = "HLS C++ emitter — renders resolved, attribute-annotated loop programs as Vivado HLS C++"
)]
struct Cli {
    /// Resolved program model (JSON)
    model: PathBuf,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra header included after the prologue (repeatable)
    #[arg(short = 'I', long = "include")]
    include: Vec<PathBuf>,

    /// Output stage
    #[arg(long, value_enum, default_value_t = EmitStage::Cpp)]
    emit: EmitStage,

    /// Log emission progress to stderr
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "hlsc=debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), DriverError> {
    match path {
        Some(path) => std::fs::write(path, text).map_err(|e| DriverError::write(path, e)),
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(text.as_bytes())
                .map_err(|e| DriverError::write("<stdout>", e))
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, DriverError> {
    let module = pipeline::load_module(&cli.model)?;

    match cli.emit {
        EmitStage::Model => {
            let json = serde_json::to_string_pretty(&module)?;
            write_output(cli.output.as_deref(), &(json + "\n"))?;
            Ok(ExitCode::SUCCESS)
        }
        EmitStage::BuildInfo => {
            let provenance = pipeline::compute_provenance(&module)?;
            write_output(cli.output.as_deref(), &provenance.to_json())?;
            Ok(ExitCode::SUCCESS)
        }
        EmitStage::Cpp => {
            let options = EmitOptions {
                include_paths: cli.include.clone(),
            };
            let result = pipeline::compile(&module, &options);
            for diag in &result.diagnostics {
                eprintln!("hlsc: {}", diag);
            }
            if result.has_errors() {
                eprintln!(
                    "hlsc: emission failed with {} error(s); no output written",
                    result.error_count()
                );
                return Ok(ExitCode::from(1));
            }
            write_output(cli.output.as_deref(), &result.generated.cpp_source)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    tracing::debug!(
        model = %cli.model.display(),
        emit = ?cli.emit,
        includes = cli.include.len(),
        "starting"
    );

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("hlsc: error: {}", e);
            ExitCode::from(2)
        }
    }
}
