//! fpscript: command-line footprint script compiler.
//!
//! Compiles footprint scripts to normalized shape lists (JSON on stdout, for
//! renderers and inspection) and exports them to Eagle CAD library files.
//! Library housekeeping (`new`, `clone`, `ls`) works on plain directories.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;

use fpscript::config;
use fpscript::export::{self, ExportEntry, ExportFormat};
use fpscript::library::Library;
use fpscript::script::{extract_metadata, ScriptError};

/// Footprint script compiler.
///
/// Evaluates footprint scripts in a sandbox and exports the results as an
/// Eagle CAD library.
#[derive(Parser, Debug)]
#[command(name = "fpscript")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a script and print the normalized shapes as JSON
    Compile {
        /// Path to the footprint script
        script: PathBuf,
    },

    /// Print a script's identity metadata as JSON
    Meta {
        /// Path to the footprint script
        script: PathBuf,
    },

    /// Compile scripts and export them as a CAD library file
    Export {
        /// Paths of the footprint scripts to include
        #[arg(required = true)]
        scripts: Vec<PathBuf>,

        /// Output library file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Target format (defaults to the configured format)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Create a new footprint from the minimal template
    New {
        /// Library directory
        directory: PathBuf,

        /// Display name of the new footprint
        name: String,

        /// Footprint id (file stem); a fresh UUID when omitted
        #[arg(long)]
        id: Option<String>,
    },

    /// Clone a footprint under a new identity, keeping its geometry
    Clone {
        /// Library directory
        directory: PathBuf,

        /// Id of the footprint to clone
        source_id: String,

        /// Id of the clone
        new_id: String,

        /// Display name of the clone
        new_name: String,
    },

    /// List footprints in a library directory (or all configured libraries)
    Ls {
        /// Library directory; configured libraries when omitted
        directory: Option<PathBuf>,
    },
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Routes a script error: user-caused failures go to the script author on
/// stderr, host-caused ones to the diagnostic log.
fn report_script_error(script: &Path, err: &ScriptError) {
    if err.is_user_error() {
        eprintln!("{}: {err}", script.display());
    } else {
        error!(script = %script.display(), error = %err, "Internal evaluator failure");
        eprintln!("{}: internal error while compiling (see log)", script.display());
    }
}

fn read_script(path: &Path) -> Result<String, ExitCode> {
    std::fs::read_to_string(path).map_err(|e| {
        eprintln!("{}: {e}", path.display());
        ExitCode::FAILURE
    })
}

fn cmd_compile(script: &Path) -> ExitCode {
    let source = match read_script(script) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match fpscript::compile(&source) {
        Ok(normalized) => {
            // Shape JSON is the renderer hand-off format.
            match serde_json::to_string_pretty(&normalized) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "Failed to serialize shapes");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            report_script_error(script, &e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_meta(script: &Path) -> ExitCode {
    let source = match read_script(script) {
        Ok(s) => s,
        Err(code) => return code,
    };
    match extract_metadata(&source) {
        Ok(meta) => match serde_json::to_string_pretty(&meta) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize metadata");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("{}: {e}", script.display());
            ExitCode::FAILURE
        }
    }
}

fn cmd_export(scripts: &[PathBuf], output: &Path, format: ExportFormat) -> ExitCode {
    let mut entries = Vec::with_capacity(scripts.len());
    for script in scripts {
        let source = match read_script(script) {
            Ok(s) => s,
            Err(code) => return code,
        };
        let metadata = match extract_metadata(&source) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("{}: {e}", script.display());
                return ExitCode::FAILURE;
            }
        };
        let footprint = match fpscript::compile(&source) {
            Ok(f) => f,
            Err(e) => {
                report_script_error(script, &e);
                return ExitCode::FAILURE;
            }
        };
        entries.push(ExportEntry {
            metadata,
            footprint,
        });
    }

    match export::export(output, format, &entries) {
        Ok(()) => {
            println!(
                "Exported {} footprint(s) to {}",
                entries.len(),
                output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_new(directory: &Path, name: &str, id: Option<String>) -> ExitCode {
    let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
    let library = Library::new(directory.display().to_string(), directory);
    match library.create(&id, name) {
        Ok(()) => {
            println!("{}", library.script_path(&id).display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn cmd_clone(directory: &Path, source_id: &str, new_id: &str, new_name: &str) -> ExitCode {
    let library = Library::new(directory.display().to_string(), directory);
    match library.clone_from(source_id, new_id, new_name) {
        Ok(()) => {
            println!("{}", library.script_path(new_id).display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn list_library(library: &Library) -> bool {
    match library.scan() {
        Ok(ids) => {
            for id in ids {
                match library.metadata(&id) {
                    Ok(meta) => println!("{id}\t{}", meta.name),
                    Err(e) => {
                        tracing::warn!(id, error = %e, "Skipping member without readable metadata");
                        println!("{id}\t?");
                    }
                }
            }
            true
        }
        Err(e) => {
            eprintln!("{e}");
            false
        }
    }
}

fn cmd_ls(directory: Option<&Path>, cfg: &config::Config) -> ExitCode {
    if let Some(dir) = directory {
        if list_library(&Library::new(dir.display().to_string(), dir)) {
            return ExitCode::SUCCESS;
        }
        return ExitCode::FAILURE;
    }

    if cfg.libraries.is_empty() {
        eprintln!("No libraries configured; pass a directory or add libraries to the config");
        return ExitCode::FAILURE;
    }
    for lib_cfg in &cfg.libraries {
        println!("{}:", lib_cfg.name);
        if !list_library(&Library::new(lib_cfg.name.clone(), &lib_cfg.directory)) {
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Load configuration
    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialise logging
    let log_level = get_log_level(args.verbose, args.quiet, &cfg.logging.level);
    init_tracing(log_level);

    match args.command {
        Command::Compile { script } => cmd_compile(&script),
        Command::Meta { script } => cmd_meta(&script),
        Command::Export {
            scripts,
            output,
            format,
        } => {
            let format_str = format.unwrap_or_else(|| cfg.export.format.clone());
            match format_str.parse::<ExportFormat>() {
                Ok(format) => cmd_export(&scripts, &output, format),
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Command::New {
            directory,
            name,
            id,
        } => cmd_new(&directory, &name, id),
        Command::Clone {
            directory,
            source_id,
            new_id,
            new_name,
        } => cmd_clone(&directory, &source_id, &new_id, &new_name),
        Command::Ls { directory } => cmd_ls(directory.as_deref(), &cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn log_level_mapping() {
        assert_eq!(get_log_level(0, true, "debug"), Level::ERROR);
        assert_eq!(get_log_level(0, false, "debug"), Level::DEBUG);
        assert_eq!(get_log_level(1, false, "warn"), Level::INFO);
        assert_eq!(get_log_level(3, false, "warn"), Level::TRACE);
    }
}
