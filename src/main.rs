use bee_convert::config::{self, AppConfig};
use bee_convert::convert::{self, CancelToken, ConvertOptions};
use bee_convert::imaging::{ImageBackend, RustBackend};
use bee_convert::selection::{self, ScanOptions, Selection};
use bee_convert::{output, preview};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("BEE_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("BEE_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "bee-convert")]
#[command(about = "Convert HEIF/HEIC photos to JPEG, keeping their metadata")]
#[command(long_about = "\
Convert HEIF/HEIC photos to JPEG, keeping their metadata

Each input becomes a JPEG with the same base name, written beside it or into
--output-dir. The colour profile, EXIF, XMP and IPTC blocks of the source are
carried over to the JPEG. A file that fails to convert is reported and the
rest of the batch carries on.

  photos/
  ├── IMG_0001.HEIC    → IMG_0001.jpg
  ├── IMG_0002.heif    → IMG_0002.jpg
  └── notes.txt          (ignored by folder selection)

Settings are read from ./bee-convert.toml if present.
Run 'bee-convert gen-config' to generate a documented one.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./bee-convert.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Where converted files go, and how results are reported.
#[derive(clap::Args, Clone)]
struct OutputArgs {
    /// Write JPEGs into this directory instead of beside each source
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print results as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Convert files, or every HEIF file in a folder, to JPEG
    Convert {
        /// HEIF/HEIC files to convert, in order
        #[arg(required_unless_present = "folder", conflicts_with = "folder")]
        files: Vec<PathBuf>,

        /// Convert every .heif/.heic file in this folder instead
        #[arg(long)]
        folder: Option<PathBuf>,

        /// With --folder, include subfolders
        #[arg(long)]
        recursive: bool,

        /// Remember --output-dir for the desktop window's alternate folder
        #[arg(long, requires = "output_dir")]
        remember: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Decode one file and show (or save) its preview
    Preview {
        file: PathBuf,

        /// Save the preview as PNG
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// List the HEIF files a folder selection would convert
    Scan {
        dir: PathBuf,

        /// Include subfolders
        #[arg(long)]
        recursive: bool,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Open the desktop window
    Gui,
    /// Print a stock bee-convert.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    let backend: Arc<dyn ImageBackend> = Arc::new(RustBackend::new());

    match cli.command {
        Command::Convert {
            files,
            folder,
            recursive,
            remember,
            output: output_args,
        } => {
            let app_config = load_app_config(config_path)?;
            let selection = match folder {
                Some(dir) => {
                    let scan = scan_options(&app_config, recursive);
                    Selection::from_folder(&dir, &scan)?
                }
                None => Selection::from_files(files),
            };
            let options = ConvertOptions {
                alternate_dir: output_args.output_dir,
                path_memory: if remember {
                    Some(app_config.path_memory()?)
                } else {
                    None
                },
            };

            let json = output_args.json;
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    if json {
                        continue;
                    }
                    for line in output::format_convert_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = convert::convert_batch(
                &*backend,
                selection.tasks().to_vec(),
                &options,
                &CancelToken::new(),
                Some(&tx),
            );
            drop(tx);
            printer
                .join()
                .map_err(|_| "output thread panicked")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_report(&report);
            }

            if report.failed() > 0 {
                return Err(format!("{} file(s) failed to convert", report.failed()).into());
            }
        }
        Command::Preview { file, save } => {
            let app_config = load_app_config(config_path)?;
            let image = preview::load_preview(&*backend, &file, app_config.preview_bounds())?;
            if let Some(path) = &save {
                let rgba = image::RgbaImage::from_raw(image.width, image.height, image.rgba.clone())
                    .ok_or("preview buffer does not match its dimensions")?;
                rgba.save(path)?;
            }
            output::print_preview_output(&image, save.as_deref());
        }
        Command::Scan {
            dir,
            recursive,
            output: output_args,
        } => {
            let app_config = load_app_config(config_path)?;
            let files = selection::scan_folder(&dir, &scan_options(&app_config, recursive))?;
            if output_args.json {
                let selection = Selection::from_files(files);
                println!("{}", serde_json::to_string_pretty(&selection)?);
            } else {
                output::print_scan_output(&dir, &files, output_args.output_dir.as_deref());
            }
        }
        Command::Gui => run_gui(backend, &load_app_config(config_path)?)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// An explicit `--config` must exist; the default file is optional.
fn load_app_config(path: Option<&Path>) -> Result<AppConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_required_config(path),
        None => config::load_config(Path::new(config::DEFAULT_CONFIG_FILE)),
    }
}

/// Initialise stderr logging: warn by default, `-v` info, `-vv` debug.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `--recursive` on the command line can only widen the configured scan.
fn scan_options(config: &AppConfig, recursive_flag: bool) -> ScanOptions {
    ScanOptions {
        recursive: recursive_flag || config.scan.recursive,
    }
}

#[cfg(feature = "gui")]
fn run_gui(backend: Arc<dyn ImageBackend>, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = bee_convert::app::AppState::from_config(backend, config);
    bee_convert::gui::run(state)?;
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run_gui(_backend: Arc<dyn ImageBackend>, _config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    Err("this build has no desktop window (rebuild with the `gui` feature)".into())
}
