use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use protowire::{collection_to_json, compile_with_config};
use protowire_compiler::{Config, Error, Indent};
use tracing::{error, info, Level};

#[derive(Parser)]
#[command(name = "protowirec")]
#[command(about = "Compile .proto schemas into Rust types with wire-format codecs", long_about = None)]
struct Cli {
    /// Log every step, including skipped and unchanged files
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Rust modules from `.proto` files
    Generate {
        #[command(flatten)]
        options: Options,

        /// Output directory (if omitted, prints to stdout)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Parse and resolve `.proto` files without generating anything
    Check {
        #[command(flatten)]
        options: Options,
    },

    /// Print the resolved schema set as JSON
    Dump {
        #[command(flatten)]
        options: Options,
    },
}

#[derive(Args)]
struct Options {
    /// Input `.proto` files, relative to the include paths
    #[arg(value_name = "PROTO_FILES", required = true)]
    files: Vec<String>,

    /// Directory to search for schema files, in order
    #[arg(short = 'I', long = "include", value_name = "PATH")]
    includes: Vec<PathBuf>,

    /// JSON file with compiler options; flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Indent generated code with tabs
    #[arg(long, conflicts_with = "indent")]
    tabs: bool,

    /// Indent generated code with this many spaces
    #[arg(long, value_name = "WIDTH")]
    indent: Option<usize>,

    /// Do not write `protowire_runtime.rs`
    #[arg(long)]
    no_runtime: bool,

    /// Reject 64-bit numeric field types
    #[arg(long)]
    reduced_numerics: bool,

    /// Require enums to start at zero and forbid aliases without `allow_alias`
    #[arg(long)]
    strict_enums: bool,

    /// Only generate types for the files named on the command line
    #[arg(long)]
    no_imports: bool,

    /// Path generated code uses to reach the runtime
    #[arg(long, value_name = "PATH")]
    runtime_path: Option<String>,
}

impl Options {
    fn config(&self) -> Result<Config, Error> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| Error::Io { path: path.clone(), source })?;
                Config::from_json(&text)?
            }
            None => Config::new(),
        };
        for include in &self.includes {
            config.include_path(include);
        }
        if self.tabs {
            config.indent(Indent::Tabs);
        }
        if let Some(width) = self.indent {
            config.indent(Indent::Spaces(width));
        }
        if self.no_runtime {
            config.emit_runtime(false);
        }
        if self.reduced_numerics {
            config.reduced_numerics(true);
        }
        if self.strict_enums {
            config.strict_enums(true);
        }
        if self.no_imports {
            config.include_imports(false);
        }
        if let Some(path) = &self.runtime_path {
            config.runtime_path(path);
        }
        if config.include_paths.is_empty() {
            config.include_path(".");
        }
        Ok(config)
    }
}

fn run(command: &Commands) -> Result<(), Error> {
    match command {
        Commands::Generate { options, output } => {
            let config = options.config()?;
            match output {
                Some(dir) => {
                    let written = compile_with_config(&config, &options.files, dir)?;
                    for path in written {
                        info!("wrote {}", path.display());
                    }
                }
                None => {
                    for artifact in config.compile(&options.files)? {
                        println!("// {}\n{}", artifact.path.display(), artifact.contents);
                    }
                }
            }
            Ok(())
        }

        Commands::Check { options } => {
            let config = options.config()?;
            config.compile(&options.files)?;
            info!("{} ok", options.files.join(", "));
            Ok(())
        }

        Commands::Dump { options } => {
            let config = options.config()?;
            println!("{}", collection_to_json(&config, &options.files)?);
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
