use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Args)]
pub struct LibraryDirs {
    /// Directory searched for native libraries. Can be repeated.
    /// Searched before NATIVEBIND_LIBRARY_PATH and the executable's directory.
    #[arg(short = 'L', long = "library-path", value_name = "DIR")]
    pub library_paths: Vec<PathBuf>,
}

impl LibraryDirs {
    fn validate(&self) -> Result<(), CliError> {
        for dir in &self.library_paths {
            if !dir.exists() {
                return Err(CliError::LibraryDirNotFound(dir.clone()));
            }
            if !dir.is_dir() {
                return Err(CliError::LibraryPathNotDir(dir.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Args)]
pub struct LibraryArgs {
    #[command(flatten)]
    pub dirs: LibraryDirs,
    /// Logical name (or path) of the library implementing the native method.
    #[arg(long, default_value = crate::example::LIBRARY)]
    pub library: String,
    /// Only search the given directories, never the platform loader's locations.
    #[arg(long)]
    pub no_system: bool,
}

/// The operations available from the command line.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Loads the library and runs the example call site with (123, 4.4, "114514").
    #[clap(alias = "r")]
    Run(LibraryArgs),
    /// Calls nativeFunction with custom arguments.
    #[clap(alias = "c")]
    Call {
        #[arg(allow_negative_numbers = true)]
        value: i32,
        #[arg(allow_negative_numbers = true)]
        value2: f32,
        value3: String,
        #[command(flatten)]
        library: LibraryArgs,
    },
    /// Prints the file a logical library name resolves to.
    #[clap(alias = "l")]
    Locate {
        name: String,
        #[command(flatten)]
        dirs: LibraryDirs,
    },
    /// Prints the exported symbol names for a native method.
    #[clap(alias = "m")]
    Mangle {
        /// Class name, dotted or slashed.
        class: String,
        method: String,
        /// Method descriptor, e.g. "(IFLjava/lang/String;)V", to also print the overload name.
        #[arg(short, long)]
        descriptor: Option<String>,
    },
}

/// Command line of the native binding host.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Typed native-call host.",
    long_about = "Loads native libraries by logical name, binds declared native methods to their exported symbols and calls them.",
    after_help = "
    EXAMPLES:
    # 1. Run the example call site, looking for libexample next to the binary
    nativebind run

    # 2. Same, with an explicit library directory
    nativebind run -L target/debug

    # 3. Call the native method with custom arguments
    nativebind call 7 2.5 hello -L target/debug

    # 4. Show the symbol a native method is exported as
    nativebind mangle com.github.kr328.typedjni.Example nativeFunction -d '(IFLjava/lang/String;)V'
"
)]
pub struct CliArgs {
    /// Enables debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    /// Ensures every explicit library directory exists and is a directory.
    pub fn validate(&self) -> Result<(), CliError> {
        match &self.command {
            Commands::Run(args) => args.dirs.validate(),
            Commands::Call { library, .. } => library.dirs.validate(),
            Commands::Locate { dirs, .. } => dirs.validate(),
            Commands::Mangle { .. } => Ok(()),
        }
    }
}

/// Errors raised while parsing or validating the command line.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("library directory not found: {}", .0.display())]
    LibraryDirNotFound(PathBuf),
    #[error("library path is not a directory: {}", .0.display())]
    LibraryPathNotDir(PathBuf),
    #[error(transparent)]
    ClapError(#[from] clap::Error),
}

/// Parses and validates the given command line.
pub fn parse_args<I, T>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = CliArgs::try_parse_from(args)?;
    args.validate()?;
    Ok(args)
}
