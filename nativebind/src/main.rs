use std::process::ExitCode;

use native_header::{mangle, signature::MethodDescriptor};
use nativebind::{
    BindError, Example, LibraryRegistry, SearchPath,
    cli_parse::{self, CliError, Commands, LibraryArgs, LibraryDirs},
    logging,
};

fn search_dirs(dirs: &LibraryDirs) -> SearchPath {
    SearchPath::from_env(dirs.library_paths.iter().cloned())
}

fn search_path(args: &LibraryArgs) -> SearchPath {
    search_dirs(&args.dirs).with_system_fallback(!args.no_system)
}

/// Loads the library and binds the example's native method, like the class initializer would.
fn load_example(args: &LibraryArgs) -> Result<&'static Example, BindError> {
    let example = Example::get()?;
    example.initialize_with(LibraryRegistry::global(), &args.library, &search_path(args))?;
    Ok(example)
}

fn shutdown(example: &Example, args: &LibraryArgs) -> Result<(), BindError> {
    match example.invocation_count() {
        Some(count) => println!("native invocations: {}", count),
        None => println!("native invocations: unknown"),
    }
    LibraryRegistry::global().unload(&args.library)?;
    Ok(())
}

fn run(command: Commands) -> Result<(), BindError> {
    match command {
        Commands::Run(args) => {
            let example = load_example(&args)?;
            example.run()?;
            shutdown(example, &args)?;
        }
        Commands::Call {
            value,
            value2,
            value3,
            library,
        } => {
            let example = load_example(&library)?;
            example.native_function(value, value2, &value3)?;
            shutdown(example, &library)?;
        }
        Commands::Locate { name, dirs } => {
            let path = search_dirs(&dirs).locate(&name)?;
            println!("{}", path.display());
        }
        Commands::Mangle {
            class,
            method,
            descriptor,
        } => {
            println!("{}", mangle::short_name(&class, &method));
            if let Some(descriptor) = descriptor {
                let descriptor = MethodDescriptor::parse(&descriptor)?;
                println!("{}", mangle::long_name(&class, &method, &descriptor));
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match cli_parse::parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(CliError::ClapError(err)) => err.exit(),
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    logging::init_cli_logger(args.verbose);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
