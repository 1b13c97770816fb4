use std::path::PathBuf;

use native_header::signature::DescriptorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("library '{name}' not found (searched: {})", display_paths(searched))]
    LibraryNotFound { name: String, searched: Vec<PathBuf> },

    #[error("failed to load library {path:?}: {source}")]
    LoadFailed {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },

    #[error("symbol not found in '{library}': {}", symbols.join(", "))]
    SymbolNotFound { library: String, symbols: Vec<String> },

    #[error("library '{library}' requires abi version {requested}, host supports {min}..={max}")]
    UnsupportedVersion {
        library: String,
        requested: u32,
        min: u32,
        max: u32,
    },

    #[error("invalid descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("signature mismatch for {method}: declared {declared}, bound types are {actual}")]
    SignatureMismatch {
        method: String,
        declared: String,
        actual: String,
    },

    #[error("native method {0} is already bound")]
    AlreadyBound(String),

    #[error("native method {0} is not bound to a library")]
    Unbound(String),

    #[error("native method {method} is bound to '{library}', which has been unloaded")]
    Unloaded { method: String, library: String },

    #[error("cannot marshal argument {index}: {message}")]
    Marshal { index: usize, message: String },
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "<no directories>".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, BindError>;
