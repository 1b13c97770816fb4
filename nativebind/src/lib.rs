//! Typed native-call binding.
//!
//! Native libraries are found by logical name ([`search`]), loaded once per
//! process ([`loader`]), and their exported functions are bound to typed
//! declarations ([`binding`]) whose arguments are marshalled by [`marshal`].
//! [`example`] is the call site for `com.github.kr328.typedjni.Example`.
pub mod binding;
pub mod cli_parse;
pub mod error;
pub mod example;
pub mod loader;
pub mod logging;
pub mod marshal;
pub mod search;

pub use binding::NativeMethod;
pub use error::{BindError, Result};
pub use example::Example;
pub use loader::{LibraryRegistry, LoadedLibrary};
pub use marshal::Text;
pub use search::SearchPath;
