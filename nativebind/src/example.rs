//! Host side of `com.github.kr328.typedjni.Example`.
//!
//! The class declares a single native method,
//! `nativeFunction(int, float, String) -> void`, implemented by the shared
//! library `example`. The library is loaded once, on first initialization.
use std::sync::{Arc, OnceLock};

use crate::{
    binding::NativeMethod,
    error::Result,
    loader::{LibraryRegistry, LoadedLibrary},
    marshal::Text,
    search::SearchPath,
};

pub const CLASS: &str = "com.github.kr328.typedjni.Example";
pub const LIBRARY: &str = "example";
pub const NATIVE_FUNCTION: &str = "nativeFunction";
pub const NATIVE_FUNCTION_DESCRIPTOR: &str = "(IFLjava/lang/String;)V";

/// Exported by the library to report how many calls it served.
pub const INVOCATION_COUNT_SYMBOL: &str = "native_invocation_count";

pub struct Example {
    native_function: NativeMethod<(i32, f32, Text), ()>,
}

impl Example {
    pub fn declare() -> Result<Self> {
        Ok(Self {
            native_function: NativeMethod::declare(CLASS, NATIVE_FUNCTION, NATIVE_FUNCTION_DESCRIPTOR)?,
        })
    }

    /// The process-wide declaration.
    pub fn get() -> Result<&'static Example> {
        static EXAMPLE: OnceLock<Example> = OnceLock::new();

        if let Some(example) = EXAMPLE.get() {
            return Ok(example);
        }
        let declared = Example::declare()?;
        Ok(EXAMPLE.get_or_init(|| declared))
    }

    /// Loads the `example` library through `registry` and binds the native method.
    ///
    /// Safe to call repeatedly and from several threads; the library is only
    /// loaded once per registry.
    pub fn initialize(&self, registry: &LibraryRegistry, search: &SearchPath) -> Result<Arc<LoadedLibrary>> {
        self.initialize_with(registry, LIBRARY, search)
    }

    /// Same as [`Example::initialize`] with a different library name or path.
    pub fn initialize_with(
        &self,
        registry: &LibraryRegistry,
        library: &str,
        search: &SearchPath,
    ) -> Result<Arc<LoadedLibrary>> {
        let library = registry.load(library, search)?;
        self.native_function.bind(&library)?;
        Ok(library)
    }

    pub fn method(&self) -> &NativeMethod<(i32, f32, Text), ()> {
        &self.native_function
    }

    pub fn native_function(&self, value: i32, value2: f32, value3: &str) -> Result<()> {
        self.native_function.invoke((value, value2, value3))
    }

    pub fn run(&self) -> Result<()> {
        self.native_function(123, 4.4, "114514")
    }

    /// Calls served by the bound library, when it exports a counter.
    pub fn invocation_count(&self) -> Option<u64> {
        let library = self.native_function.library().filter(|library| !library.is_unloaded())?;
        let ptr = library.find_symbol(INVOCATION_COUNT_SYMBOL)?;
        let count: extern "C" fn() -> u64 = unsafe { std::mem::transmute_copy(&ptr) };
        Some(count())
    }
}
