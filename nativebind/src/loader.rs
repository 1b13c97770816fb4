//! Init-once loading of native libraries.
//!
//! A [`LibraryRegistry`] opens every logical library at most once. Loading holds
//! the registry lock, so concurrent first use from several threads results in
//! a single OS load and a single `native_on_load` call. Failed loads are not
//! remembered and can be retried.
use std::{
    collections::HashMap,
    fmt, mem,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex, MutexGuard, OnceLock, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use libloading::Library;
use native_header::core_header::{
    ABI_VERSION, HostH, MIN_ABI_VERSION, ON_LOAD_SYMBOL, ON_UNLOAD_SYMBOL, OnLoadFn, OnUnloadFn,
};

use crate::{
    error::{BindError, Result},
    logging,
    search::SearchPath,
};

/// Context passed to every native entry point.
pub static HOST: HostH = HostH {
    abi_version: ABI_VERSION,
    log_fn: logging::native_log,
};

/// An open native library.
pub struct LoadedLibrary {
    name: String,
    path: PathBuf,
    abi_version: u32,
    /// Set once the registry ran `native_on_unload` for this instance.
    unloaded: AtomicBool,
    library: Library,
}

impl fmt::Debug for LoadedLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedLibrary")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("abi_version", &self.abi_version)
            .field("unloaded", &self.is_unloaded())
            .finish()
    }
}

impl LoadedLibrary {
    fn open(name: &str, path: &Path) -> Result<Self> {
        let library = unsafe { Library::new(path) }.map_err(|source| BindError::LoadFailed {
            path: path.to_path_buf(),
            source,
        })?;

        let mut loaded = LoadedLibrary {
            name: name.to_string(),
            path: path.to_path_buf(),
            abi_version: MIN_ABI_VERSION,
            unloaded: AtomicBool::new(false),
            library,
        };

        if let Some(ptr) = loaded.find_symbol(ON_LOAD_SYMBOL) {
            let on_load: OnLoadFn = unsafe { mem::transmute_copy(&ptr) };
            let requested = on_load(&HOST);
            if !(MIN_ABI_VERSION..=ABI_VERSION).contains(&requested) {
                return Err(BindError::UnsupportedVersion {
                    library: loaded.name,
                    requested,
                    min: MIN_ABI_VERSION,
                    max: ABI_VERSION,
                });
            }
            loaded.abi_version = requested;
        } else {
            tracing::debug!(library = name, "no {} hook, assuming abi {}", ON_LOAD_SYMBOL, MIN_ABI_VERSION);
        }

        tracing::info!(
            library = name,
            path = %path.display(),
            abi = loaded.abi_version,
            "loaded native library"
        );
        Ok(loaded)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ABI revision negotiated through `native_on_load`.
    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }

    /// Whether the registry has unloaded this instance. Methods bound to it
    /// refuse to call into it afterwards.
    pub fn is_unloaded(&self) -> bool {
        self.unloaded.load(Ordering::SeqCst)
    }

    pub(crate) fn find_symbol(&self, symbol: &str) -> Option<*const ()> {
        let found = unsafe { self.library.get::<*const ()>(symbol.as_bytes()) };
        match found {
            Ok(ptr) if !ptr.is_null() => Some(*ptr),
            _ => None,
        }
    }

    /// Address of an exported symbol.
    ///
    /// The address stays valid for as long as this library is alive.
    pub fn symbol(&self, symbol: &str) -> Result<*const ()> {
        self.find_symbol(symbol).ok_or_else(|| BindError::SymbolNotFound {
            library: self.name.clone(),
            symbols: vec![symbol.to_string()],
        })
    }

    fn run_unload_hook(&self) {
        if self.unloaded.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(ptr) = self.find_symbol(ON_UNLOAD_SYMBOL) {
            let on_unload: OnUnloadFn = unsafe { mem::transmute_copy(&ptr) };
            on_unload(&HOST);
        }
    }
}

/// Libraries loaded so far, keyed by logical name.
#[derive(Default)]
pub struct LibraryRegistry {
    libraries: Mutex<HashMap<String, Arc<LoadedLibrary>>>,
    loads: AtomicUsize,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry shared by the whole process.
    pub fn global() -> &'static LibraryRegistry {
        static GLOBAL: OnceLock<LibraryRegistry> = OnceLock::new();
        GLOBAL.get_or_init(LibraryRegistry::new)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<LoadedLibrary>>> {
        self.libraries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads `name`, or returns the already loaded instance.
    ///
    /// Directories of `search` are tried first. When none of them has the
    /// library and the search path allows it, the platform loader gets a go
    /// with the bare file name.
    pub fn load(&self, name: &str, search: &SearchPath) -> Result<Arc<LoadedLibrary>> {
        let mut libraries = self.lock();
        if let Some(library) = libraries.get(name) {
            tracing::trace!(library = name, "library already loaded");
            return Ok(Arc::clone(library));
        }

        let library = match search.locate(name) {
            Ok(path) => LoadedLibrary::open(name, &path)?,
            Err(not_found) if search.system_fallback() => {
                let file_name = search.file_name_for(name);
                LoadedLibrary::open(name, Path::new(&file_name))
                    .map_err(|err| fallback_error(name, not_found, err))?
            }
            Err(not_found) => return Err(not_found),
        };

        self.loads.fetch_add(1, Ordering::SeqCst);
        let library = Arc::new(library);
        libraries.insert(name.to_string(), Arc::clone(&library));
        Ok(library)
    }

    pub fn get(&self, name: &str) -> Option<Arc<LoadedLibrary>> {
        self.lock().get(name).cloned()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Number of OS-level loads performed by this registry.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Runs `native_on_unload` and forgets the library.
    ///
    /// The handle is closed once the last binding referring to it is gone.
    /// Returns `false` when nothing was loaded under `name`.
    pub fn unload(&self, name: &str) -> Result<bool> {
        let Some(library) = self.lock().remove(name) else {
            return Ok(false);
        };
        library.run_unload_hook();
        tracing::info!(library = name, "unloaded native library");
        Ok(true)
    }
}

/// Error reported when the platform loader was asked for `name` after the
/// search directories came up empty.
///
/// Only a failed open means the library was not found. Anything else happened
/// to a library the platform loader did open and is reported as is.
fn fallback_error(name: &str, not_found: BindError, err: BindError) -> BindError {
    match err {
        BindError::LoadFailed { .. } => {
            tracing::debug!(library = name, error = %err, "platform loader failed");
            not_found
        }
        other => other,
    }
}
