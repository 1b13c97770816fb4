use std::{
    fmt::{self, Display},
    marker::PhantomData,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use native_header::{
    mangle,
    signature::{MethodDescriptor, normalize_class_name},
};

use crate::{
    error::{BindError, Result},
    loader::{HOST, LoadedLibrary},
    marshal::{ArgKinds, NativeArgs, NativeReturn},
};

#[derive(Clone, Copy)]
struct FnPtr(*const ());

// The pointer refers to code inside a library kept alive by `BoundTarget`.
unsafe impl Send for FnPtr {}
unsafe impl Sync for FnPtr {}

struct BoundTarget {
    function: FnPtr,
    /// `None` for functions registered directly.
    symbol: Option<String>,
    library: Option<Arc<LoadedLibrary>>,
}

impl BoundTarget {
    /// A target whose library was unloaded can be replaced by a new binding.
    fn is_stale(&self) -> bool {
        self.library.as_ref().is_some_and(|library| library.is_unloaded())
    }
}

/// A native method declaration: class, name and a descriptor checked against
/// the Rust parameter kinds `K` and return type `R`.
///
/// The method is unusable until it is bound, either by resolving its exported
/// symbol in a loaded library ([`NativeMethod::bind`]) or by registering a
/// function pointer ([`NativeMethod::register`]). Binding happens once, unless
/// the library it was bound to gets unloaded; the method can then be bound
/// again to a fresh instance.
pub struct NativeMethod<K: ArgKinds, R: NativeReturn> {
    class: String,
    name: String,
    descriptor: MethodDescriptor,
    target: RwLock<Option<BoundTarget>>,
    _marker: PhantomData<fn(K) -> R>,
}

impl<K: ArgKinds, R: NativeReturn> NativeMethod<K, R> {
    /// Declares `class.name` with the given descriptor.
    ///
    /// Fails when the descriptor does not describe `K` and `R` exactly.
    pub fn declare(class: &str, name: &str, descriptor: &str) -> Result<Self> {
        let declared = MethodDescriptor::parse(descriptor)?;
        let expected = MethodDescriptor::new(K::signatures(), R::signature());
        let class = normalize_class_name(class);

        if declared != expected {
            return Err(BindError::SignatureMismatch {
                method: format!("{}.{}", class, name),
                declared: declared.to_string(),
                actual: expected.to_string(),
            });
        }

        Ok(Self {
            class,
            name: name.to_string(),
            descriptor: declared,
            target: RwLock::new(None),
            _marker: PhantomData,
        })
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<BoundTarget>> {
        self.target.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<BoundTarget>> {
        self.target.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Candidate symbols, short name first.
    pub fn symbol_names(&self) -> [String; 2] {
        [
            mangle::short_name(&self.class, &self.name),
            mangle::long_name(&self.class, &self.name, &self.descriptor),
        ]
    }

    /// Resolves the method in `library`.
    ///
    /// Binding again to the same library is a no-op.
    pub fn bind(&self, library: &Arc<LoadedLibrary>) -> Result<()> {
        let mut target = self.write();
        if let Some(bound) = target.as_ref() {
            match &bound.library {
                Some(current) if Arc::ptr_eq(current, library) => return Ok(()),
                _ if bound.is_stale() => {
                    tracing::debug!(method = %self, library = library.name(), "rebinding after unload");
                }
                _ => return Err(BindError::AlreadyBound(self.to_string())),
            }
        }

        let candidates = self.symbol_names();
        let Some((symbol, function)) = candidates
            .iter()
            .find_map(|symbol| library.find_symbol(symbol).map(|ptr| (symbol.clone(), ptr)))
        else {
            return Err(BindError::SymbolNotFound {
                library: library.name().to_string(),
                symbols: candidates.to_vec(),
            });
        };

        tracing::debug!(method = %self, symbol = %symbol, library = library.name(), "bound native method");

        *target = Some(BoundTarget {
            function: FnPtr(function),
            symbol: Some(symbol),
            library: Some(Arc::clone(library)),
        });
        Ok(())
    }

    /// Binds the method to an explicit function, bypassing symbol lookup.
    ///
    /// # Safety
    ///
    /// `function` must be an `extern "C"` function taking `&HostH` followed by
    /// the raw form of each parameter kind and returning the raw form of `R`.
    /// It must stay valid for the lifetime of this declaration.
    pub unsafe fn register(&self, function: *const ()) -> Result<()> {
        let mut target = self.write();
        if target.as_ref().is_some_and(|bound| !bound.is_stale()) {
            return Err(BindError::AlreadyBound(self.to_string()));
        }
        *target = Some(BoundTarget {
            function: FnPtr(function),
            symbol: None,
            library: None,
        });

        tracing::debug!(method = %self, "registered native method");
        Ok(())
    }

    /// Whether [`NativeMethod::invoke`] has a live function to call.
    pub fn is_bound(&self) -> bool {
        self.read().as_ref().is_some_and(|bound| !bound.is_stale())
    }

    /// Exported symbol the method was resolved to, if it was resolved from a library.
    pub fn bound_symbol(&self) -> Option<String> {
        self.read().as_ref().and_then(|bound| bound.symbol.clone())
    }

    /// Library providing the implementation, if any.
    pub fn library(&self) -> Option<Arc<LoadedLibrary>> {
        self.read().as_ref().and_then(|bound| bound.library.clone())
    }

    /// Marshals `args` and calls the bound function.
    pub fn invoke<A>(&self, args: A) -> Result<R>
    where
        A: NativeArgs<Kinds = K>,
    {
        let target = self.read();
        let Some(bound) = target.as_ref() else {
            return Err(BindError::Unbound(self.to_string()));
        };
        if let Some(library) = bound.library.as_ref().filter(|library| library.is_unloaded()) {
            return Err(BindError::Unloaded {
                method: self.to_string(),
                library: library.name().to_string(),
            });
        }

        tracing::trace!(method = %self, "invoking native method");
        // `declare` checked the descriptor against K and R, and `bind`/`register`
        // only accept functions for that descriptor.
        unsafe { args.call(&HOST, bound.function.0) }
    }
}

impl<K: ArgKinds, R: NativeReturn> Display for NativeMethod<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.class, self.name, self.descriptor)
    }
}

impl<K: ArgKinds, R: NativeReturn> fmt::Debug for NativeMethod<K, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeMethod")
            .field("method", &self.to_string())
            .field("bound_symbol", &self.bound_symbol())
            .finish()
    }
}
