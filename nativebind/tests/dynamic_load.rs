//! End-to-end tests against the built `example` shared library.
//!
//! The library is produced by the `example_module` crate. When it has not been
//! built next to the test binary the tests return early.
use std::{sync::Arc, thread};

use native_header::core_header::ABI_VERSION;
use nativebind::{BindError, Example, LibraryRegistry, SearchPath, example::LIBRARY};

fn search() -> SearchPath {
    SearchPath::from_env(std::iter::empty()).with_system_fallback(false)
}

fn library_built() -> bool {
    match search().locate(LIBRARY) {
        Ok(_) => true,
        Err(err) => {
            eprintln!("skipping: {}", err);
            false
        }
    }
}

#[test]
fn run_calls_into_shared_library() {
    if !library_built() {
        return;
    }

    let registry = LibraryRegistry::new();
    let example = Example::declare().unwrap();
    let library = example.initialize(&registry, &search()).unwrap();

    assert_eq!(library.abi_version(), ABI_VERSION);
    assert_eq!(
        example.method().bound_symbol().as_deref(),
        Some("Java_com_github_kr328_typedjni_Example_nativeFunction")
    );

    let before = example.invocation_count().unwrap();
    example.run().unwrap();
    example.native_function(-1, f32::NAN, "").unwrap();
    assert!(example.invocation_count().unwrap() >= before + 2);

    assert!(registry.unload(LIBRARY).unwrap());
}

#[test]
fn initialization_is_idempotent() {
    if !library_built() {
        return;
    }

    let registry = LibraryRegistry::new();
    let example = Example::declare().unwrap();

    let first = example.initialize(&registry, &search()).unwrap();
    let second = example.initialize(&registry, &search()).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.load_count(), 1);
}

#[test]
fn initialization_after_unload_binds_fresh_instance() {
    if !library_built() {
        return;
    }

    let registry = LibraryRegistry::new();
    let example = Example::declare().unwrap();

    let first = example.initialize(&registry, &search()).unwrap();
    example.run().unwrap();

    assert!(registry.unload(LIBRARY).unwrap());
    assert!(first.is_unloaded());
    assert!(!example.method().is_bound());
    assert!(matches!(example.run(), Err(BindError::Unloaded { .. })));
    assert_eq!(example.invocation_count(), None);

    let second = example.initialize(&registry, &search()).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(registry.load_count(), 2);
    assert!(example.method().is_bound());
    example.run().unwrap();
    assert!(example.invocation_count().is_some());
}

#[test]
fn concurrent_initialization_loads_once() {
    if !library_built() {
        return;
    }

    let registry = Arc::new(LibraryRegistry::new());
    let example = Arc::new(Example::declare().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let example = Arc::clone(&example);
            thread::spawn(move || example.initialize(&registry, &search()).unwrap())
        })
        .collect();
    let libraries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.load_count(), 1);
    assert!(libraries.windows(2).all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    example.run().unwrap();
}

#[test]
fn missing_symbol_is_reported() {
    if !library_built() {
        return;
    }

    let registry = LibraryRegistry::new();
    let library = registry.load(LIBRARY, &search()).unwrap();
    let method = nativebind::NativeMethod::<(i32,), ()>::declare(
        "com.github.kr328.typedjni.Example",
        "missingFunction",
        "(I)V",
    )
    .unwrap();

    match method.bind(&library) {
        Err(BindError::SymbolNotFound { library, symbols }) => {
            assert_eq!(library, LIBRARY);
            assert_eq!(
                symbols,
                vec![
                    "Java_com_github_kr328_typedjni_Example_missingFunction".to_string(),
                    "Java_com_github_kr328_typedjni_Example_missingFunction__I".to_string(),
                ]
            );
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(!method.is_bound());
}
