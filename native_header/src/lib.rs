//! Definitions shared between the `nativebind` host and the native libraries it loads.
pub mod core_header;
pub mod mangle;
pub mod signature;
