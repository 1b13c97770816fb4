//! Exported symbol names for native methods.
//!
//! A native method of class `com.example.Foo` named `bar` is looked up under the
//! short name `Java_com_example_Foo_bar`. Overloaded methods append the mangled
//! parameter descriptor after a double underscore (the long name).
use crate::signature::MethodDescriptor;

/// Prefix shared by every native method symbol.
pub const SYMBOL_PREFIX: &str = "Java_";

/// Escapes a class name, method name or descriptor fragment.
///
/// Package separators become `_`, while the characters that would otherwise
/// be ambiguous get an escape sequence: `_` is `_1`, `;` is `_2`, `[` is `_3`,
/// and anything outside ASCII alphanumerics is `_0xxxx` with the UTF-16 code unit
/// in lowercase hex.
pub fn mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '/' | '.' => out.push('_'),
            '_' => out.push_str("_1"),
            ';' => out.push_str("_2"),
            '[' => out.push_str("_3"),
            c if c.is_ascii_alphanumeric() => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("_0{:04x}", unit));
                }
            }
        }
    }
    out
}

/// `Java_<class>_<method>`.
pub fn short_name(class: &str, method: &str) -> String {
    format!("{}{}_{}", SYMBOL_PREFIX, mangle(class), mangle(method))
}

/// `Java_<class>_<method>__<params>`.
pub fn long_name(class: &str, method: &str, descriptor: &MethodDescriptor) -> String {
    format!(
        "{}__{}",
        short_name(class, method),
        mangle(&descriptor.params_descriptor())
    )
}
