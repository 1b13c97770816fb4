//! Native side of `com.github.kr328.typedjni.Example`.
//!
//! Built as the shared library `example` (`libexample.so`, `example.dll`, ...)
//! and loaded by the host by that logical name.
use std::{
    ffi::{CStr, c_char},
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use native_header::core_header::{self, ABI_VERSION, HostH, LogLevel};

/// Values received by the most recent `nativeFunction` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub value: i32,
    pub value2: f32,
    pub value3: String,
}

static INVOCATIONS: AtomicU64 = AtomicU64::new(0);
static LAST_INVOCATION: Mutex<Option<Invocation>> = Mutex::new(None);

/// Implementation of `Example.nativeFunction(int, float, String)`.
///
/// # Safety
///
/// `value3` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Java_com_github_kr328_typedjni_Example_nativeFunction(
    host: &HostH,
    value: i32,
    value2: f32,
    value3: *const c_char,
) {
    let value3 = if value3.is_null() {
        core_header::host_log(host, LogLevel::Warn, "value3 is null, treating it as empty");
        String::new()
    } else {
        unsafe { CStr::from_ptr(value3) }.to_string_lossy().into_owned()
    };

    core_header::host_log(host, LogLevel::Info, &format!("value = {}", value));
    core_header::host_log(host, LogLevel::Info, &format!("value2 = {}", value2));
    core_header::host_log(host, LogLevel::Info, &format!("value3 = {}", value3));

    record(Invocation {
        value,
        value2,
        value3,
    });
}

fn record(invocation: Invocation) {
    match LAST_INVOCATION.lock() {
        Ok(mut last) => *last = Some(invocation),
        Err(poisoned) => *poisoned.into_inner() = Some(invocation),
    }
    INVOCATIONS.fetch_add(1, Ordering::SeqCst);
}

/// Number of `nativeFunction` calls served by this copy of the library.
#[unsafe(no_mangle)]
pub extern "C" fn native_invocation_count() -> u64 {
    INVOCATIONS.load(Ordering::SeqCst)
}

/// Arguments of the latest `nativeFunction` call, if any.
pub fn last_invocation() -> Option<Invocation> {
    match LAST_INVOCATION.lock() {
        Ok(last) => last.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn native_on_load(host: &HostH) -> u32 {
    core_header::host_log(
        host,
        LogLevel::Debug,
        &format!("example library loaded by host abi {}", host.abi_version),
    );
    ABI_VERSION
}

#[unsafe(no_mangle)]
pub extern "C" fn native_on_unload(host: &HostH) {
    core_header::host_log(
        host,
        LogLevel::Debug,
        &format!(
            "example library unloading after {} call(s)",
            native_invocation_count()
        ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn ignore(_level: u32, _ptr: *const u8, _len: usize) {}

    // Tests that call nativeFunction share the recorder.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> std::sync::MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    const HOST: HostH = HostH {
        abi_version: ABI_VERSION,
        log_fn: ignore,
    };

    #[test]
    fn records_arguments() {
        let _serial = serial();
        let before = native_invocation_count();

        unsafe {
            Java_com_github_kr328_typedjni_Example_nativeFunction(&HOST, 123, 4.4, c"114514".as_ptr());
        }

        assert_eq!(native_invocation_count(), before + 1);
        assert_eq!(
            last_invocation(),
            Some(Invocation {
                value: 123,
                value2: 4.4,
                value3: "114514".to_string(),
            })
        );
    }

    #[test]
    fn null_text_is_empty() {
        let _serial = serial();

        unsafe {
            Java_com_github_kr328_typedjni_Example_nativeFunction(&HOST, -7, 0.5, std::ptr::null());
        }

        let last = last_invocation().unwrap();
        assert_eq!(last.value, -7);
        assert_eq!(last.value3, "");
    }

    #[test]
    fn on_load_reports_current_abi() {
        assert_eq!(native_on_load(&HOST), ABI_VERSION);
        native_on_unload(&HOST);
    }
}
