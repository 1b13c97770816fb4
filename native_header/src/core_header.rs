/// ABI revision implemented by this header.
pub const ABI_VERSION: u32 = 2;
/// Oldest ABI revision the host still accepts.
pub const MIN_ABI_VERSION: u32 = 1;

/// Exported by a native library to run once right after it is loaded.
pub const ON_LOAD_SYMBOL: &str = "native_on_load";
/// Exported by a native library to run once before it is unloaded.
pub const ON_UNLOAD_SYMBOL: &str = "native_on_unload";

/// Severity passed through [`HostH::log_fn`].
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_raw(level: u32) -> Option<Self> {
        match level {
            1 => Some(LogLevel::Error),
            2 => Some(LogLevel::Warn),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Debug),
            5 => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Host context handed to every native entry point as its first argument.
#[repr(C)]
pub struct HostH {
    pub abi_version: u32,
    /// Receives UTF-8 text that is only valid for the duration of the call.
    pub log_fn: extern "C" fn(level: u32, ptr: *const u8, len: usize),
}

/// Forwards a message to the host logger.
pub fn host_log(host: &HostH, level: LogLevel, message: &str) {
    (host.log_fn)(level as u32, message.as_ptr(), message.len())
}

/// Runs once after load; returns the ABI revision the library was built against.
pub type OnLoadFn = extern "C" fn(host: &HostH) -> u32;
/// Runs once before the library handle is released.
pub type OnUnloadFn = extern "C" fn(host: &HostH);
