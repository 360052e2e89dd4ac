//! Windows event log source registration and reporting.

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;

use windows_sys::Win32::Foundation::HANDLE;
use windows_sys::Win32::System::EventLog::{
    DeregisterEventSource, EVENTLOG_ERROR_TYPE, EVENTLOG_INFORMATION_TYPE,
    EVENTLOG_WARNING_TYPE, RegisterEventSourceW, ReportEventW,
};
use winreg::RegKey;
use winreg::RegValue;
use winreg::enums::{HKEY_LOCAL_MACHINE, RegType};

use crate::control::EventSink;
use crate::error::{Result, ServiceError};

const APPLICATION_LOG: &str = r"SYSTEM\CurrentControlSet\Services\EventLog\Application";
const EVENT_CREATE: &str = r"%SystemRoot%\System32\EventCreate.exe";
/// Error | Warning | Information
const TYPES_SUPPORTED: u32 = 0x1 | 0x2 | 0x4;
const EVENT_ID: u32 = 1;

fn wide(s: &str) -> Vec<u16> {
    OsStr::new(s).encode_wide().chain(std::iter::once(0)).collect()
}

/// Registers `source` in the Application log using EventCreate.exe as the
/// message file.
pub fn install_source(source: &str) -> Result<()> {
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    let (key, _) = hklm
        .create_subkey(format!(r"{APPLICATION_LOG}\{source}"))
        .map_err(|e| ServiceError::manager("setting up event log failed", e))?;

    let bytes = wide(EVENT_CREATE)
        .into_iter()
        .flat_map(u16::to_le_bytes)
        .collect();
    key.set_raw_value(
        "EventMessageFile",
        &RegValue {
            bytes,
            vtype: RegType::REG_EXPAND_SZ,
        },
    )
    .map_err(|e| ServiceError::manager("setting up event log failed", e))?;
    key.set_value("TypesSupported", &TYPES_SUPPORTED)
        .map_err(|e| ServiceError::manager("setting up event log failed", e))?;

    tracing::debug!(source, "registered event log source");
    Ok(())
}

/// Removes the `source` registration. A missing source is not an error.
pub fn remove_source(source: &str) -> Result<()> {
    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    match hklm.delete_subkey_all(format!(r"{APPLICATION_LOG}\{source}")) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ServiceError::manager("removing event log source failed", e)),
    }
}

/// Event sink writing to the Windows Application log.
pub struct EventLog {
    handle: HANDLE,
}

// The handle returned by RegisterEventSourceW may be used from any thread.
#[allow(unsafe_code)]
unsafe impl Send for EventLog {}
#[allow(unsafe_code)]
unsafe impl Sync for EventLog {}

impl EventLog {
    /// Opens the registered source.
    #[allow(unsafe_code)]
    pub fn open(source: &str) -> Result<Self> {
        let name = wide(source);
        // SAFETY: `name` is a NUL-terminated UTF-16 string that outlives the call.
        let handle = unsafe { RegisterEventSourceW(std::ptr::null(), name.as_ptr()) };
        if handle.is_null() {
            return Err(ServiceError::manager(
                "error opening event log",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(Self { handle })
    }

    #[allow(unsafe_code)]
    fn report(&self, kind: u16, message: &str) {
        let text = wide(message);
        let strings = [text.as_ptr()];
        // SAFETY: the handle is open for the lifetime of `self`; `strings`
        // holds one valid NUL-terminated string.
        let ok = unsafe {
            ReportEventW(
                self.handle,
                kind,
                0,
                EVENT_ID,
                std::ptr::null_mut(),
                1,
                0,
                strings.as_ptr(),
                std::ptr::null(),
            )
        };
        if ok == 0 {
            tracing::warn!(error = %std::io::Error::last_os_error(), "failed to write event log entry");
        }
    }
}

impl EventSink for EventLog {
    fn info(&self, message: &str) {
        self.report(EVENTLOG_INFORMATION_TYPE, message);
    }

    fn warning(&self, message: &str) {
        self.report(EVENTLOG_WARNING_TYPE, message);
    }

    fn error(&self, message: &str) {
        self.report(EVENTLOG_ERROR_TYPE, message);
    }
}

impl Drop for EventLog {
    #[allow(unsafe_code)]
    fn drop(&mut self) {
        // SAFETY: the handle came from RegisterEventSourceW and is closed once.
        unsafe {
            DeregisterEventSource(self.handle);
        }
    }
}
