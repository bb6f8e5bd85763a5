//! Glue for a real EPICS IOC.
//!
//! Commands registered here are handed to `iocshRegister` together with an
//! `extern "C"` trampoline generated by the registration macros. Output goes
//! through `epicsStdoutPrintf` so it follows iocsh redirection, diagnostics
//! through `errlogPrintf`.

use std::ffi::{CString, c_char, c_int};

use crate::sys::{IocshArgBuf, IocshCallFunc, IocshFuncDef, RawFuncDef, slots_from_raw};
use crate::{ArgBuf, BuildError, Command, Console};

unsafe extern "C" {
    fn iocshRegister(def: *const IocshFuncDef, func: IocshCallFunc);
    fn epicsStdoutPrintf(format: *const c_char, ...) -> c_int;
    fn errlogPrintf(format: *const c_char, ...) -> c_int;
}

/// Console writing to the IOC's stdout and error log.
#[derive(Debug, Default, Clone, Copy)]
pub struct EpicsConsole;

impl Console for EpicsConsole {
    fn print_line(&mut self, line: &str) {
        let line = to_c(line);
        // SAFETY: "%s\n" consumes exactly the one C string passed.
        unsafe {
            epicsStdoutPrintf(c"%s\n".as_ptr(), line.as_ptr());
        }
    }

    fn report(&mut self, message: &str) {
        let message = to_c(message);
        // SAFETY: as above.
        unsafe {
            errlogPrintf(c"%s\n".as_ptr(), message.as_ptr());
        }
    }
}

fn to_c(text: &str) -> CString {
    CString::new(text.replace('\0', "")).unwrap_or_default()
}

/// Register `command` with iocsh, calling `func` for each invocation.
///
/// A command that failed to build, or whose descriptor cannot be expressed
/// in C, is logged and skipped; the IOC keeps starting.
pub fn register(command: Result<&'static Command, &BuildError>, func: IocshCallFunc) {
    let command = match command {
        Ok(command) => command,
        Err(err) => {
            tracing::error!(target: "iocsh_wrap", error = %err, "command could not be built");
            EpicsConsole.report(&err.to_string());
            return;
        }
    };
    match RawFuncDef::new(command.descriptor()) {
        Ok(raw) => {
            let def = raw.release();
            // SAFETY: `def` is leaked and stays valid for the life of the
            // process, as iocsh requires.
            unsafe { iocshRegister(def.as_ptr(), func) };
            tracing::debug!(target: "iocsh_wrap", command = command.name(), "registered with iocsh");
        }
        Err(err) => {
            tracing::error!(target: "iocsh_wrap", command = command.name(), error = %err, "registration failed");
            EpicsConsole.report(&format!("{}: {err}", command.name()));
        }
    }
}

/// Run `command` against the buffer iocsh passed to the trampoline.
///
/// # Safety
///
/// `args` must be the buffer iocsh built for the descriptor that was
/// registered for `command`.
pub unsafe fn dispatch(command: &Command, args: *const IocshArgBuf) {
    // SAFETY: upheld by the caller; iocsh keeps the strings alive for the
    // duration of the call.
    let slots = unsafe { slots_from_raw(args, command.descriptor()) };
    command.call(&ArgBuf::new(&slots), &mut EpicsConsole);
}
