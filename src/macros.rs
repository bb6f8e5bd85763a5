//! Registration macros for EPICS IOCs.
//!
//! ```ignore
//! fn scale(value: f64, factor: i32) -> f64 {
//!     value * f64::from(factor)
//! }
//!
//! iocsh_wrap::iocsh_func_wrap_registrar!(scaleRegistrar, {
//!     iocsh_wrap::iocsh_func_wrap!(scale, "value", "factor");
//! });
//! ```
//!
//! and in the IOC's `.dbd`: `registrar(scaleRegistrar)`.

/// Register a function under its own name.
#[cfg(feature = "epics")]
#[macro_export]
macro_rules! iocsh_func_wrap {
    ($func:ident $(, $help:expr)* $(,)?) => {
        $crate::iocsh_func_wrap_as!(::core::stringify!($func), $func $(, $help)*)
    };
}

/// Register a function under an explicit name.
///
/// Use this for several variants of one operation, each registered under
/// its own name, or when `$func` is a path or a cast function pointer.
#[cfg(feature = "epics")]
#[macro_export]
macro_rules! iocsh_func_wrap_as {
    ($name:expr, $func:expr $(, $help:expr)* $(,)?) => {{
        $crate::__private::lazy_static! {
            static ref COMMAND: ::core::result::Result<$crate::Command, $crate::BuildError> =
                $crate::Command::new($name, $func).help(&[$($help),*]).build();
        }
        unsafe extern "C" fn trampoline(args: *const $crate::sys::IocshArgBuf) {
            if let ::core::result::Result::Ok(command) = &*COMMAND {
                // SAFETY: iocsh calls this with a buffer built for COMMAND's descriptor.
                unsafe { $crate::epics::dispatch(command, args) }
            }
        }
        $crate::epics::register(::core::result::Result::as_ref(&*COMMAND), trampoline)
    }};
}

/// Like [`iocsh_func_wrap!`] but prints neither result nor arguments.
///
/// Takes either a function name alone or an explicit name and function.
#[cfg(feature = "epics")]
#[macro_export]
macro_rules! iocsh_func_wrap_quiet {
    ($func:ident $(, $help:expr)* $(,)?) => {
        $crate::iocsh_func_wrap_quiet!(::core::stringify!($func), $func $(, $help)*)
    };
    ($name:expr, $func:expr $(, $help:expr)* $(,)?) => {{
        $crate::__private::lazy_static! {
            static ref COMMAND: ::core::result::Result<$crate::Command, $crate::BuildError> =
                $crate::Command::quiet($name, $func).help(&[$($help),*]).build();
        }
        unsafe extern "C" fn trampoline(args: *const $crate::sys::IocshArgBuf) {
            if let ::core::result::Result::Ok(command) = &*COMMAND {
                // SAFETY: iocsh calls this with a buffer built for COMMAND's descriptor.
                unsafe { $crate::epics::dispatch(command, args) }
            }
        }
        $crate::epics::register(::core::result::Result::as_ref(&*COMMAND), trampoline)
    }};
}

/// Define registrar `$name` and export it as `pvar_func_$name` for
/// `registrar($name)` in a `.dbd` file.
#[cfg(feature = "epics")]
#[macro_export]
macro_rules! iocsh_func_wrap_registrar {
    ($name:ident, { $($body:tt)* }) => {
        #[allow(non_snake_case)]
        pub extern "C" fn $name() {
            $($body)*
        }

        $crate::__private::paste! {
            #[unsafe(no_mangle)]
            #[allow(non_upper_case_globals)]
            pub static [<pvar_func_ $name>]: extern "C" fn() = $name;
        }
    };
}
