//! Expose native Rust functions as EPICS iocsh commands.
//!
//! A function's parameter and return types decide everything: the argument
//! tags the shell sees, how each untyped slot becomes a typed value, and how
//! the result and any mutated arguments are printed afterwards.
//!
//! ```
//! use iocsh_wrap::prelude::*;
//! use iocsh_wrap::shell::CommandTable;
//!
//! fn add_one(value: &mut i32) -> i32 {
//!     *value += 1;
//!     *value
//! }
//!
//! let mut table = CommandTable::new();
//! table.register(Command::new("addOne", add_one).help(&["value"]).build()?);
//!
//! let mut console = BufferConsole::new();
//! table.execute("addOne 41", &mut console)?;
//! assert_eq!(console.lines, vec!["42 (0x2a)", "arg[0]: 42 (0x2a)"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! With the `epics` feature the `iocsh_func_wrap*` macros register commands
//! with a running IOC.

pub use iocsh_wrap_core::*;

#[cfg(feature = "epics")]
pub mod epics;
pub mod logging;
mod macros;
pub mod shell;

pub mod prelude {
    pub use crate::{
        Arg, ArgBuf, ArgSlot, BufferConsole, CallOutcome, Command, Complex, Console, ParamType, ParameterKind,
        PrintResult, StdConsole,
    };
}

#[doc(hidden)]
pub mod __private {
    pub use lazy_static::lazy_static;
    pub use paste::paste;
}
