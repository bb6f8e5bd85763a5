//! Core of `iocsh-wrap`: classify a native function's parameters, describe
//! it to the shell, and marshal untyped shell arguments into a typed call.
//!
//! The pieces, leaves first:
//!
//! - [`kind`]: parameter classification ([`ParameterKind`], [`ParamType`])
//! - [`slot`]: the shell's argument slots ([`ArgSlot`], [`ArgBuf`])
//! - [`convert`]: slot to native conversion ([`Arg`])
//! - [`context`]: per-call arena for temporaries ([`Context`])
//! - [`descriptor`]: shell-visible names and tags ([`FunctionDescriptor`])
//! - [`native_fn`]: arity-generic invocation ([`NativeFunction`])
//! - [`ret`]: owned and context-borrowing return values ([`Ret`])
//! - [`printer`]: result and argument printing ([`PrintResult`], [`Console`])
//! - [`dispatch`] and [`command`]: one call end to end ([`Command`])
//! - [`sys`]: the C layout of the registration ABI

pub mod command;
pub mod complex;
pub mod context;
pub mod convert;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod kind;
pub mod native_fn;
pub mod printer;
pub mod ret;
pub mod slot;
pub mod sys;

pub use command::{Command, Registration};
pub use complex::Complex;
pub use context::{Context, Temporary, TemporaryRef};
pub use convert::{Arg, ArgItem, CStringBuffer};
pub use descriptor::{ArgumentDescriptor, FunctionDescriptor, FunctionDescriptorBuilder, MAX_ARITY};
pub use dispatch::{CallOutcome, dispatch};
pub use error::{BuildError, CallError, ConversionError, TargetError};
pub use kind::{ArgType, ParamType, ParameterKind, Qualifiers, ReturnKind, Signature};
pub use native_fn::{BorrowsContext, NativeFunction};
pub use printer::{
    BufferConsole, Console, NO_PRINT_FORMAT, NULL_STRING, PrintResult, PrintReturn, ResultPrinter,
    StdConsole, print_mutable_arguments,
};
pub use ret::{Owned, Ret, RetItem};
pub use slot::{ArgBuf, ArgSlot};
