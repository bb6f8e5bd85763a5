//! Per-call dispatch: convert, invoke, print, tear down.
//!
//! ```text
//! Idle -> Converting -> Invoking -> Printing -> Done
//!                   \-> Aborted (conversion error, target not called)
//!                              \-> Failed (panic caught, diagnostic reported)
//! ```
//!
//! Everything between the first conversion and the argument report runs
//! under one `catch_unwind`, so a panicking converter, target or printer ends
//! the call the same way. Every path drops the call's [`Context`] before
//! returning, so temporaries never outlive the call that created them.
//!
//! While a call is in progress the process panic hook stays quiet; the
//! caught panic becomes the call's single diagnostic line instead. Panics
//! anywhere else still reach the hook that was installed before.

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::context::Context;
use crate::error::{CallError, TargetError};
use crate::native_fn::NativeFunction;
use crate::printer::{Console, ResultPrinter, print_mutable_arguments};
use crate::slot::ArgBuf;

/// How one invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallOutcome {
    /// The function ran and its output was printed.
    Completed,
    /// An argument could not be converted; the function was not called.
    ConversionFailed,
    /// The function, or the printing of its result, panicked.
    TargetFailed,
}

impl CallOutcome {
    pub fn is_completed(self) -> bool {
        self == Self::Completed
    }
}

thread_local! {
    static IN_CALL: Cell<bool> = const { Cell::new(false) };
}

static PANIC_HOOK: Once = Once::new();

/// Wrap the current panic hook so it is skipped while a call is running.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if IN_CALL.get() {
                tracing::debug!(target: "iocsh_wrap", panic = %info, "panic inside a command");
            } else {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as running a call until dropped.
struct CallScope {
    outer: bool,
}

impl CallScope {
    fn enter() -> Self {
        Self {
            outer: IN_CALL.replace(true),
        }
    }
}

impl Drop for CallScope {
    fn drop(&mut self) {
        IN_CALL.set(self.outer);
    }
}

/// Run one call of `func` against `args`.
///
/// Output goes to `console.print_line`; a conversion failure or caught panic
/// produces exactly one `console.report` line prefixed with `name`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn dispatch<F, M>(
    name: &str,
    func: &F,
    printer: &ResultPrinter<F::Output>,
    report_arguments: bool,
    args: &ArgBuf<'_>,
    console: &mut dyn Console,
) -> CallOutcome
where
    F: NativeFunction<M>,
{
    install_panic_hook();
    let mut ctx = Context::new();
    tracing::trace!(target: "iocsh_wrap", command = name, slots = args.len(), "converting arguments");

    let result = {
        let _scope = CallScope::enter();
        panic::catch_unwind(AssertUnwindSafe(|| {
            run(name, func, printer, report_arguments, args, &mut ctx, &mut *console)
        }))
        .unwrap_or_else(|payload| Err(CallError::Target(TargetError::from_panic(payload))))
    };

    match result {
        Ok(()) => CallOutcome::Completed,
        Err(err) => {
            let outcome = match err {
                CallError::Conversion { .. } => CallOutcome::ConversionFailed,
                CallError::Target(_) => CallOutcome::TargetFailed,
            };
            tracing::warn!(target: "iocsh_wrap", command = name, error = %err, "call aborted");
            console.report(&format!("{name}: {err}"));
            outcome
        }
    }
}

/// Invoke, print the result, then report mutated arguments.
///
/// The result may borrow from `ctx`, so it is printed and dropped before the
/// arguments are read back.
fn run<F, M>(
    name: &str,
    func: &F,
    printer: &ResultPrinter<F::Output>,
    report_arguments: bool,
    args: &ArgBuf<'_>,
    ctx: &mut Context,
    console: &mut dyn Console,
) -> Result<(), CallError>
where
    F: NativeFunction<M>,
{
    {
        let value = func.invoke(args, ctx)?;
        tracing::trace!(target: "iocsh_wrap", command = name, "printing result");
        printer.print(&value, console);
    }
    if report_arguments {
        print_mutable_arguments(ctx, console);
    }
    Ok(())
}
