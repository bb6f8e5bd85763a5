//! Type-erased, registrable commands.
//!
//! A [`Command`] bundles a function's descriptor, its signature and a boxed
//! call trampoline, so a host can store commands of any signature side by
//! side and invoke them with nothing but a slot buffer.
//!
//! ```
//! use iocsh_wrap_core::{ArgBuf, ArgSlot, BufferConsole, Command};
//!
//! fn scale(value: f64, factor: i32) -> f64 {
//!     value * f64::from(factor)
//! }
//!
//! let command = Command::new("scale", scale).help(&["value", "factor"]).build()?;
//! assert_eq!(command.descriptor().arity(), 2);
//!
//! let mut console = BufferConsole::new();
//! let slots = [ArgSlot::Double(1.5), ArgSlot::Int(4)];
//! command.call(&ArgBuf::new(&slots), &mut console);
//! assert_eq!(console.lines, vec!["6"]);
//! # Ok::<(), iocsh_wrap_core::BuildError>(())
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::descriptor::FunctionDescriptor;
use crate::dispatch::{CallOutcome, dispatch};
use crate::error::BuildError;
use crate::kind::{ReturnKind, Signature};
use crate::native_fn::NativeFunction;
use crate::printer::{Console, PrintReturn, ResultPrinter};
use crate::ret::RetItem;
use crate::slot::ArgBuf;

type CallFn = dyn Fn(&ArgBuf<'_>, &mut dyn Console) -> CallOutcome + Send + Sync;

/// A wrapped function ready to be registered with a shell.
pub struct Command {
    descriptor: FunctionDescriptor,
    signature: Signature,
    quiet: bool,
    call: Box<CallFn>,
}

impl Command {
    /// Wrap `func`, printing its result and mutated arguments after each call.
    pub fn new<F, M>(name: impl Into<String>, func: F) -> Registration<F, M>
    where
        F: NativeFunction<M>,
        F::Output: PrintReturn,
    {
        Registration {
            name: name.into(),
            func,
            help: Vec::new(),
            printer: ResultPrinter::for_type(),
            returns: <F::Output as PrintReturn>::RETURN_KIND,
            quiet: false,
            _marker: PhantomData,
        }
    }

    /// Wrap `func` without printing anything after the call.
    ///
    /// The return type needs no [`PrintReturn`] impl, so the signature
    /// records it as [`ReturnKind::Opaque`]. Use [`Registration::quiet`] to
    /// silence a printable return and keep its kind.
    pub fn quiet<F, M>(name: impl Into<String>, func: F) -> Registration<F, M>
    where
        F: NativeFunction<M>,
    {
        Registration {
            name: name.into(),
            func,
            help: Vec::new(),
            printer: ResultPrinter::Silent,
            returns: ReturnKind::Opaque,
            quiet: true,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Invoke the command with `args`.
    pub fn call(&self, args: &ArgBuf<'_>, console: &mut dyn Console) -> CallOutcome {
        (self.call)(args, console)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("descriptor", &self.descriptor)
            .field("signature", &self.signature)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

/// Builder returned by [`Command::new`] and [`Command::quiet`].
pub struct Registration<F, M>
where
    F: NativeFunction<M>,
{
    name: String,
    func: F,
    help: Vec<String>,
    printer: ResultPrinter<F::Output>,
    returns: ReturnKind,
    quiet: bool,
    _marker: PhantomData<fn() -> M>,
}

impl<F, M> Registration<F, M>
where
    F: NativeFunction<M>,
{
    /// Argument names, in order. Extra names are ignored.
    pub fn help(mut self, help: &[&str]) -> Self {
        self.help = help.iter().map(|&name| name.to_owned()).collect();
        self
    }

    /// Print neither the result nor the mutated arguments.
    pub fn quiet(mut self) -> Self {
        self.printer = ResultPrinter::Silent;
        self.quiet = true;
        self
    }

    /// Print results with `printer` instead of the return type's default.
    pub fn printer<P>(mut self, printer: P) -> Self
    where
        P: for<'c> Fn(&RetItem<'c, F::Output>, &mut dyn fmt::Write) -> fmt::Result + Send + Sync + 'static,
    {
        if self.quiet {
            tracing::debug!(target: "iocsh_wrap", command = %self.name, "printer ignored for quiet command");
        } else {
            self.printer = ResultPrinter::custom(printer);
        }
        self
    }

    /// Describe the function and box its call path.
    pub fn build(self) -> Result<Command, BuildError> {
        let help: Vec<&str> = self.help.iter().map(String::as_str).collect();
        let descriptor = FunctionDescriptor::describe::<F, M>(&self.name, &help)?;
        let signature = Signature {
            parameters: F::parameters(),
            returns: self.returns,
        };
        tracing::debug!(
            target: "iocsh_wrap",
            command = %self.name,
            arity = descriptor.arity(),
            quiet = self.quiet,
            "built command"
        );

        let Registration {
            name,
            func,
            printer,
            quiet,
            ..
        } = self;
        let call: Box<CallFn> = Box::new(move |args: &ArgBuf<'_>, console: &mut dyn Console| {
            dispatch(&name, &func, &printer, !quiet, args, console)
        });

        Ok(Command {
            descriptor,
            signature,
            quiet,
            call,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::ParameterKind;
    use crate::printer::BufferConsole;
    use crate::slot::ArgSlot;
    use crate::printer::PrintResult;
    use std::fmt::Write as _;

    fn short_plus_one(value: i16) -> i16 {
        value + 1
    }

    fn twice(text: &mut String) -> usize {
        let copy = text.clone();
        text.push_str(&copy);
        text.len()
    }

    struct Opaque;

    impl PrintResult for Opaque {}

    fn make_opaque(_: i32) -> Opaque {
        Opaque
    }

    struct Unprintable;

    fn make_unprintable(_: i32) -> Unprintable {
        Unprintable
    }

    fn call(command: &Command, slots: &[ArgSlot<'_>]) -> BufferConsole {
        let mut console = BufferConsole::new();
        command.call(&ArgBuf::new(slots), &mut console);
        console
    }

    #[test]
    fn default_names_and_signature() {
        let command = Command::new("shortPlusOne", short_plus_one).build().unwrap();
        assert_eq!(command.name(), "shortPlusOne");
        assert_eq!(command.descriptor().arguments()[0].name(), "<i16>");
        assert_eq!(
            command.signature().returns,
            ReturnKind::Value(ParameterKind::Int { bits: 16, signed: true })
        );
        assert!(!command.is_quiet());
        assert_eq!(call(&command, &[ArgSlot::Int(-3)]).lines, vec!["-2 (0xfffe)"]);
    }

    #[test]
    fn mutated_strings_are_reported() {
        let command = Command::new("twice", twice).help(&["text"]).build().unwrap();
        let console = call(&command, &[ArgSlot::String(Some(c"ab"))]);
        assert_eq!(console.lines, vec!["4 (0x4)", "arg[0]: abab"]);
    }

    #[test]
    fn quiet_prints_nothing() {
        let command = Command::quiet("twice", twice).build().unwrap();
        assert!(command.is_quiet());
        assert_eq!(command.signature().returns, ReturnKind::Opaque);
        let console = call(&command, &[ArgSlot::String(Some(c"ab"))]);
        assert!(console.lines.is_empty());
        assert!(console.diagnostics.is_empty());
    }

    #[test]
    fn quiet_accepts_unprintable_returns() {
        let command = Command::quiet("makeUnprintable", make_unprintable).build().unwrap();
        assert!(call(&command, &[ArgSlot::Int(1)]).lines.is_empty());
    }

    #[test]
    fn function_specific_printer() {
        let command = Command::new("shortPlusOne", short_plus_one)
            .printer(|value: &i16, out: &mut dyn fmt::Write| {
                write!(out, "result is {}", if *value == 4 { "four" } else { "other" })
            })
            .build()
            .unwrap();
        assert_eq!(call(&command, &[ArgSlot::Int(3)]).lines, vec!["result is four"]);
    }

    #[test]
    fn opaque_type_prints_fallback() {
        let command = Command::new("makeOpaque", make_opaque).build().unwrap();
        assert_eq!(call(&command, &[ArgSlot::Int(1)]).lines, vec!["no print format available"]);
    }

    #[test]
    fn commands_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Command>();
    }

    #[test]
    fn quieted_registration_keeps_return_kind() {
        let command = Command::new("shortPlusOne", short_plus_one).quiet().build().unwrap();
        assert!(command.is_quiet());
        assert_eq!(
            command.signature().returns,
            ReturnKind::Value(ParameterKind::Int { bits: 16, signed: true })
        );
        let console = call(&command, &[ArgSlot::Int(3)]);
        assert!(console.lines.is_empty());
        assert!(console.diagnostics.is_empty());
    }

    fn last_word(text: &mut String) -> &mut String {
        if let Some(space) = text.rfind(' ') {
            text.replace_range(..=space, "");
        }
        text
    }

    #[test]
    fn borrowed_return_with_custom_printer() {
        let command = Command::new("lastWord", last_word)
            .printer(|word: &&mut String, out: &mut dyn fmt::Write| write!(out, "<{word}>"))
            .build()
            .unwrap();
        assert_eq!(
            command.signature().returns,
            ReturnKind::Value(ParameterKind::StringByValue)
        );
        let console = call(&command, &[ArgSlot::String(Some(c"one two"))]);
        assert_eq!(console.lines, vec!["<two>", "arg[0]: two"]);
    }

    #[test]
    fn surplus_help_still_builds() {
        let command = Command::new("shortPlusOne", short_plus_one)
            .help(&["value", "unused"])
            .build()
            .unwrap();
        assert_eq!(command.descriptor().usage(), "shortPlusOne value");
    }
}
