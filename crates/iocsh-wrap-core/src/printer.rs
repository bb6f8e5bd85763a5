//! Result and mutable-argument printing.
//!
//! Printing is type directed. Each return type implements [`PrintResult`];
//! the built-in impls route through one format table keyed by
//! [`ParameterKind`], so every integer prints as decimal plus its bit pattern,
//! every float in its shortest form, and so on. Types with no category fall
//! back to a fixed "no print format available" line. `()` reports
//! [`ReturnKind::Void`], which makes void functions structurally silent.
//!
//! [`PrintReturn`] lifts `PrintResult` to a function's [`Ret`] output, so a
//! returned `&mut String` prints the same way a returned `String` does.

use std::ffi::{CStr, CString, c_char};
use std::fmt::{self, Write as _};

use crate::complex::Complex;
use crate::context::Context;
use crate::kind::{ParameterKind, ReturnKind};
use crate::ret::{Owned, Ret, RetItem};

/// Printed for values whose category has no format.
pub const NO_PRINT_FORMAT: &str = "no print format available";

/// Printed for null strings.
pub const NULL_STRING: &str = "(null)";

// ============================================================================
// Console
// ============================================================================

/// The host's output and diagnostic channels.
pub trait Console {
    /// Normal command output (results and mutated arguments).
    fn print_line(&mut self, line: &str);

    /// One diagnostic line (conversion failures, caught panics).
    fn report(&mut self, message: &str);
}

/// Writes output to stdout and diagnostics to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn print_line(&mut self, line: &str) {
        println!("{line}");
    }

    fn report(&mut self, message: &str) {
        eprintln!("{message}");
    }
}

/// Collects everything in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BufferConsole {
    pub lines: Vec<String>,
    pub diagnostics: Vec<String>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.diagnostics.clear();
    }
}

impl Console for BufferConsole {
    fn print_line(&mut self, line: &str) {
        self.lines.push(line.to_owned());
    }

    fn report(&mut self, message: &str) {
        self.diagnostics.push(message.to_owned());
    }
}

// ============================================================================
// Format table
// ============================================================================

/// One piece of a category's print format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `42`
    Decimal,
    /// ` (0x2a)`, the bit pattern at the declared width
    Hex,
    /// Shortest round-trip float form.
    General,
    /// String contents or `(null)`.
    Text,
    /// `re J im`
    ComplexPair,
}

/// A value reduced to what the format table understands.
///
/// Floats stay behind `Display` so `f32` prints without widening noise.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    Int(i128),
    Float(&'a dyn fmt::Display),
    Text(Option<&'a str>),
    Complex {
        re: &'a dyn fmt::Display,
        im: &'a dyn fmt::Display,
    },
}

/// The format sequence for a category; empty when it has none.
pub const fn formats(kind: &ParameterKind) -> &'static [Format] {
    match kind {
        ParameterKind::Int { .. } => &[Format::Decimal, Format::Hex],
        ParameterKind::Float { .. } => &[Format::General],
        ParameterKind::StringByValue
        | ParameterKind::StringByRef
        | ParameterKind::StringPtr { .. }
        | ParameterKind::CString { .. } => &[Format::Text],
        ParameterKind::Complex { .. } => &[Format::ComplexPair],
        ParameterKind::UserDefined { .. } => &[],
    }
}

/// Write `value` using the formats of `kind`.
pub fn write_value(out: &mut dyn fmt::Write, kind: &ParameterKind, value: Value<'_>) -> fmt::Result {
    let formats = formats(kind);
    if formats.is_empty() {
        return out.write_str(NO_PRINT_FORMAT);
    }
    for format in formats {
        match (format, value) {
            (Format::Decimal, Value::Int(v)) => write!(out, "{v}")?,
            (Format::Hex, Value::Int(v)) => write!(out, " (0x{:x})", bit_pattern(kind, v))?,
            (Format::General, Value::Float(v)) => write!(out, "{v}")?,
            (Format::Text, Value::Text(s)) => out.write_str(s.unwrap_or(NULL_STRING))?,
            (Format::ComplexPair, Value::Complex { re, im }) => write!(out, "{re} J {im}")?,
            _ => return out.write_str(NO_PRINT_FORMAT),
        }
    }
    Ok(())
}

fn bit_pattern(kind: &ParameterKind, value: i128) -> u128 {
    match *kind {
        ParameterKind::Int { bits, .. } if bits < 128 => (value as u128) & ((1_u128 << bits) - 1),
        _ => value as u128,
    }
}

// ============================================================================
// PrintResult
// ============================================================================

/// How a value returned from (or passed by reference to) a command prints.
///
/// The default `print` writes [`NO_PRINT_FORMAT`], so a user type only needs
/// an empty impl to be usable:
///
/// ```
/// use iocsh_wrap_core::PrintResult;
///
/// struct Handle(u32);
/// impl PrintResult for Handle {}
///
/// let mut out = String::new();
/// Handle(3).print(&mut out).unwrap();
/// assert_eq!(out, "no print format available");
/// ```
pub trait PrintResult {
    /// Category reported in the command signature.
    const RETURN_KIND: ReturnKind = ReturnKind::Opaque;

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(NO_PRINT_FORMAT)
    }
}

impl PrintResult for () {
    const RETURN_KIND: ReturnKind = ReturnKind::Void;

    fn print(&self, _out: &mut dyn fmt::Write) -> fmt::Result {
        Ok(())
    }
}

macro_rules! impl_print_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PrintResult for $ty {
                const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::Int {
                    bits: <$ty>::BITS,
                    signed: <$ty>::MIN != 0,
                });

                fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
                    if let ReturnKind::Value(kind) = Self::RETURN_KIND {
                        write_value(out, &kind, Value::Int(*self as i128))
                    } else {
                        out.write_str(NO_PRINT_FORMAT)
                    }
                }
            }
        )*
    };
}

impl_print_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl PrintResult for bool {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::BOOL);

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write_value(out, &ParameterKind::BOOL, Value::Int(i128::from(*self)))
    }
}

macro_rules! impl_print_float {
    ($($ty:ty => $bits:expr),* $(,)?) => {
        $(
            impl PrintResult for $ty {
                const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::Float { bits: $bits });

                fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
                    write_value(out, &ParameterKind::Float { bits: $bits }, Value::Float(self))
                }
            }

            impl PrintResult for Complex<$ty> {
                const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::Complex { bits: $bits });

                fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
                    let value = Value::Complex {
                        re: &self.re,
                        im: &self.im,
                    };
                    write_value(out, &ParameterKind::Complex { bits: $bits }, value)
                }
            }
        )*
    };
}

impl_print_float!(f32 => 32, f64 => 64);

impl PrintResult for str {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::CString { mutable: false });

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write_value(out, &ParameterKind::CString { mutable: false }, Value::Text(Some(self)))
    }
}

impl PrintResult for String {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::StringByValue);

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write_value(out, &ParameterKind::StringByValue, Value::Text(Some(self)))
    }
}

impl PrintResult for CStr {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::CString { mutable: false });

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(&self.to_string_lossy())
    }
}

impl PrintResult for CString {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::CString { mutable: false });

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.as_c_str().print(out)
    }
}

/// Prints the pointee up to its NUL, or `(null)`.
///
/// The pointer must be null or point at a NUL-terminated string that is still
/// alive when printed, the same contract the shell relies on.
impl PrintResult for *const c_char {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::CString { mutable: false });

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        if self.is_null() {
            return out.write_str(NULL_STRING);
        }
        // SAFETY: non-null C string returned by the wrapped function.
        unsafe { CStr::from_ptr(*self) }.print(out)
    }
}

impl PrintResult for *mut c_char {
    const RETURN_KIND: ReturnKind = ReturnKind::Value(ParameterKind::CString { mutable: true });

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.cast_const().print(out)
    }
}

impl<T: PrintResult + ?Sized> PrintResult for &T {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        (**self).print(out)
    }
}

impl<T: PrintResult> PrintResult for Option<T> {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Some(value) => value.print(out),
            None => out.write_str(NULL_STRING),
        }
    }
}

impl<T: PrintResult + ?Sized> PrintResult for Box<T> {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        (**self).print(out)
    }
}

// ============================================================================
// PrintReturn
// ============================================================================

/// How a function's [`Ret`] output prints.
pub trait PrintReturn: Ret {
    const RETURN_KIND: ReturnKind;

    fn print_item(item: &Self::Item<'_>, out: &mut dyn fmt::Write) -> fmt::Result;
}

impl<T: PrintResult + 'static> PrintReturn for Owned<T> {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print_item(item: &Self::Item<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        item.print(out)
    }
}

impl<T: PrintResult + ?Sized + 'static> PrintReturn for &'static T {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print_item(item: &Self::Item<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        (**item).print(out)
    }
}

impl<T: PrintResult + ?Sized + 'static> PrintReturn for &'static mut T {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print_item(item: &Self::Item<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        (**item).print(out)
    }
}

impl<T: PrintResult + ?Sized + 'static> PrintReturn for Option<&'static T> {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print_item(item: &Self::Item<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        match item {
            Some(value) => (**value).print(out),
            None => out.write_str(NULL_STRING),
        }
    }
}

impl<T: PrintResult + ?Sized + 'static> PrintReturn for Option<&'static mut T> {
    const RETURN_KIND: ReturnKind = T::RETURN_KIND;

    fn print_item(item: &Self::Item<'_>, out: &mut dyn fmt::Write) -> fmt::Result {
        match item {
            Some(value) => (**value).print(out),
            None => out.write_str(NULL_STRING),
        }
    }
}

// ============================================================================
// ResultPrinter
// ============================================================================

type ItemPrintFn<R> = dyn for<'c> Fn(&RetItem<'c, R>, &mut dyn fmt::Write) -> fmt::Result + Send + Sync;

/// The printer chosen for one registered function.
pub enum ResultPrinter<R: Ret> {
    /// Nothing is printed: void returns and quiet registrations.
    Silent,
    /// The return type's own [`PrintReturn`] impl.
    Default(Box<ItemPrintFn<R>>),
    /// A function-specific override.
    Custom(Box<ItemPrintFn<R>>),
}

impl<R: Ret> ResultPrinter<R> {
    /// The type's default printer, or `Silent` for void returns.
    pub fn for_type() -> Self
    where
        R: PrintReturn,
    {
        if matches!(R::RETURN_KIND, ReturnKind::Void) {
            return Self::Silent;
        }
        let printer: Box<ItemPrintFn<R>> = Box::new(|item, out| R::print_item(item, out));
        Self::Default(printer)
    }

    pub fn custom<F>(printer: F) -> Self
    where
        F: for<'c> Fn(&RetItem<'c, R>, &mut dyn fmt::Write) -> fmt::Result + Send + Sync + 'static,
    {
        Self::Custom(Box::new(printer))
    }

    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Silent)
    }

    /// Print `value` as one output line.
    pub fn print(&self, value: &RetItem<'_, R>, console: &mut dyn Console) {
        let mut line = String::new();
        let written = match self {
            Self::Silent => return,
            Self::Default(printer) | Self::Custom(printer) => printer(value, &mut line),
        };
        match written {
            Ok(()) => console.print_line(&line),
            Err(fmt::Error) => console.report("failed to format the result"),
        }
    }
}

impl<R: Ret> fmt::Debug for ResultPrinter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Silent => "Silent",
            Self::Default(_) => "Default",
            Self::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

/// Report every mutable argument as `arg[i]: <value>`, in parameter order.
pub fn print_mutable_arguments(ctx: &mut Context, console: &mut dyn Console) {
    for (param, value) in ctx.mutable_arguments() {
        let mut line = String::new();
        let written = write!(line, "arg[{param}]: ").and_then(|()| value.print_temporary(&mut line));
        match written {
            Ok(()) => console.print_line(&line),
            Err(fmt::Error) => console.report(&format!("failed to format argument {param}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed<T: PrintResult + ?Sized>(value: &T) -> String {
        let mut out = String::new();
        value.print(&mut out).unwrap();
        out
    }

    #[test]
    fn integers_print_decimal_and_bit_pattern() {
        assert_eq!(printed(&42_i32), "42 (0x2a)");
        assert_eq!(printed(&-3_i16), "-3 (0xfffd)");
        assert_eq!(printed(&-1_i8), "-1 (0xff)");
        assert_eq!(printed(&-1_i64), "-1 (0xffffffffffffffff)");
        assert_eq!(printed(&u64::MAX), "18446744073709551615 (0xffffffffffffffff)");
        assert_eq!(printed(&true), "1 (0x1)");
        assert_eq!(printed(&false), "0 (0x0)");
    }

    #[test]
    fn floats_print_shortest_form() {
        assert_eq!(printed(&1.234_f32), "1.234");
        assert_eq!(printed(&5.678_f64), "5.678");
    }

    #[test]
    fn strings_and_nulls() {
        assert_eq!(printed("hello"), "hello");
        assert_eq!(printed(&String::from("abc")), "abc");
        assert_eq!(printed(&None::<String>), "(null)");
        assert_eq!(printed(&std::ptr::null::<c_char>()), "(null)");
        assert_eq!(printed(&c"raw".as_ptr()), "raw");
    }

    #[test]
    fn complex_uses_upper_case_separator() {
        assert_eq!(printed(&Complex::new(1.5_f64, -2.0)), "1.5 J -2");
    }

    #[test]
    fn format_table() {
        assert_eq!(
            formats(&ParameterKind::Int { bits: 8, signed: true }),
            &[Format::Decimal, Format::Hex]
        );
        assert!(formats(&ParameterKind::UserDefined {
            tag: "T",
            arg_type: crate::ArgType::Int
        })
        .is_empty());
        let mut out = String::new();
        write_value(&mut out, &ParameterKind::Float { bits: 64 }, Value::Int(1)).unwrap();
        assert_eq!(out, NO_PRINT_FORMAT);
    }

    #[test]
    fn unit_is_silent() {
        assert!(ResultPrinter::<Owned<()>>::for_type().is_silent());
        assert!(!ResultPrinter::<Owned<i32>>::for_type().is_silent());
        assert!(!ResultPrinter::<&'static mut String>::for_type().is_silent());
    }

    #[test]
    fn result_printer_emits_one_line() {
        let mut console = BufferConsole::new();
        ResultPrinter::<Owned<i32>>::for_type().print(&7, &mut console);
        ResultPrinter::<Owned<()>>::for_type().print(&(), &mut console);
        assert_eq!(console.lines, vec!["7 (0x7)"]);
        assert!(console.diagnostics.is_empty());
    }

    #[test]
    fn custom_printer_overrides_type() {
        let printer = ResultPrinter::<Owned<i32>>::custom(|v: &i32, out: &mut dyn fmt::Write| write!(out, "custom {v}"));
        let mut console = BufferConsole::new();
        printer.print(&3, &mut console);
        assert_eq!(console.lines, vec!["custom 3"]);
    }

    #[test]
    fn mutable_arguments_report() {
        let mut ctx = Context::new();
        ctx.make(86_i16, true, Some(1));
        ctx.make(String::from("kept"), false, Some(0));
        ctx.make(String::from("changed"), true, Some(2));
        let mut console = BufferConsole::new();
        print_mutable_arguments(&mut ctx, &mut console);
        assert_eq!(console.lines, vec!["arg[1]: 86 (0x56)", "arg[2]: changed"]);
    }

    #[test]
    fn return_kinds() {
        assert_eq!(<() as PrintResult>::RETURN_KIND, ReturnKind::Void);
        assert_eq!(
            <u16 as PrintResult>::RETURN_KIND,
            ReturnKind::Value(ParameterKind::Int { bits: 16, signed: false })
        );
        assert_eq!(<&str as PrintResult>::RETURN_KIND, <str as PrintResult>::RETURN_KIND);
    }

    #[test]
    fn borrowed_returns_print_their_target() {
        let mut text = String::from("kept");
        let mut console = BufferConsole::new();
        ResultPrinter::<&'static mut String>::for_type().print(&&mut text, &mut console);
        ResultPrinter::<&'static i16>::for_type().print(&&-2_i16, &mut console);
        ResultPrinter::<Option<&'static String>>::for_type().print(&None, &mut console);
        assert_eq!(console.lines, vec!["kept", "-2 (0xfffe)", "(null)"]);
        assert_eq!(
            <&'static mut String as PrintReturn>::RETURN_KIND,
            <Owned<String> as PrintReturn>::RETURN_KIND
        );
    }
}
