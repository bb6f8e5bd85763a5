//! Return values of wrapped functions.
//!
//! A function may return a value it owns or a reference into memory the
//! call's [`Context`](crate::Context) owns, such as the `String` behind a
//! `&mut String` parameter:
//!
//! ```
//! use iocsh_wrap_core::{ArgBuf, ArgSlot, BufferConsole, Command};
//!
//! fn shout(text: &mut String) -> &mut String {
//!     text.make_ascii_uppercase();
//!     text
//! }
//!
//! let command = Command::new("shout", shout).build().unwrap();
//! let mut console = BufferConsole::new();
//! command.call(&ArgBuf::new(&[ArgSlot::String(Some(c"hey"))]), &mut console);
//! assert_eq!(console.lines, vec!["HEY", "arg[0]: HEY"]);
//! ```
//!
//! [`Ret`] mirrors [`Arg`](crate::Arg): the `'static` form names the type in
//! the function's marker, and [`Ret::Item`] is what the function actually
//! returns for one call. Borrowed returns are printed before the context is
//! torn down.

use std::marker::PhantomData;

/// A return type, possibly borrowing from the call's context.
pub trait Ret: 'static {
    /// The value returned by a call whose context lives for `'c`.
    type Item<'c>;
}

/// The value a call of `R` returns.
pub type RetItem<'c, R> = <R as Ret>::Item<'c>;

/// Marks a return value that borrows nothing.
pub struct Owned<T>(PhantomData<fn() -> T>);

impl<T: 'static> Ret for Owned<T> {
    type Item<'c> = T;
}

impl<T: ?Sized + 'static> Ret for &'static T {
    type Item<'c> = &'c T;
}

impl<T: ?Sized + 'static> Ret for &'static mut T {
    type Item<'c> = &'c mut T;
}

impl<T: ?Sized + 'static> Ret for Option<&'static T> {
    type Item<'c> = Option<&'c T>;
}

impl<T: ?Sized + 'static> Ret for Option<&'static mut T> {
    type Item<'c> = Option<&'c mut T>;
}
