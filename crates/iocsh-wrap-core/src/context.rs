//! Per-call owner of converted temporaries.
//!
//! Arguments that the wrapped function receives by reference or pointer need
//! backing storage that outlives the conversion step but not the call. The
//! [`Context`] allocates that storage in a bump arena, remembers which
//! parameter each temporary belongs to, and drops every temporary exactly
//! once when the call finishes, whether it completed, aborted or panicked.

use std::cell::RefCell;
use std::fmt;
use std::ptr::{self, NonNull};

use bumpalo::Bump;
use rustc_hash::FxHashMap;

use crate::printer::PrintResult;

/// A value that can live in a [`Context`].
///
/// Implemented for every [`PrintResult`] type, so the mutable-argument report
/// can print any temporary it finds.
pub trait Temporary: 'static {
    fn print_temporary(&self, out: &mut dyn fmt::Write) -> fmt::Result;
}

impl<T: PrintResult + 'static> Temporary for T {
    fn print_temporary(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        self.print(out)
    }
}

struct Entry {
    value: NonNull<dyn Temporary>,
    mutable: bool,
    param: Option<usize>,
}

/// A borrowed view of one temporary.
#[derive(Clone, Copy)]
pub struct TemporaryRef<'a> {
    pub value: &'a dyn Temporary,
    pub mutable: bool,
    pub param: Option<usize>,
}

impl fmt::Debug for TemporaryRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = String::new();
        let _ = self.value.print_temporary(&mut value);
        f.debug_struct("TemporaryRef")
            .field("value", &value)
            .field("mutable", &self.mutable)
            .field("param", &self.param)
            .finish()
    }
}

/// Arena for the temporaries of a single call.
#[derive(Default)]
pub struct Context {
    arena: Bump,
    entries: RefCell<Vec<Entry>>,
    params: RefCell<FxHashMap<usize, usize>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `value` into the arena and hand back a reference to it.
    ///
    /// `param` links the temporary to the parameter it backs; each parameter
    /// index may be recorded once per context.
    #[allow(clippy::mut_from_ref)]
    pub fn make<T: Temporary>(&self, value: T, mutable: bool, param: Option<usize>) -> &mut T {
        let mut slot = NonNull::from(self.arena.alloc(value));
        let value: NonNull<dyn Temporary> = slot;

        let mut entries = self.entries.borrow_mut();
        if let Some(index) = param {
            let previous = self.params.borrow_mut().insert(index, entries.len());
            debug_assert!(previous.is_none(), "parameter {index} recorded twice");
        }
        entries.push(Entry {
            value,
            mutable,
            param,
        });

        // SAFETY: the allocation is fresh and owned by this context until it
        // drops. The stored entry pointer is only dereferenced through
        // `&mut self`, which cannot coexist with the borrow returned here.
        unsafe { slot.as_mut() }
    }

    /// Number of temporaries created so far.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The temporary backing parameter `index`, if one was created.
    pub fn get_by_param_index(&mut self, index: usize) -> Option<TemporaryRef<'_>> {
        let position = *self.params.get_mut().get(&index)?;
        self.entries.get_mut().get(position).map(Self::view)
    }

    /// Every temporary in creation order.
    pub fn temporaries(&mut self) -> impl Iterator<Item = TemporaryRef<'_>> {
        self.entries.get_mut().iter().map(Self::view)
    }

    /// Mutable temporaries linked to a parameter, in parameter order.
    pub fn mutable_arguments(&mut self) -> Vec<(usize, &dyn Temporary)> {
        let entries = self.entries.get_mut();
        let mut found: Vec<(usize, &dyn Temporary)> = self
            .params
            .get_mut()
            .iter()
            .filter_map(|(&param, &position)| {
                let entry = &entries[position];
                // SAFETY: see `view`.
                entry
                    .mutable
                    .then(|| (param, unsafe { entry.value.as_ref() }))
            })
            .collect();
        found.sort_unstable_by_key(|(param, _)| *param);
        found
    }

    fn view(entry: &Entry) -> TemporaryRef<'_> {
        TemporaryRef {
            // SAFETY: callers hold `&mut Context`, so no reference returned
            // by `make` is still live, and the arena outlives the borrow.
            value: unsafe { entry.value.as_ref() },
            mutable: entry.mutable,
            param: entry.param,
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        for entry in self.entries.get_mut().drain(..) {
            // SAFETY: each entry points at a distinct live arena allocation
            // and is dropped exactly once here; the arena frees the memory
            // afterwards without running destructors.
            unsafe { ptr::drop_in_place(entry.value.as_ptr()) };
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("temporaries", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use std::cell::Cell;

    struct Tracked(Rc<Cell<usize>>);

    impl PrintResult for Tracked {}

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn printed(value: &dyn Temporary) -> String {
        let mut out = String::new();
        value.print_temporary(&mut out).unwrap();
        out
    }

    #[test]
    fn make_returns_usable_reference() {
        let ctx = Context::new();
        let a = ctx.make(5_i32, true, Some(0));
        let b = ctx.make(String::from("x"), false, Some(1));
        *a += 1;
        b.push('y');
        assert_eq!(*a, 6);
        assert_eq!(b, "xy");
        assert_eq!(ctx.len(), 2);
    }

    #[test]
    fn entries_keep_creation_order() {
        let mut ctx = Context::new();
        ctx.make(1_i32, false, Some(2));
        ctx.make(2_i32, false, None);
        ctx.make(3_i32, true, Some(0));
        let params: Vec<_> = ctx.temporaries().map(|t| t.param).collect();
        assert_eq!(params, vec![Some(2), None, Some(0)]);
    }

    #[test]
    fn lookup_by_param_index() {
        let mut ctx = Context::new();
        ctx.make(10_i16, true, Some(3));
        let found = ctx.get_by_param_index(3).unwrap();
        assert!(found.mutable);
        assert_eq!(printed(found.value), "10 (0xa)");
        assert!(ctx.get_by_param_index(0).is_none());
    }

    #[test]
    fn mutable_arguments_sorted_and_filtered() {
        let mut ctx = Context::new();
        ctx.make(7_i32, true, Some(4));
        ctx.make(8_i32, false, Some(1));
        ctx.make(9_i32, true, Some(2));
        ctx.make(11_i32, true, None);
        let args: Vec<_> = ctx
            .mutable_arguments()
            .into_iter()
            .map(|(param, value)| (param, printed(value)))
            .collect();
        assert_eq!(
            args,
            vec![(2, "9 (0x9)".to_string()), (4, "7 (0x7)".to_string())]
        );
    }

    #[test]
    fn drop_releases_every_temporary_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let ctx = Context::new();
            for i in 0..5 {
                ctx.make(Tracked(drops.clone()), i % 2 == 0, Some(i));
            }
            ctx.make(Tracked(drops.clone()), false, None);
            assert_eq!(drops.get(), 0);
        }
        assert_eq!(drops.get(), 6);
    }

    #[test]
    fn empty_context() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());
        assert!(ctx.mutable_arguments().is_empty());
    }
}
