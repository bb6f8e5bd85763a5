//! Arity-generic native functions.
//!
//! [`NativeFunction`] is implemented for every `Fn` of arity 0 to
//! [`MAX_ARITY`](crate::MAX_ARITY) whose parameters all implement [`Arg`].
//! The `Marker` parameter is the function's signature as a `fn` pointer type;
//! it only exists to keep the per-arity impls apart and is inferred.
//!
//! Functions returning an owned value get `Output = Owned<Out>`. Functions
//! returning a reference tied to one of their arguments, like
//! `fn(&mut String) -> &mut String`, use the [`BorrowsContext`] marker and
//! report the reference type itself as `Output`.

use crate::context::Context;
use crate::convert::{Arg, ArgItem};
use crate::error::CallError;
use crate::kind::ParamType;
use crate::ret::{Owned, Ret, RetItem};
use crate::slot::ArgBuf;

/// A function that can be wrapped as a shell command.
pub trait NativeFunction<Marker>: Copy + Send + Sync + 'static {
    type Output: Ret;

    /// Classification of every parameter, in order.
    fn parameters() -> Vec<ParamType>;

    /// Convert every argument, then call the function.
    ///
    /// Conversion stops at the first failing argument and the function is
    /// not called. A panic in the function propagates to the caller.
    fn invoke<'c>(&self, args: &ArgBuf<'c>, ctx: &'c Context) -> Result<RetItem<'c, Self::Output>, CallError>;
}

/// Marker for functions whose return value borrows from their arguments.
#[derive(Debug, Clone, Copy)]
pub struct BorrowsContext;

impl<Func, Out> NativeFunction<fn() -> Out> for Func
where
    Func: Fn() -> Out + Copy + Send + Sync + 'static,
    Out: 'static,
{
    type Output = Owned<Out>;

    fn parameters() -> Vec<ParamType> {
        Vec::new()
    }

    fn invoke<'c>(&self, _args: &ArgBuf<'c>, _ctx: &'c Context) -> Result<RetItem<'c, Owned<Out>>, CallError> {
        Ok(self())
    }
}

macro_rules! impl_native_function {
    ($($param:ident $index:tt),+) => {
        #[allow(non_snake_case)]
        impl<Func, Out, $($param),+> NativeFunction<fn($($param),+) -> Out> for Func
        where
            Func: Copy + Send + Sync + 'static,
            Func: Fn($($param),+) -> Out + for<'c> Fn($(ArgItem<'c, $param>),+) -> Out,
            Out: 'static,
            $($param: Arg,)+
        {
            type Output = Owned<Out>;

            fn parameters() -> Vec<ParamType> {
                vec![$(<$param as Arg>::PARAM),+]
            }

            fn invoke<'c>(&self, args: &ArgBuf<'c>, ctx: &'c Context) -> Result<RetItem<'c, Owned<Out>>, CallError> {
                impl_native_function!(@call self, args, ctx; $($param $index),+)
            }
        }

        #[allow(non_snake_case)]
        impl<Func, Out, $($param),+> NativeFunction<(BorrowsContext, fn($($param),+) -> Out)> for Func
        where
            Func: Copy + Send + Sync + 'static,
            Func: Fn($($param),+) -> Out + for<'c> Fn($(ArgItem<'c, $param>),+) -> RetItem<'c, Out>,
            $($param: Arg,)+
            Out: Ret,
        {
            type Output = Out;

            fn parameters() -> Vec<ParamType> {
                vec![$(<$param as Arg>::PARAM),+]
            }

            fn invoke<'c>(&self, args: &ArgBuf<'c>, ctx: &'c Context) -> Result<RetItem<'c, Out>, CallError> {
                impl_native_function!(@call self, args, ctx; $($param $index),+)
            }
        }
    };
    (@call $func:ident, $args:ident, $ctx:ident; $($param:ident $index:tt),+) => {{
        // Without this helper rustc cannot pick between the two `Fn`
        // bounds when calling `self` with converted items.
        fn call_inner<Out, $($param),+>(func: impl Fn($($param),+) -> Out, $($param: $param),+) -> Out {
            func($($param),+)
        }

        $(
            let $param = $args
                .slot($index)
                .and_then(|slot| <$param as Arg>::convert(slot, $ctx, $index))
                .map_err(|source| CallError::Conversion { index: $index, source })?;
        )+
        Ok(call_inner($func, $($param),+))
    }};
}

impl_native_function!(A0 0);
impl_native_function!(A0 0, A1 1);
impl_native_function!(A0 0, A1 1, A2 2);
impl_native_function!(A0 0, A1 1, A2 2, A3 3);
impl_native_function!(A0 0, A1 1, A2 2, A3 3, A4 4);
impl_native_function!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_native_function!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_native_function!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);
impl_native_function!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8);
impl_native_function!(A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7, A8 8, A9 9);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConversionError;
    use crate::kind::ParameterKind;
    use crate::slot::ArgSlot;
    use std::cell::RefCell;

    fn invoke<F, M, R>(func: F, slots: &[ArgSlot<'_>]) -> Result<R, CallError>
    where
        F: NativeFunction<M, Output = Owned<R>>,
        R: 'static,
    {
        let ctx = Context::new();
        func.invoke(&ArgBuf::new(slots), &ctx)
    }

    fn params<F: NativeFunction<M>, M>(_: F) -> Vec<ParamType> {
        F::parameters()
    }

    fn add(a: i32, b: i32) -> i32 {
        a + b
    }

    #[allow(clippy::too_many_arguments)]
    fn ten(a: i8, b: i16, c: i32, d: i64, e: u8, f: u16, g: u32, h: u64, i: f32, j: f64) -> f64 {
        f64::from(a) + f64::from(b) + f64::from(c) + d as f64 + f64::from(e)
            + f64::from(f) + f64::from(g) + h as f64 + f64::from(i) + j
    }

    fn append(s: &mut String, suffix: &str) -> usize {
        s.push_str(suffix);
        s.len()
    }

    #[test]
    fn zero_arity() {
        fn answer() -> i32 {
            42
        }
        assert!(params(answer).is_empty());
        assert_eq!(invoke(answer, &[]), Ok(42));
    }

    #[test]
    fn two_ints() {
        assert_eq!(invoke(add, &[ArgSlot::Int(2), ArgSlot::Int(3)]), Ok(5));
        assert_eq!(params(add).len(), 2);
    }

    #[test]
    fn ten_arguments() {
        let slots: Vec<ArgSlot<'_>> = (0..8)
            .map(ArgSlot::Int)
            .chain([ArgSlot::Double(8.0), ArgSlot::Double(9.0)])
            .collect();
        assert_eq!(invoke(ten, &slots), Ok(45.0));
        assert_eq!(params(ten).len(), crate::MAX_ARITY);
    }

    #[test]
    fn references_into_the_context() {
        assert_eq!(
            invoke(append, &[ArgSlot::String(Some(c"ab")), ArgSlot::String(Some(c"cd"))]),
            Ok(4)
        );
        let kinds: Vec<_> = params(append).into_iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![ParameterKind::StringByRef, ParameterKind::CString { mutable: false }]
        );
    }

    #[test]
    fn closures_without_captures() {
        let negate = |v: f64| -v;
        assert_eq!(invoke(negate, &[ArgSlot::Double(1.5)]), Ok(-1.5));
    }

    #[test]
    fn conversion_failure_names_the_index() {
        let err = invoke(add, &[ArgSlot::Int(1), ArgSlot::Double(2.0)]).unwrap_err();
        assert_eq!(
            err,
            CallError::Conversion {
                index: 1,
                source: ConversionError::TypeMismatch {
                    expected: "int",
                    actual: "double"
                }
            }
        );
    }

    #[test]
    fn missing_slot() {
        let err = invoke(add, &[ArgSlot::Int(1)]).unwrap_err();
        assert!(matches!(
            err,
            CallError::Conversion {
                index: 1,
                source: ConversionError::MissingSlot { index: 1, count: 1 }
            }
        ));
    }

    thread_local! {
        static SEEN: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    fn record(a: &str, b: i32) {
        SEEN.with(|seen| seen.borrow_mut().push(format!("{a}:{b}")));
    }

    #[test]
    fn function_not_called_after_failed_conversion() {
        SEEN.with(|seen| seen.borrow_mut().clear());
        assert!(invoke(record, &[ArgSlot::String(Some(c"x")), ArgSlot::String(None)]).is_err());
        assert!(SEEN.with(|seen| seen.borrow().is_empty()));
        assert!(invoke(record, &[ArgSlot::String(Some(c"x")), ArgSlot::Int(4)]).is_ok());
        assert_eq!(SEEN.with(|seen| seen.borrow().clone()), vec!["x:4"]);
    }

    fn longest<'a>(text: &'a mut String, other: &str) -> &'a mut String {
        if other.len() > text.len() {
            text.clear();
            text.push_str(other);
        }
        text
    }

    fn find(value: &i16) -> Option<&i16> {
        (*value != 0).then_some(value)
    }

    #[test]
    fn returned_references_borrow_the_context() {
        let ctx = Context::new();
        let slots = [ArgSlot::String(Some(c"ab")), ArgSlot::String(Some(c"xyz"))];
        let result = longest.invoke(&ArgBuf::new(&slots), &ctx).unwrap();
        assert_eq!(result.as_str(), "xyz");
        result.push('!');
        assert_eq!(params(longest).len(), 2);

        let ctx = Context::new();
        let found = find.invoke(&ArgBuf::new(&[ArgSlot::Int(7)]), &ctx).unwrap();
        assert_eq!(found, Some(&7));
        let ctx = Context::new();
        let missing = find.invoke(&ArgBuf::new(&[ArgSlot::Int(0)]), &ctx).unwrap();
        assert_eq!(missing, None);
    }
}
