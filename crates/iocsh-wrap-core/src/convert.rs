//! Slot to native argument conversion.
//!
//! [`Arg`] is implemented once per supported parameter type. The impl both
//! classifies the type (`PARAM`) and converts a host slot into the value the
//! wrapped function receives. Conversions that need backing storage (every
//! reference, every scalar pointer, duplicated C strings) place it in the
//! call's [`Context`] under the parameter's index, so the storage outlives
//! the call and mutations can be reported afterwards.
//!
//! ## Supported parameter types
//!
//! - Integers: `bool`, `i8`..`i64`, `u8`..`u64`, `isize`, `usize`, by value,
//!   by `&`/`&mut` and (except the `c_char`-sized ones) by `*const`/`*mut`
//! - Floats: `f32`, `f64`, same forms
//! - Strings: `String`, `&String`, `&mut String`, `Option<&String>`,
//!   `Option<&mut String>`, `&str`, `Option<&str>`, `&CStr`, `Option<&CStr>`,
//!   `*const c_char`, `*mut c_char`
//! - Complex: `Complex<f32>`, `Complex<f64>`, by value, `&` and `&mut`
//!
//! A user type is supported by implementing `Arg` for it (or for a reference
//! to it) with a [`ParameterKind::UserDefined`] kind.

use std::ffi::{CStr, c_char};
use std::fmt;
use std::ptr;

use crate::complex::Complex;
use crate::context::Context;
use crate::error::ConversionError;
use crate::kind::{ParamType, ParameterKind, Qualifiers};
use crate::printer::PrintResult;
use crate::slot::ArgSlot;

/// A type that can be received as a command parameter.
///
/// `Item<'c>` is the value handed to the function for a call whose context
/// lives for `'c`; for owned types it is `Self`, for references it borrows
/// from the context or the slot.
///
/// Types nobody classified cannot be wrapped:
///
/// ```compile_fail
/// use iocsh_wrap_core::Command;
///
/// struct Unknown;
/// fn takes_unknown(_: Unknown) {}
///
/// let _ = Command::new("takesUnknown", takes_unknown).build();
/// ```
pub trait Arg {
    type Item<'c>;

    /// Classification of this parameter type.
    const PARAM: ParamType;

    /// Convert the slot for parameter `index`.
    fn convert<'c>(
        slot: ArgSlot<'c>,
        ctx: &'c Context,
        index: usize,
    ) -> Result<Self::Item<'c>, ConversionError>;
}

/// The value a parameter of type `A` is converted to.
pub type ArgItem<'c, A> = <A as Arg>::Item<'c>;

const CONST_REF: Qualifiers = Qualifiers::REFERENCE.union(Qualifiers::CONST);
const CONST_PTR: Qualifiers = Qualifiers::POINTER.union(Qualifiers::CONST);

// ============================================================================
// Scalars
// ============================================================================

macro_rules! impl_arg_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Arg for $ty {
                type Item<'c> = $ty;

                const PARAM: ParamType = ParamType::value(ParameterKind::Int {
                    bits: <$ty>::BITS,
                    signed: <$ty>::MIN != 0,
                });

                fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<$ty, ConversionError> {
                    // Truncating cast, as a C-style conversion from `int`.
                    Ok(slot.int()? as $ty)
                }
            }
        )*
    };
}

impl_arg_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Arg for bool {
    type Item<'c> = bool;

    const PARAM: ParamType = ParamType::value(ParameterKind::BOOL);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<bool, ConversionError> {
        Ok(slot.int()? != 0)
    }
}

macro_rules! impl_arg_float {
    ($($ty:ty => $bits:expr),* $(,)?) => {
        $(
            impl Arg for $ty {
                type Item<'c> = $ty;

                const PARAM: ParamType = ParamType::value(ParameterKind::Float { bits: $bits });

                fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<$ty, ConversionError> {
                    Ok(slot.double()? as $ty)
                }
            }
        )*
    };
}

impl_arg_float!(f32 => 32, f64 => 64);

/// `&T` and `&mut T` for a by-value `Arg` whose value is boxed in the context.
macro_rules! impl_arg_ref {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> Arg for &'a $ty {
                type Item<'c> = &'c $ty;

                const PARAM: ParamType = <$ty as Arg>::PARAM.with(CONST_REF);

                fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<&'c $ty, ConversionError> {
                    let value = <$ty as Arg>::convert(slot, ctx, index)?;
                    Ok(ctx.make(value, false, Some(index)))
                }
            }

            impl<'a> Arg for &'a mut $ty {
                type Item<'c> = &'c mut $ty;

                const PARAM: ParamType = <$ty as Arg>::PARAM.with(Qualifiers::REFERENCE);

                fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<&'c mut $ty, ConversionError> {
                    let value = <$ty as Arg>::convert(slot, ctx, index)?;
                    Ok(ctx.make(value, true, Some(index)))
                }
            }
        )*
    };
}

impl_arg_ref!(
    bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Complex<f32>, Complex<f64>,
);

/// `*const T` and `*mut T`; `i8`/`u8` are left out because one of them is
/// `c_char`, whose pointers are strings.
macro_rules! impl_arg_ptr {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Arg for *const $ty {
                type Item<'c> = *const $ty;

                const PARAM: ParamType = <$ty as Arg>::PARAM.with(CONST_PTR);

                fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<*const $ty, ConversionError> {
                    let value = <$ty as Arg>::convert(slot, ctx, index)?;
                    Ok(ptr::from_ref(ctx.make(value, false, Some(index))))
                }
            }

            impl Arg for *mut $ty {
                type Item<'c> = *mut $ty;

                const PARAM: ParamType = <$ty as Arg>::PARAM.with(Qualifiers::POINTER);

                fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<*mut $ty, ConversionError> {
                    let value = <$ty as Arg>::convert(slot, ctx, index)?;
                    Ok(ptr::from_mut(ctx.make(value, true, Some(index))))
                }
            }
        )*
    };
}

impl_arg_ptr!(i16, i32, i64, isize, u16, u32, u64, usize, f32, f64);

// ============================================================================
// Complex
// ============================================================================

macro_rules! impl_arg_complex {
    ($($ty:ty => $bits:expr),* $(,)?) => {
        $(
            impl Arg for Complex<$ty> {
                type Item<'c> = Complex<$ty>;

                const PARAM: ParamType = ParamType::value(ParameterKind::Complex { bits: $bits });

                fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<Complex<$ty>, ConversionError> {
                    slot.text()?
                        .ok_or(ConversionError::NullString { target_type: "complex" })?
                        .parse()
                }
            }
        )*
    };
}

impl_arg_complex!(f32 => 32, f64 => 64);

// ============================================================================
// Owned strings
// ============================================================================

impl Arg for String {
    type Item<'c> = String;

    const PARAM: ParamType = ParamType::value(ParameterKind::StringByValue);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<String, ConversionError> {
        Ok(slot.text()?.unwrap_or_default().to_owned())
    }
}

impl<'a> Arg for &'a String {
    type Item<'c> = &'c String;

    const PARAM: ParamType = ParamType::new(ParameterKind::StringByRef, CONST_REF);

    fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<&'c String, ConversionError> {
        let value = String::convert(slot, ctx, index)?;
        Ok(ctx.make(value, false, Some(index)))
    }
}

impl<'a> Arg for &'a mut String {
    type Item<'c> = &'c mut String;

    const PARAM: ParamType = ParamType::new(ParameterKind::StringByRef, Qualifiers::REFERENCE);

    fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<&'c mut String, ConversionError> {
        let value = String::convert(slot, ctx, index)?;
        Ok(ctx.make(value, true, Some(index)))
    }
}

impl<'a> Arg for Option<&'a String> {
    type Item<'c> = Option<&'c String>;

    const PARAM: ParamType = ParamType::new(ParameterKind::StringPtr { is_const: true }, CONST_PTR);

    fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<Option<&'c String>, ConversionError> {
        let text = slot.text()?;
        Ok(text.map(|text| &*ctx.make(text.to_owned(), false, Some(index))))
    }
}

impl<'a> Arg for Option<&'a mut String> {
    type Item<'c> = Option<&'c mut String>;

    const PARAM: ParamType = ParamType::new(ParameterKind::StringPtr { is_const: false }, Qualifiers::POINTER);

    fn convert<'c>(
        slot: ArgSlot<'c>,
        ctx: &'c Context,
        index: usize,
    ) -> Result<Option<&'c mut String>, ConversionError> {
        let text = slot.text()?;
        Ok(text.map(|text| ctx.make(text.to_owned(), true, Some(index))))
    }
}

// ============================================================================
// Borrowed and raw C strings
// ============================================================================

const RAW_STRING: ParameterKind = ParameterKind::CString { mutable: false };

impl<'a> Arg for &'a str {
    type Item<'c> = &'c str;

    const PARAM: ParamType = ParamType::new(RAW_STRING, CONST_REF);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<&'c str, ConversionError> {
        Ok(slot.text()?.unwrap_or_default())
    }
}

impl<'a> Arg for Option<&'a str> {
    type Item<'c> = Option<&'c str>;

    const PARAM: ParamType = ParamType::new(RAW_STRING, CONST_PTR);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<Option<&'c str>, ConversionError> {
        slot.text()
    }
}

impl<'a> Arg for &'a CStr {
    type Item<'c> = &'c CStr;

    const PARAM: ParamType = ParamType::new(RAW_STRING, CONST_REF);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<&'c CStr, ConversionError> {
        Ok(slot.string()?.unwrap_or_default())
    }
}

impl<'a> Arg for Option<&'a CStr> {
    type Item<'c> = Option<&'c CStr>;

    const PARAM: ParamType = ParamType::new(RAW_STRING, CONST_PTR);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<Option<&'c CStr>, ConversionError> {
        slot.string()
    }
}

/// Passed through unchanged: no copy and no ownership.
impl Arg for *const c_char {
    type Item<'c> = *const c_char;

    const PARAM: ParamType = ParamType::new(RAW_STRING, CONST_PTR);

    fn convert<'c>(slot: ArgSlot<'c>, _ctx: &'c Context, _index: usize) -> Result<*const c_char, ConversionError> {
        Ok(slot.string()?.map_or(ptr::null(), CStr::as_ptr))
    }
}

/// Duplicated into the context so the function may write through it.
impl Arg for *mut c_char {
    type Item<'c> = *mut c_char;

    const PARAM: ParamType = ParamType::new(ParameterKind::CString { mutable: true }, Qualifiers::POINTER);

    fn convert<'c>(slot: ArgSlot<'c>, ctx: &'c Context, index: usize) -> Result<*mut c_char, ConversionError> {
        let Some(source) = slot.string()? else {
            return Ok(ptr::null_mut());
        };
        let buffer = ctx.make(CStringBuffer::from(source), true, Some(index));
        Ok(buffer.as_mut_ptr())
    }
}

/// Owned, writable copy of a C string.
pub struct CStringBuffer(Box<[u8]>);

impl CStringBuffer {
    pub fn as_mut_ptr(&mut self) -> *mut c_char {
        self.0.as_mut_ptr().cast()
    }

    /// The contents up to the first NUL, or the whole buffer if the function
    /// overwrote the terminator.
    pub fn to_string_lossy(&self) -> String {
        match CStr::from_bytes_until_nul(&self.0) {
            Ok(text) => text.to_string_lossy().into_owned(),
            Err(_) => String::from_utf8_lossy(&self.0).into_owned(),
        }
    }
}

impl From<&CStr> for CStringBuffer {
    fn from(source: &CStr) -> Self {
        Self(source.to_bytes_with_nul().into())
    }
}

impl PrintResult for CStringBuffer {
    fn print(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        out.write_str(&self.to_string_lossy())
    }
}

impl fmt::Debug for CStringBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CStringBuffer")
            .field(&self.to_string_lossy())
            .finish()
    }
}
