//! Parameter classification.
//!
//! Every Rust type accepted as a command parameter maps to exactly one
//! [`ParamType`]: a base [`ParameterKind`] plus [`Qualifiers`] recording
//! constness and indirection separately. The mapping is the `PARAM` constant
//! of the type's [`Arg`](crate::Arg) impl, so a type nobody classified is
//! rejected when the command is built rather than when it is called.
//!
//! ## Classification table
//!
//! | Rust type | Kind | Shell tag |
//! |---|---|---|
//! | `bool`, `i8`..`i64`, `u8`..`u64`, `isize`, `usize` | `Int` | `Int` |
//! | `f32`, `f64` | `Float` | `Double` |
//! | `String` | `StringByValue` | `String` |
//! | `&String`, `&mut String` | `StringByRef` | `String` |
//! | `Option<&String>`, `Option<&mut String>` | `StringPtr` | `String` |
//! | `&str`, `&CStr`, `*const c_char`, `*mut c_char` | `CString` | `String` |
//! | `Complex<f32>`, `Complex<f64>` | `Complex` | `String` |
//! | user types | `UserDefined` | declared by the impl |
//!
//! Naming and printing follow a fixed priority: a per-registration override
//! (help string or printer closure) wins over the exact type's impl, which
//! wins over the category default.

use std::borrow::Cow;

use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Argument tag understood by the shell (`iocshArgType`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum ArgType {
    Int = 0,
    Double = 1,
    String = 2,
}

impl ArgType {
    pub const fn name(self) -> &'static str {
        match self {
            ArgType::Int => "int",
            ArgType::Double => "double",
            ArgType::String => "string",
        }
    }
}

/// Base category of a parameter or return value, constness stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Integer of the given width; `bool` is a one-bit unsigned integer.
    Int { bits: u32, signed: bool },
    Float { bits: u32 },
    StringByValue,
    StringByRef,
    StringPtr { is_const: bool },
    /// Raw NUL-terminated string, duplicated when `mutable`.
    CString { mutable: bool },
    Complex { bits: u32 },
    UserDefined { tag: &'static str, arg_type: ArgType },
}

impl ParameterKind {
    pub const BOOL: Self = Self::Int {
        bits: 1,
        signed: false,
    };

    /// Shell tag for this kind.
    pub const fn arg_type(&self) -> ArgType {
        match self {
            Self::Int { .. } => ArgType::Int,
            Self::Float { .. } => ArgType::Double,
            Self::StringByValue
            | Self::StringByRef
            | Self::StringPtr { .. }
            | Self::CString { .. }
            | Self::Complex { .. } => ArgType::String,
            Self::UserDefined { arg_type, .. } => *arg_type,
        }
    }

    /// Canonical display name used when no help string is given.
    pub fn label(&self) -> Cow<'static, str> {
        let label = match *self {
            Self::Int { bits: 1, .. } => "<bool>",
            Self::Int { bits: 8, signed: true } => "<i8>",
            Self::Int { bits: 16, signed: true } => "<i16>",
            Self::Int { bits: 32, signed: true } => "<i32>",
            Self::Int { bits: 64, signed: true } => "<i64>",
            Self::Int { bits: 8, signed: false } => "<u8>",
            Self::Int { bits: 16, signed: false } => "<u16>",
            Self::Int { bits: 32, signed: false } => "<u32>",
            Self::Int { bits: 64, signed: false } => "<u64>",
            Self::Int { bits, signed } => {
                let prefix = if signed { 'i' } else { 'u' };
                return Cow::Owned(format!("<{prefix}{bits}>"));
            }
            Self::Float { bits: 32 } => "<f32>",
            Self::Float { bits: 64 } => "<f64>",
            Self::Float { bits } => return Cow::Owned(format!("<f{bits}>")),
            Self::StringByValue
            | Self::StringByRef
            | Self::StringPtr { .. }
            | Self::CString { .. } => "<string>",
            Self::Complex { .. } => "<complex>",
            Self::UserDefined { tag, .. } => tag,
        };
        Cow::Borrowed(label)
    }
}

bitflags! {
    /// Qualifiers recorded alongside the base kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Qualifiers: u8 {
        const CONST = 1 << 0;
        const REFERENCE = 1 << 1;
        const POINTER = 1 << 2;
    }
}

/// A classified parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamType {
    pub kind: ParameterKind,
    pub qualifiers: Qualifiers,
}

impl ParamType {
    pub const fn new(kind: ParameterKind, qualifiers: Qualifiers) -> Self {
        Self { kind, qualifiers }
    }

    /// A plain by-value parameter.
    pub const fn value(kind: ParameterKind) -> Self {
        Self::new(kind, Qualifiers::empty())
    }

    /// Same kind with extra qualifiers.
    pub const fn with(self, qualifiers: Qualifiers) -> Self {
        Self::new(self.kind, self.qualifiers.union(qualifiers))
    }

    pub const fn is_const(&self) -> bool {
        self.qualifiers.contains(Qualifiers::CONST)
    }

    pub const fn is_indirect(&self) -> bool {
        self.qualifiers
            .intersects(Qualifiers::REFERENCE.union(Qualifiers::POINTER))
    }

    /// Whether the function can modify the caller-visible value.
    pub const fn is_mutable(&self) -> bool {
        self.is_indirect() && !self.is_const()
    }

    pub const fn arg_type(&self) -> ArgType {
        self.kind.arg_type()
    }
}

/// What a wrapped function returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnKind {
    Void,
    Value(ParameterKind),
    /// A type with no known category; printed with the fallback message.
    Opaque,
}

/// Ordered parameter types plus the return kind of one wrapped function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub parameters: Vec<ParamType>,
    pub returns: ReturnKind,
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}
