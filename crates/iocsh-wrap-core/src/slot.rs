//! Host argument slots.
//!
//! The shell hands every command an ordered buffer of untagged slots whose
//! interpretation is fixed by the tags in the function descriptor. [`ArgSlot`]
//! is that slot with its tag attached; [`ArgBuf`] is the buffer for one call.

use std::ffi::CStr;

use crate::error::ConversionError;
use crate::kind::ArgType;

/// One shell argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ArgSlot<'a> {
    Int(i32),
    Double(f64),
    /// `None` when the shell passed a null string.
    String(Option<&'a CStr>),
}

impl<'a> ArgSlot<'a> {
    /// The value the shell fills in for an omitted argument.
    pub const fn zeroed(arg_type: ArgType) -> ArgSlot<'static> {
        match arg_type {
            ArgType::Int => ArgSlot::Int(0),
            ArgType::Double => ArgSlot::Double(0.0),
            ArgType::String => ArgSlot::String(None),
        }
    }

    pub const fn arg_type(&self) -> ArgType {
        match self {
            ArgSlot::Int(_) => ArgType::Int,
            ArgSlot::Double(_) => ArgType::Double,
            ArgSlot::String(_) => ArgType::String,
        }
    }

    pub const fn type_name(&self) -> &'static str {
        self.arg_type().name()
    }

    pub fn int(self) -> Result<i32, ConversionError> {
        match self {
            ArgSlot::Int(value) => Ok(value),
            other => Err(other.mismatch(ArgType::Int)),
        }
    }

    pub fn double(self) -> Result<f64, ConversionError> {
        match self {
            ArgSlot::Double(value) => Ok(value),
            other => Err(other.mismatch(ArgType::Double)),
        }
    }

    pub fn string(self) -> Result<Option<&'a CStr>, ConversionError> {
        match self {
            ArgSlot::String(value) => Ok(value),
            other => Err(other.mismatch(ArgType::String)),
        }
    }

    /// The string slot as UTF-8 text.
    pub fn text(self) -> Result<Option<&'a str>, ConversionError> {
        self.string()?
            .map(|s| s.to_str().map_err(|_| ConversionError::InvalidUtf8))
            .transpose()
    }

    fn mismatch(&self, expected: ArgType) -> ConversionError {
        ConversionError::TypeMismatch {
            expected: expected.name(),
            actual: self.type_name(),
        }
    }
}

/// The ordered slots passed to one invocation.
#[derive(Debug, Clone, Copy)]
pub struct ArgBuf<'a> {
    slots: &'a [ArgSlot<'a>],
}

impl<'a> ArgBuf<'a> {
    pub const fn new(slots: &'a [ArgSlot<'a>]) -> Self {
        Self { slots }
    }

    pub const fn len(&self) -> usize {
        self.slots.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The slot at `index`.
    pub fn slot(&self, index: usize) -> Result<ArgSlot<'a>, ConversionError> {
        self.slots
            .get(index)
            .copied()
            .ok_or(ConversionError::MissingSlot {
                index,
                count: self.slots.len(),
            })
    }

    pub fn slots(&self) -> &'a [ArgSlot<'a>] {
        self.slots
    }
}
