//! C layout of the iocsh registration ABI.
//!
//! These types mirror `iocsh.h` so descriptors can be handed to the shell
//! and argument buffers read back without linking against it. Linking and
//! the actual `iocshRegister` call live behind the `epics` feature of the
//! facade crate.

use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::ptr::{self, NonNull};

use crate::descriptor::FunctionDescriptor;
use crate::error::BuildError;
use crate::kind::ArgType;
use crate::slot::ArgSlot;

/// `iocshArgBuf::aval`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct IocshArgv {
    pub ac: c_int,
    pub av: *mut *mut c_char,
}

/// One slot of the buffer the shell passes to a command.
#[repr(C)]
#[derive(Clone, Copy)]
pub union IocshArgBuf {
    pub ival: c_int,
    pub dval: f64,
    pub sval: *mut c_char,
    pub vval: *mut c_void,
    pub aval: IocshArgv,
}

/// `iocshArg`: argument name and type tag.
#[repr(C)]
#[derive(Debug)]
pub struct IocshArg {
    pub name: *const c_char,
    pub arg_type: c_int,
}

/// `iocshFuncDef`
#[repr(C)]
#[derive(Debug)]
pub struct IocshFuncDef {
    pub name: *const c_char,
    pub nargs: c_int,
    pub arg: *const *const IocshArg,
    pub usage: *const c_char,
}

/// `iocshCallFunc`
pub type IocshCallFunc = unsafe extern "C" fn(args: *const IocshArgBuf);

/// Owned C representation of a [`FunctionDescriptor`].
///
/// Every allocation belongs to this value until [`release`](Self::release)
/// hands the tree to the shell. If building fails part way, or the value is
/// dropped unreleased, everything built so far is freed.
#[derive(Debug)]
pub struct RawFuncDef {
    def: Box<IocshFuncDef>,
    // Pointed to by `def`; their heap contents stay put when `RawFuncDef`
    // moves.
    name: CString,
    usage: CString,
    arg_names: Vec<CString>,
    args: Vec<Box<IocshArg>>,
    arg_table: Box<[*const IocshArg]>,
}

impl RawFuncDef {
    pub fn new(descriptor: &FunctionDescriptor) -> Result<Self, BuildError> {
        let name = c_string("function name", descriptor.name())?;
        let nargs = c_int::try_from(descriptor.arity()).map_err(|_| BuildError::TooManyArguments {
            function: descriptor.name().to_owned(),
            count: descriptor.arity(),
        })?;

        let mut arg_names = Vec::with_capacity(descriptor.arity());
        let mut args = Vec::with_capacity(descriptor.arity());
        for argument in descriptor.arguments() {
            let arg_name = c_string("argument name", argument.name())?;
            args.push(Box::new(IocshArg {
                name: arg_name.as_ptr(),
                arg_type: argument.arg_type().into(),
            }));
            arg_names.push(arg_name);
        }
        let arg_table: Box<[*const IocshArg]> = args.iter().map(|arg| ptr::from_ref(&**arg)).collect();
        // Built from the strings above, so it only fails when one of them did.
        let usage = c_string("usage", &descriptor.usage())?;

        let def = Box::new(IocshFuncDef {
            name: name.as_ptr(),
            nargs,
            arg: arg_table.as_ptr(),
            usage: usage.as_ptr(),
        });

        Ok(Self {
            def,
            name,
            usage,
            arg_names,
            args,
            arg_table,
        })
    }

    pub fn as_ptr(&self) -> *const IocshFuncDef {
        ptr::from_ref(&*self.def)
    }

    /// Leak the whole tree and return the pointer the shell keeps.
    pub fn release(self) -> NonNull<IocshFuncDef> {
        let Self {
            def,
            name,
            usage,
            arg_names,
            args,
            arg_table,
        } = self;
        let _ = name.into_raw();
        let _ = usage.into_raw();
        for arg_name in arg_names {
            let _ = arg_name.into_raw();
        }
        for arg in args {
            let _ = Box::into_raw(arg);
        }
        let _ = Box::into_raw(arg_table);
        NonNull::from(Box::leak(def))
    }

    /// Reclaim a tree produced by [`release`](Self::release).
    ///
    /// # Safety
    ///
    /// `def` must come from `release` and must not be used by anyone else
    /// afterwards, including the shell.
    pub unsafe fn free(def: NonNull<IocshFuncDef>) {
        // SAFETY: every pointer below was leaked by `release` from the
        // matching `Box`/`CString`, and the caller gives up all aliases.
        unsafe {
            let def = Box::from_raw(def.as_ptr());
            let nargs = usize::try_from(def.nargs).unwrap_or_default();
            let table = Box::from_raw(ptr::slice_from_raw_parts_mut(def.arg.cast_mut(), nargs));
            for &arg in table.iter() {
                let arg = Box::from_raw(arg.cast_mut());
                drop(CString::from_raw(arg.name.cast_mut()));
            }
            drop(CString::from_raw(def.usage.cast_mut()));
            drop(CString::from_raw(def.name.cast_mut()));
        }
    }
}

fn c_string(what: &'static str, value: &str) -> Result<CString, BuildError> {
    CString::new(value).map_err(|_| BuildError::InteriorNul {
        what,
        value: value.to_owned(),
    })
}

/// A descriptor read back from its C layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDescriptor {
    pub name: String,
    pub arguments: Vec<(String, c_int)>,
}

/// Read a C descriptor.
///
/// # Safety
///
/// `def` must point at a valid, fully initialised `iocshFuncDef`.
pub unsafe fn read_func_def(def: *const IocshFuncDef) -> RawDescriptor {
    // SAFETY: upheld by the caller.
    unsafe {
        let def = &*def;
        let nargs = usize::try_from(def.nargs).unwrap_or_default();
        let arguments = (0..nargs)
            .map(|i| {
                let arg = &**def.arg.add(i);
                (CStr::from_ptr(arg.name).to_string_lossy().into_owned(), arg.arg_type)
            })
            .collect();
        RawDescriptor {
            name: CStr::from_ptr(def.name).to_string_lossy().into_owned(),
            arguments,
        }
    }
}

/// Interpret a shell argument buffer using the descriptor's tags.
///
/// # Safety
///
/// `args` must point at `descriptor.arity()` slots filled by the shell for
/// this descriptor, and every string slot must be null or a valid C string
/// that outlives `'a`.
pub unsafe fn slots_from_raw<'a>(args: *const IocshArgBuf, descriptor: &FunctionDescriptor) -> Vec<ArgSlot<'a>> {
    descriptor
        .arg_types()
        .enumerate()
        .map(|(index, arg_type)| {
            // SAFETY: `index < arity` and the tag selects the live union field.
            unsafe {
                let slot = &*args.add(index);
                match arg_type {
                    ArgType::Int => ArgSlot::Int(slot.ival),
                    ArgType::Double => ArgSlot::Double(slot.dval),
                    ArgType::String if slot.sval.is_null() => ArgSlot::String(None),
                    ArgType::String => ArgSlot::String(Some(CStr::from_ptr(slot.sval))),
                }
            }
        })
        .collect()
}
