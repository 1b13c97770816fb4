//! Conversion of Rust values into the C representation native functions receive.
//!
//! Every argument kind has a marker ([`ArgKind`]) describing its descriptor code.
//! Concrete Rust values ([`NativeType`]) map onto a kind, so `&str` and `String`
//! both pass as [`Text`]. A method declared over `(i32, f32, Text)` therefore
//! accepts `(123, 4.4, "114514")` as well as an owned string.
use std::{
    ffi::{CString, c_char},
    mem,
};

use native_header::{core_header::HostH, signature::Signature};

use crate::error::{BindError, Result};

/// Type-level description of one parameter.
pub trait ArgKind: 'static {
    fn signature() -> Signature;
}

/// Marker for text parameters (`Ljava/lang/String;`).
pub enum Text {}

impl ArgKind for Text {
    fn signature() -> Signature {
        Signature::string()
    }
}

/// A value that can be passed to a native function.
pub trait NativeType {
    type Kind: ArgKind;
    /// What the native function receives.
    type Raw: Copy;
    /// Keeps converted data alive for the duration of the call.
    type Holder;

    fn marshal(&self, index: usize) -> Result<Self::Holder>;

    fn raw(holder: &Self::Holder) -> Self::Raw;
}

/// A value a native function can return.
pub trait NativeReturn: Sized + 'static {
    type Raw: Copy;

    fn signature() -> Signature;

    fn from_raw(raw: Self::Raw) -> Self;
}

macro_rules! impl_primitive {
    ($typ:ty, $signature:expr) => {
        impl ArgKind for $typ {
            fn signature() -> Signature {
                $signature
            }
        }

        impl NativeType for $typ {
            type Kind = $typ;
            type Raw = $typ;
            type Holder = $typ;

            fn marshal(&self, _index: usize) -> Result<Self::Holder> {
                Ok(*self)
            }

            fn raw(holder: &Self::Holder) -> Self::Raw {
                *holder
            }
        }

        impl NativeReturn for $typ {
            type Raw = $typ;

            fn signature() -> Signature {
                $signature
            }

            fn from_raw(raw: Self::Raw) -> Self {
                raw
            }
        }
    };
}

impl_primitive!(i8, Signature::Byte);
impl_primitive!(u16, Signature::Char);
impl_primitive!(i16, Signature::Short);
impl_primitive!(i32, Signature::Int);
impl_primitive!(i64, Signature::Long);
impl_primitive!(f32, Signature::Float);
impl_primitive!(f64, Signature::Double);

// bool crosses the boundary as an unsigned byte.
impl ArgKind for bool {
    fn signature() -> Signature {
        Signature::Boolean
    }
}

impl NativeType for bool {
    type Kind = bool;
    type Raw = u8;
    type Holder = u8;

    fn marshal(&self, _index: usize) -> Result<Self::Holder> {
        Ok(u8::from(*self))
    }

    fn raw(holder: &Self::Holder) -> Self::Raw {
        *holder
    }
}

impl NativeReturn for bool {
    type Raw = u8;

    fn signature() -> Signature {
        Signature::Boolean
    }

    fn from_raw(raw: Self::Raw) -> Self {
        raw != 0
    }
}

impl NativeReturn for () {
    type Raw = ();

    fn signature() -> Signature {
        Signature::Void
    }

    fn from_raw(_raw: Self::Raw) -> Self {}
}

fn marshal_text(text: &str, index: usize) -> Result<CString> {
    CString::new(text).map_err(|err| BindError::Marshal {
        index,
        message: format!("text contains a NUL byte at position {}", err.nul_position()),
    })
}

impl NativeType for &str {
    type Kind = Text;
    type Raw = *const c_char;
    type Holder = CString;

    fn marshal(&self, index: usize) -> Result<Self::Holder> {
        marshal_text(self, index)
    }

    fn raw(holder: &Self::Holder) -> Self::Raw {
        holder.as_ptr()
    }
}

impl NativeType for String {
    type Kind = Text;
    type Raw = *const c_char;
    type Holder = CString;

    fn marshal(&self, index: usize) -> Result<Self::Holder> {
        marshal_text(self, index)
    }

    fn raw(holder: &Self::Holder) -> Self::Raw {
        holder.as_ptr()
    }
}

/// Parameter list of a declared native method, as a tuple of [`ArgKind`]s.
pub trait ArgKinds: 'static {
    fn signatures() -> Vec<Signature>;
}

/// Argument tuple for a call.
pub trait NativeArgs {
    type Kinds: ArgKinds;

    /// Marshals the arguments and calls `function` with the host context first.
    ///
    /// # Safety
    ///
    /// `function` must point to an `extern "C"` function taking `&HostH`
    /// followed by the raw form of every argument and returning `R::Raw`.
    unsafe fn call<R: NativeReturn>(self, host: &HostH, function: *const ()) -> Result<R>;
}

macro_rules! impl_args {
    ($($kind:ident $value:ident $holder:ident $idx:tt),*) => {
        impl<$($kind: ArgKind),*> ArgKinds for ($($kind,)*) {
            fn signatures() -> Vec<Signature> {
                vec![$(<$kind as ArgKind>::signature()),*]
            }
        }

        #[allow(non_snake_case)]
        impl<$($value: NativeType),*> NativeArgs for ($($value,)*) {
            type Kinds = ($(<$value as NativeType>::Kind,)*);

            #[allow(unused_variables)]
            unsafe fn call<R: NativeReturn>(self, host: &HostH, function: *const ()) -> Result<R> {
                $(let $holder = self.$idx.marshal($idx)?;)*

                let function: extern "C" fn(&HostH $(, <$value as NativeType>::Raw)*) -> R::Raw =
                    unsafe { mem::transmute_copy(&function) };
                let raw = function(host $(, <$value as NativeType>::raw(&$holder))*);

                Ok(R::from_raw(raw))
            }
        }
    };
}

impl_args!();
impl_args!(K0 V0 h0 0);
impl_args!(K0 V0 h0 0, K1 V1 h1 1);
impl_args!(K0 V0 h0 0, K1 V1 h1 1, K2 V2 h2 2);
impl_args!(K0 V0 h0 0, K1 V1 h1 1, K2 V2 h2 2, K3 V3 h3 3);
impl_args!(K0 V0 h0 0, K1 V1 h1 1, K2 V2 h2 2, K3 V3 h3 3, K4 V4 h4 4);
impl_args!(K0 V0 h0 0, K1 V1 h1 1, K2 V2 h2 2, K3 V3 h3 3, K4 V4 h4 4, K5 V5 h5 5);
