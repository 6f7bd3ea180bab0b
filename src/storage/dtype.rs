//! Element type tags for host buffers.
//!
//! A host buffer is untyped memory plus a [`Dtype`] tag. [`Element`] ties a Rust
//! scalar type to its tag so views can check, or force, the element type of the
//! memory they adapt.

use std::fmt;

use num_traits::{NumCast, ToPrimitive};

/// Scalar kind of a [`Dtype`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DtypeKind {
    Signed,
    Unsigned,
    Float,
}

/// Element type tag of a host buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn itemsize(self) -> usize {
        match self {
            Dtype::I8 | Dtype::U8 => 1,
            Dtype::I16 | Dtype::U16 => 2,
            Dtype::I32 | Dtype::U32 | Dtype::F32 => 4,
            Dtype::I64 | Dtype::U64 | Dtype::F64 => 8,
        }
    }

    pub fn kind(self) -> DtypeKind {
        match self {
            Dtype::I8 | Dtype::I16 | Dtype::I32 | Dtype::I64 => DtypeKind::Signed,
            Dtype::U8 | Dtype::U16 | Dtype::U32 | Dtype::U64 => DtypeKind::Unsigned,
            Dtype::F32 | Dtype::F64 => DtypeKind::Float,
        }
    }

    /// Buffer-protocol format character.
    pub fn format(self) -> &'static str {
        match self {
            Dtype::I8 => "b",
            Dtype::I16 => "h",
            Dtype::I32 => "i",
            Dtype::I64 => "q",
            Dtype::U8 => "B",
            Dtype::U16 => "H",
            Dtype::U32 => "I",
            Dtype::U64 => "Q",
            Dtype::F32 => "f",
            Dtype::F64 => "d",
        }
    }

    /// Parses a buffer-protocol format character.
    ///
    /// `l` and `L` follow the platform's C `long` in native mode (no prefix or
    /// `@`) and are 4 bytes under a standard-size prefix.
    pub fn from_format(format: &str) -> Option<Self> {
        let (native, code) = match format.strip_prefix(['=', '<', '>', '!']) {
            Some(code) => (false, code),
            None => (true, format.strip_prefix('@').unwrap_or(format)),
        };
        let long_is_64 = native && std::mem::size_of::<std::ffi::c_long>() == 8;
        let dtype = match code {
            "b" => Dtype::I8,
            "h" => Dtype::I16,
            "i" => Dtype::I32,
            "l" if long_is_64 => Dtype::I64,
            "l" => Dtype::I32,
            "q" => Dtype::I64,
            "B" => Dtype::U8,
            "H" => Dtype::U16,
            "I" => Dtype::U32,
            "L" if long_is_64 => Dtype::U64,
            "L" => Dtype::U32,
            "Q" => Dtype::U64,
            "f" => Dtype::F32,
            "d" => Dtype::F64,
            _ => return None,
        };
        Some(dtype)
    }

    /// Returns `true` if every value of `self` is representable in `to`.
    ///
    /// 64-bit integers are considered safely castable to `f64`.
    pub fn can_cast_safely(self, to: Dtype) -> bool {
        use DtypeKind::*;
        if self == to {
            return true;
        }
        let (a, b) = (self.itemsize(), to.itemsize());
        match (self.kind(), to.kind()) {
            (Signed, Signed) | (Unsigned, Unsigned) | (Float, Float) => b >= a,
            (Unsigned, Signed) => b > a,
            (Signed, Unsigned) => false,
            (Signed, Float) | (Unsigned, Float) => (b == 4 && a <= 2) || b == 8,
            (Float, _) => false,
        }
    }

    /// Reads the element at `ptr` and converts it to `T`.
    ///
    /// Returns `None` when the value is not representable in `T`.
    ///
    /// # Safety
    /// `ptr` must point to a readable element of type `self`.
    pub(crate) unsafe fn read_as<T: Element>(self, ptr: *const u8) -> Option<T> {
        match self {
            Dtype::I8 => <T as NumCast>::from(ptr.cast::<i8>().read_unaligned()),
            Dtype::I16 => <T as NumCast>::from(ptr.cast::<i16>().read_unaligned()),
            Dtype::I32 => <T as NumCast>::from(ptr.cast::<i32>().read_unaligned()),
            Dtype::I64 => <T as NumCast>::from(ptr.cast::<i64>().read_unaligned()),
            Dtype::U8 => <T as NumCast>::from(ptr.cast::<u8>().read_unaligned()),
            Dtype::U16 => <T as NumCast>::from(ptr.cast::<u16>().read_unaligned()),
            Dtype::U32 => <T as NumCast>::from(ptr.cast::<u32>().read_unaligned()),
            Dtype::U64 => <T as NumCast>::from(ptr.cast::<u64>().read_unaligned()),
            Dtype::F32 => <T as NumCast>::from(ptr.cast::<f32>().read_unaligned()),
            Dtype::F64 => <T as NumCast>::from(ptr.cast::<f64>().read_unaligned()),
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dtype::I8 => "int8",
            Dtype::I16 => "int16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::U32 => "uint32",
            Dtype::U64 => "uint64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        };
        f.write_str(name)
    }
}

/// A Rust scalar that can live in a host buffer.
///
/// # Safety
/// `DTYPE` must describe `Self` exactly: views reinterpret memory tagged with
/// `DTYPE` as `Self`, and derive element strides from `size_of::<Self>()`.
/// An implementation has to say so with `unsafe impl`:
///
/// ```compile_fail
/// use num_traits::{NumCast, ToPrimitive};
/// use tensorust_host::{Dtype, Element};
///
/// #[derive(Clone, Copy, Default, PartialEq, Debug)]
/// struct Half(u16);
///
/// impl ToPrimitive for Half {
///     fn to_i64(&self) -> Option<i64> {
///         Some(self.0.into())
///     }
///     fn to_u64(&self) -> Option<u64> {
///         Some(self.0.into())
///     }
/// }
///
/// impl NumCast for Half {
///     fn from<N: ToPrimitive>(n: N) -> Option<Self> {
///         n.to_u16().map(Half)
///     }
/// }
///
/// impl Element for Half {
///     const DTYPE: Dtype = Dtype::F64;
/// }
/// ```
pub unsafe trait Element: Copy + Default + PartialEq + fmt::Debug + NumCast + ToPrimitive + Send + Sync + 'static {
    const DTYPE: Dtype;
}

macro_rules! impl_element {
    ($($t:ty => $d:ident),+ $(,)?) => {
        $(
            // SAFETY: each primitive is paired with its own tag.
            unsafe impl Element for $t {
                const DTYPE: Dtype = Dtype::$d;
            }
        )+
    };
}

impl_element!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_itemsize_and_format() {
        assert_eq!(Dtype::F64.itemsize(), 8);
        assert_eq!(Dtype::U16.itemsize(), 2);
        assert_eq!(Dtype::from_format("<d"), Some(Dtype::F64));
        assert_eq!(Dtype::from_format(Dtype::I16.format()), Some(Dtype::I16));
        assert_eq!(Dtype::from_format("x"), None);
        assert_eq!(<f32 as Element>::DTYPE, Dtype::F32);
    }

    #[test]
    fn test_long_format_follows_platform() {
        let native = Dtype::from_format("l").unwrap();
        assert_eq!(native.itemsize(), std::mem::size_of::<std::ffi::c_long>());
        assert_eq!(Dtype::from_format("@l"), Some(native));
        assert_eq!(
            Dtype::from_format("L").unwrap().itemsize(),
            std::mem::size_of::<std::ffi::c_ulong>()
        );
        assert_eq!(Dtype::from_format("<l"), Some(Dtype::I32));
        assert_eq!(Dtype::from_format("=L"), Some(Dtype::U32));
        assert_eq!(Dtype::from_format("!q"), Some(Dtype::I64));
    }

    #[test]
    fn test_safe_casts() {
        assert!(Dtype::I32.can_cast_safely(Dtype::I64));
        assert!(Dtype::U8.can_cast_safely(Dtype::I16));
        assert!(!Dtype::U16.can_cast_safely(Dtype::I16));
        assert!(!Dtype::I8.can_cast_safely(Dtype::U64));
        assert!(Dtype::I16.can_cast_safely(Dtype::F32));
        assert!(!Dtype::I32.can_cast_safely(Dtype::F32));
        assert!(Dtype::I64.can_cast_safely(Dtype::F64));
        assert!(!Dtype::F64.can_cast_safely(Dtype::F32));
        assert!(!Dtype::F32.can_cast_safely(Dtype::I64));
    }

    #[test]
    fn test_read_as() {
        let value: i16 = -7;
        let bytes = value.to_ne_bytes();
        let read: Option<f64> = unsafe { Dtype::I16.read_as(bytes.as_ptr()) };
        assert_eq!(read, Some(-7.0));
        let read: Option<u8> = unsafe { Dtype::I16.read_as(bytes.as_ptr()) };
        assert_eq!(read, None);
    }
}
