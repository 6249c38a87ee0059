//! D-Bus argument type codes and basic argument values.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::fmt;

use crate::error::{self, Error, Result};
use crate::message::{Message, MessageIterator};
use crate::wire::{self, WireValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    Array,
    Struct,
    Variant,
    DictEntry,
    UnixFd,
}

#[derive(Debug)]
pub struct ArgumentTypeInfo {
    pub ty: ArgumentType,
    pub code: char,
    pub signature: &'static CStr,
    pub basic: bool,
}

const fn info(ty: ArgumentType, code: char, signature: &'static CStr, basic: bool) -> ArgumentTypeInfo {
    ArgumentTypeInfo {
        ty,
        code,
        signature,
        basic,
    }
}

/// Indexed by `ArgumentType` discriminant.
pub static ARGUMENT_TYPES: [ArgumentTypeInfo; 17] = [
    info(ArgumentType::Byte, 'y', c"y", true),
    info(ArgumentType::Boolean, 'b', c"b", true),
    info(ArgumentType::Int16, 'n', c"n", true),
    info(ArgumentType::UInt16, 'q', c"q", true),
    info(ArgumentType::Int32, 'i', c"i", true),
    info(ArgumentType::UInt32, 'u', c"u", true),
    info(ArgumentType::Int64, 'x', c"x", true),
    info(ArgumentType::UInt64, 't', c"t", true),
    info(ArgumentType::Double, 'd', c"d", true),
    info(ArgumentType::String, 's', c"s", true),
    info(ArgumentType::ObjectPath, 'o', c"o", true),
    info(ArgumentType::Signature, 'g', c"g", true),
    info(ArgumentType::Array, 'a', c"a", false),
    info(ArgumentType::Struct, 'r', c"r", false),
    info(ArgumentType::Variant, 'v', c"v", false),
    info(ArgumentType::DictEntry, 'e', c"e", false),
    info(ArgumentType::UnixFd, 'h', c"h", true),
];

impl ArgumentType {
    pub fn info(self) -> &'static ArgumentTypeInfo {
        &ARGUMENT_TYPES[self as usize]
    }

    pub fn code(self) -> char {
        self.info().code
    }

    /// One-character signature string, e.g. `"i"`.
    pub fn signature(self) -> &'static str {
        // Table entries are ASCII.
        self.info().signature.to_str().unwrap_or_default()
    }

    pub fn c_signature(self) -> &'static CStr {
        self.info().signature
    }

    pub fn from_code(code: char) -> Option<ArgumentType> {
        ARGUMENT_TYPES.iter().find(|i| i.code == code).map(|i| i.ty)
    }

    pub fn is_basic(self) -> bool {
        self.info().basic
    }

    pub fn is_container(self) -> bool {
        !self.info().basic
    }

    pub(crate) fn c_code(self) -> c_int {
        self.code() as c_int
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.signature())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ObjectPath(pub String);

impl ObjectPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ObjectPath {
    fn from(s: String) -> Self {
        ObjectPath(s)
    }
}

impl From<&str> for ObjectPath {
    fn from(s: &str) -> Self {
        ObjectPath(s.to_owned())
    }
}

impl From<ObjectPath> for String {
    fn from(p: ObjectPath) -> Self {
        p.0
    }
}

/// A D-Bus type signature carried as an argument value (`g`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureString(pub String);

impl SignatureString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SignatureString {
    fn from(s: String) -> Self {
        SignatureString(s)
    }
}

impl From<&str> for SignatureString {
    fn from(s: &str) -> Self {
        SignatureString(s.to_owned())
    }
}

impl From<SignatureString> for String {
    fn from(s: SignatureString) -> Self {
        s.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnixFd(pub i32);

impl From<i32> for UnixFd {
    fn from(fd: i32) -> Self {
        UnixFd(fd)
    }
}

impl From<UnixFd> for i32 {
    fn from(fd: UnixFd) -> Self {
        fd.0
    }
}

/// Timeout values accepted by `Connection::send`, in milliseconds.
pub struct Timeout;

impl Timeout {
    /// Never time out.
    pub const INFINITE: f64 = crate::sys::ELDBUS_TIMEOUT_INFINITE as f64;
    /// Let the bus pick.
    pub const DEFAULT: f64 = -1.0;
}

/// A single D-Bus value of a basic (non-container) type.
#[derive(Debug, Clone, PartialEq)]
pub enum BasicArgument {
    Byte(u8),
    Bool(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    ObjectPath(ObjectPath),
    Signature(SignatureString),
    UnixFd(UnixFd),
}

impl BasicArgument {
    pub fn argument_type(&self) -> ArgumentType {
        match self {
            BasicArgument::Byte(_) => ArgumentType::Byte,
            BasicArgument::Bool(_) => ArgumentType::Boolean,
            BasicArgument::Int16(_) => ArgumentType::Int16,
            BasicArgument::UInt16(_) => ArgumentType::UInt16,
            BasicArgument::Int32(_) => ArgumentType::Int32,
            BasicArgument::UInt32(_) => ArgumentType::UInt32,
            BasicArgument::Int64(_) => ArgumentType::Int64,
            BasicArgument::UInt64(_) => ArgumentType::UInt64,
            BasicArgument::Double(_) => ArgumentType::Double,
            BasicArgument::String(_) => ArgumentType::String,
            BasicArgument::ObjectPath(_) => ArgumentType::ObjectPath,
            BasicArgument::Signature(_) => ArgumentType::Signature,
            BasicArgument::UnixFd(_) => ArgumentType::UnixFd,
        }
    }

    pub fn type_code(&self) -> char {
        self.argument_type().code()
    }

    pub fn signature(&self) -> &'static str {
        self.argument_type().signature()
    }

    /// Appends this value at the end of `msg`'s body.
    pub fn append_to(&self, msg: &mut Message) -> Result<()> {
        let raw = error::live(msg.handle())?;
        let ty = self.argument_type();
        let ok = self.with_wire(|v| unsafe { wire::arguments_append(raw, ty.c_signature(), v) })?;
        if !ok {
            tracing::error!(code = %ty.code(), "could not append basic type to eldbus message");
            return Err(Error::AppendToMessage { code: ty.code() });
        }
        Ok(())
    }

    /// Appends this value at `iter`'s write position.
    pub fn append_to_iter(&self, iter: &mut MessageIterator<'_>) -> Result<()> {
        let raw = error::live(iter.handle())?;
        let ty = self.argument_type();
        let ok = self.with_wire(|v| unsafe { wire::iter_basic_append(raw, ty.c_code(), v) })?;
        if !ok {
            tracing::error!(code = %ty.code(), "could not append basic type to eldbus message iterator");
            return Err(Error::AppendToIterator { code: ty.code() });
        }
        Ok(())
    }

    fn with_wire<R>(&self, f: impl FnOnce(WireValue<'_>) -> R) -> Result<R> {
        let text = match self {
            BasicArgument::Byte(v) => return Ok(f(WireValue::Int(c_int::from(*v)))),
            BasicArgument::Bool(v) => return Ok(f(WireValue::Int(c_int::from(*v)))),
            BasicArgument::Int16(v) => return Ok(f(WireValue::Int(c_int::from(*v)))),
            BasicArgument::UInt16(v) => return Ok(f(WireValue::Int(c_int::from(*v)))),
            BasicArgument::Int32(v) => return Ok(f(WireValue::Int(*v))),
            BasicArgument::UInt32(v) => return Ok(f(WireValue::UInt(*v))),
            BasicArgument::Int64(v) => return Ok(f(WireValue::Long(*v))),
            BasicArgument::UInt64(v) => return Ok(f(WireValue::ULong(*v))),
            BasicArgument::Double(v) => return Ok(f(WireValue::Double(*v))),
            BasicArgument::UnixFd(fd) => return Ok(f(WireValue::Int(fd.0))),
            BasicArgument::String(s) => s.as_str(),
            BasicArgument::ObjectPath(p) => p.as_str(),
            BasicArgument::Signature(s) => s.as_str(),
        };
        let text = CString::new(text).map_err(|_| Error::InteriorNul)?;
        Ok(f(WireValue::Text(&text)))
    }

    /// Reads the value `eldbus_message_iter_get_and_next` stored into `slot`.
    ///
    /// # Safety
    /// `slot` must have been filled by a successful read of `ty`.
    pub(crate) unsafe fn from_slot(ty: ArgumentType, slot: &ReadSlot) -> Option<BasicArgument> {
        let p = slot.as_ptr();
        let value = match ty {
            ArgumentType::Byte => BasicArgument::Byte(p.cast::<u8>().read()),
            ArgumentType::Boolean => BasicArgument::Bool(p.cast::<c_int>().read() != 0),
            ArgumentType::Int16 => BasicArgument::Int16(p.cast::<i16>().read()),
            ArgumentType::UInt16 => BasicArgument::UInt16(p.cast::<u16>().read()),
            ArgumentType::Int32 => BasicArgument::Int32(p.cast::<i32>().read()),
            ArgumentType::UInt32 => BasicArgument::UInt32(p.cast::<u32>().read()),
            ArgumentType::Int64 => BasicArgument::Int64(p.cast::<i64>().read()),
            ArgumentType::UInt64 => BasicArgument::UInt64(p.cast::<u64>().read()),
            ArgumentType::Double => BasicArgument::Double(p.cast::<f64>().read()),
            ArgumentType::UnixFd => BasicArgument::UnixFd(UnixFd(p.cast::<i32>().read())),
            ArgumentType::String => BasicArgument::String(slot_text(p)),
            ArgumentType::ObjectPath => BasicArgument::ObjectPath(ObjectPath(slot_text(p))),
            ArgumentType::Signature => BasicArgument::Signature(SignatureString(slot_text(p))),
            ArgumentType::Array | ArgumentType::Struct | ArgumentType::Variant | ArgumentType::DictEntry => {
                return None
            }
        };
        Some(value)
    }
}

unsafe fn slot_text(p: *const c_void) -> String {
    let s = p.cast::<*const c_char>().read();
    if s.is_null() {
        return String::new();
    }
    CStr::from_ptr(s).to_string_lossy().into_owned()
}

/// Zeroed, 8-byte aligned storage for one value read off an iterator.
#[repr(C, align(8))]
#[derive(Default)]
pub(crate) struct ReadSlot([u8; 8]);

impl ReadSlot {
    pub(crate) fn as_ptr(&self) -> *const c_void {
        self.0.as_ptr().cast()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut c_void {
        self.0.as_mut_ptr().cast()
    }
}

macro_rules! basic_from {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for BasicArgument {
                fn from(v: $t) -> Self {
                    BasicArgument::$variant(v)
                }
            }
        )*
    };
}

basic_from!(
    u8 => Byte,
    bool => Bool,
    i16 => Int16,
    u16 => UInt16,
    i32 => Int32,
    u32 => UInt32,
    i64 => Int64,
    u64 => UInt64,
    f64 => Double,
    String => String,
    ObjectPath => ObjectPath,
    SignatureString => Signature,
    UnixFd => UnixFd,
);

impl From<&str> for BasicArgument {
    fn from(v: &str) -> Self {
        BasicArgument::String(v.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_discriminant() {
        for (idx, entry) in ARGUMENT_TYPES.iter().enumerate() {
            assert_eq!(entry.ty as usize, idx);
            assert_eq!(entry.signature.to_bytes(), entry.code.to_string().as_bytes());
            assert_eq!(ArgumentType::from_code(entry.code), Some(entry.ty));
        }
        assert_eq!(ArgumentType::from_code('z'), None);
    }

    #[test]
    fn well_known_codes() {
        assert_eq!(ArgumentType::Int32.code(), 'i');
        assert_eq!(ArgumentType::UnixFd.code(), 'h');
        assert_eq!(ArgumentType::Boolean.signature(), "b");
        assert_eq!(ArgumentType::ObjectPath.to_string(), "o");
        assert!(ArgumentType::Array.is_container());
        assert!(ArgumentType::DictEntry.is_container());
        assert!(ArgumentType::UnixFd.is_basic());
        assert!(!ArgumentType::Variant.is_basic());
    }

    #[test]
    fn each_value_reports_its_own_signature() {
        let cases: Vec<(BasicArgument, &str)> = vec![
            (7u8.into(), "y"),
            (true.into(), "b"),
            ((-1i16).into(), "n"),
            (1u16.into(), "q"),
            (5i32.into(), "i"),
            (5u32.into(), "u"),
            (5i64.into(), "x"),
            (5u64.into(), "t"),
            (0.5f64.into(), "d"),
            ("x".into(), "s"),
            (ObjectPath::from("/org/x").into(), "o"),
            (SignatureString::from("a{sv}").into(), "g"),
            (UnixFd(3).into(), "h"),
        ];
        for (arg, sig) in cases {
            assert_eq!(arg.signature(), sig, "{arg:?}");
            assert_eq!(arg.type_code().to_string(), sig);
            assert!(arg.argument_type().is_basic());
        }
    }

    #[test]
    fn narrow_values_promote_to_int() {
        let promoted = |arg: BasicArgument| arg.with_wire(|v| format!("{v:?}")).expect("wire");
        assert_eq!(promoted(BasicArgument::Byte(200)), "Int(200)");
        assert_eq!(promoted(BasicArgument::Bool(true)), "Int(1)");
        assert_eq!(promoted(BasicArgument::Int16(-2)), "Int(-2)");
        assert_eq!(promoted(BasicArgument::UInt16(65535)), "Int(65535)");
        assert_eq!(promoted(BasicArgument::UInt32(u32::MAX)), format!("UInt({})", u32::MAX));
        assert_eq!(promoted(BasicArgument::UnixFd(UnixFd(4))), "Int(4)");
        assert_eq!(promoted(BasicArgument::UInt64(9)), "ULong(9)");
    }

    #[test]
    fn interior_nul_is_rejected_before_native() {
        let arg = BasicArgument::from("a\0b");
        assert_eq!(arg.with_wire(|_| ()), Err(Error::InteriorNul));
    }

    #[test]
    fn newtypes_convert_both_ways() {
        let p = ObjectPath::from("/a");
        assert_eq!(String::from(p.clone()), "/a");
        assert_eq!(p.as_str(), "/a");
        assert_eq!(i32::from(UnixFd::from(9)), 9);
        assert_eq!(String::from(SignatureString::from("as")), "as");
        assert_eq!(Timeout::INFINITE, 2_147_483_647.0);
    }

    #[test]
    fn slot_decodes_by_type() {
        let mut slot = ReadSlot::default();
        unsafe { slot.as_mut_ptr().cast::<i16>().write(-3) };
        assert_eq!(
            unsafe { BasicArgument::from_slot(ArgumentType::Int16, &slot) },
            Some(BasicArgument::Int16(-3))
        );

        let text = c"hello";
        let mut slot = ReadSlot::default();
        unsafe { slot.as_mut_ptr().cast::<*const c_char>().write(text.as_ptr()) };
        assert_eq!(
            unsafe { BasicArgument::from_slot(ArgumentType::ObjectPath, &slot) },
            Some(BasicArgument::ObjectPath(ObjectPath::from("hello")))
        );
        assert_eq!(unsafe { BasicArgument::from_slot(ArgumentType::Array, &slot) }, None);
    }
}
