//! Error types for class-file encoding and decoding.

use thiserror::Error;

/// Errors produced by [`ClassWriter`](crate::ClassWriter) and
/// [`ClassFile::parse`](crate::ClassFile::parse).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    /// The constant pool would exceed 65535 slots.
    #[error("constant pool overflow: more than {max} entries")]
    ConstantPoolOverflow {
        /// The largest number of slots a pool may hold.
        max: usize,
    },

    /// A string constant does not fit a `CONSTANT_Utf8` entry.
    #[error("string constant too long: {len} bytes")]
    StringTooLong {
        /// Encoded length in bytes.
        len: usize,
    },

    /// A method body exceeds the 64 KiB code limit.
    #[error("method '{method}' has {len} bytes of code")]
    CodeTooLarge {
        /// Method name.
        method: String,
        /// Encoded length in bytes.
        len: usize,
    },

    /// More than 65535 fields, methods or inner classes.
    #[error("too many {what}: {count}")]
    TooManyMembers {
        /// What kind of member overflowed.
        what: &'static str,
        /// The attempted count.
        count: usize,
    },

    /// The input ended before a complete structure was read.
    #[error("unexpected end of class data at offset {offset}")]
    UnexpectedEof {
        /// Byte offset where more data was expected.
        offset: usize,
    },

    /// The input does not start with `0xCAFEBABE`.
    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    /// A constant pool tag this reader does not know.
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstant {
        /// The tag byte.
        tag: u8,
        /// Pool index of the entry.
        index: u16,
    },

    /// A pool index is out of range or points to the wrong kind of entry.
    #[error("invalid constant pool reference {index}: expected {expected}")]
    BadConstantRef {
        /// The offending index.
        index: u16,
        /// The entry kind that was expected.
        expected: &'static str,
    },

    /// A `CONSTANT_Utf8` entry is not valid modified UTF-8.
    #[error("malformed modified UTF-8 in constant {index}")]
    MalformedUtf8 {
        /// Pool index of the entry.
        index: u16,
    },

    /// A class initializer uses an instruction the interpreter does not model.
    #[error("unsupported opcode {opcode:#04x} at pc {pc}")]
    UnsupportedOpcode {
        /// The opcode byte.
        opcode: u8,
        /// Offset within the code array.
        pc: usize,
    },

    /// A class initializer is not well formed for the interpreter.
    #[error("malformed code at pc {pc}: {reason}")]
    MalformedCode {
        /// Offset within the code array.
        pc: usize,
        /// What went wrong.
        reason: &'static str,
    },
}
