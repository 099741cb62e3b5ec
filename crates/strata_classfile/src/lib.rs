//! Minimal JVM class-file support.
//!
//! Strata emits small, data-only classes: constant `int` fields, static
//! `int[]` fields filled by a class initializer, a default constructor and an
//! `InnerClasses` table. This crate covers exactly that surface.
//!
//! - [`ClassWriter`] - assembles a class and serializes it
//! - [`Instruction`] - the bytecode subset used by generated method bodies
//! - [`ClassFile`] - parses a class back, for inspection and tests
//!
//! ```
//! use strata_classfile::{AccessFlags, ClassFile, ClassVersion, ClassWriter};
//!
//! let mut class = ClassWriter::new(
//!     ClassVersion::JAVA_6,
//!     AccessFlags::PUBLIC | AccessFlags::FINAL | AccessFlags::SUPER,
//!     "com/example/R$color",
//!     "java/lang/Object",
//! );
//! class.add_int_constant(
//!     AccessFlags::PUBLIC | AccessFlags::STATIC | AccessFlags::FINAL,
//!     "primary",
//!     0x7f01_0000,
//! )?;
//! class.add_default_constructor()?;
//! let bytes = class.finish()?;
//!
//! let parsed = ClassFile::parse(&bytes)?;
//! assert_eq!(parsed.this_class, "com/example/R$color");
//! assert_eq!(parsed.field("primary").and_then(|f| f.constant_value), Some(0x7f01_0000));
//! # Ok::<(), strata_classfile::ClassFileError>(())
//! ```

mod access;
mod code;
mod error;
mod mutf8;
mod pool;
mod reader;
mod writer;

pub use access::AccessFlags;
pub use code::Instruction;
pub use error::ClassFileError;
pub use reader::{ClassFile, CodeInfo, FieldInfo, InnerClassInfo, MethodInfo};
pub use writer::{ClassVersion, ClassWriter};

/// The class-file magic number.
pub const MAGIC: u32 = 0xCAFE_BABE;

/// Internal name of `java.lang.Object`.
pub const OBJECT_CLASS: &str = "java/lang/Object";
