//! Class parsing.
//!
//! Reads the structural parts of any class file (pool, members, inner class
//! table) and interprets the straight-line `<clinit>` bodies produced by
//! [`ClassWriter::add_int_array_initializer`](crate::ClassWriter::add_int_array_initializer).

use crate::access::AccessFlags;
use crate::code::opcode;
use crate::error::ClassFileError;
use crate::mutf8;
use crate::writer::ClassVersion;
use crate::MAGIC;

#[derive(Debug, Clone)]
enum PoolEntry {
    /// Slot 0 and the second slot of `Long`/`Double`.
    Unusable,
    Utf8(String),
    Integer(i32),
    Class(u16),
    NameAndType(u16, u16),
    Fieldref(u16, u16),
    Other,
}

/// A parsed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// Access flags.
    pub access: AccessFlags,
    /// Field name.
    pub name: String,
    /// Field descriptor, e.g. `I` or `[I`.
    pub descriptor: String,
    /// Value of an `int` `ConstantValue` attribute, if present.
    pub constant_value: Option<i32>,
}

/// The `Code` attribute of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeInfo {
    /// Maximum operand stack depth.
    pub max_stack: u16,
    /// Number of local variable slots.
    pub max_locals: u16,
    /// Raw bytecode.
    pub bytecode: Vec<u8>,
}

/// A parsed method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    /// Access flags.
    pub access: AccessFlags,
    /// Method name.
    pub name: String,
    /// Method descriptor, e.g. `()V`.
    pub descriptor: String,
    /// Body, absent for abstract and native methods.
    pub code: Option<CodeInfo>,
}

/// One row of the `InnerClasses` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    /// Internal name of the nested class.
    pub inner: String,
    /// Internal name of the enclosing class, if a member class.
    pub outer: Option<String>,
    /// Simple name, absent for anonymous classes.
    pub simple_name: Option<String>,
    /// Flags as declared in source.
    pub access: AccessFlags,
}

/// A parsed class file.
#[derive(Debug, Clone)]
pub struct ClassFile {
    /// Format version.
    pub version: ClassVersion,
    /// Class access flags.
    pub access: AccessFlags,
    /// Internal name of this class.
    pub this_class: String,
    /// Internal name of the superclass, absent only for `java/lang/Object`.
    pub super_class: Option<String>,
    /// Internal names of implemented interfaces.
    pub interfaces: Vec<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldInfo>,
    /// Methods in declaration order.
    pub methods: Vec<MethodInfo>,
    /// Contents of the `InnerClasses` attribute.
    pub inner_classes: Vec<InnerClassInfo>,
    pool: Vec<PoolEntry>,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassFileError::UnexpectedEof { offset: self.pos })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.bytes(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, ClassFileError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32, ClassFileError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

impl ClassFile {
    /// Parses a class file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is truncated, has the wrong magic number,
    /// contains an unknown constant tag or references the pool inconsistently.
    pub fn parse(data: &[u8]) -> Result<Self, ClassFileError> {
        let mut cur = Cursor::new(data);
        let magic = cur.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic(magic));
        }
        let minor = cur.u16()?;
        let major = cur.u16()?;
        let pool = read_pool(&mut cur)?;

        let access = AccessFlags::from_bits(cur.u16()?);
        let this_class = class_name(&pool, cur.u16()?)?;
        let super_class = match cur.u16()? {
            0 => None,
            idx => Some(class_name(&pool, idx)?),
        };

        let interface_count = cur.u16()?;
        let mut interfaces = Vec::with_capacity(usize::from(interface_count));
        for _ in 0..interface_count {
            interfaces.push(class_name(&pool, cur.u16()?)?);
        }

        let field_count = cur.u16()?;
        let mut fields = Vec::with_capacity(usize::from(field_count));
        for _ in 0..field_count {
            fields.push(read_field(&mut cur, &pool)?);
        }

        let method_count = cur.u16()?;
        let mut methods = Vec::with_capacity(usize::from(method_count));
        for _ in 0..method_count {
            methods.push(read_method(&mut cur, &pool)?);
        }

        let mut inner_classes = Vec::new();
        let attribute_count = cur.u16()?;
        for _ in 0..attribute_count {
            let name = utf8(&pool, cur.u16()?)?;
            let len = cur.u32()? as usize;
            let data = cur.bytes(len)?;
            if name == "InnerClasses" {
                inner_classes = read_inner_classes(data, &pool)?;
            }
        }

        Ok(Self {
            version: ClassVersion { major, minor },
            access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            inner_classes,
            pool,
        })
    }

    /// Finds a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Finds a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Runs the class initializer and returns every `int[]` it stores into a
    /// static field, in assignment order.
    ///
    /// Only straight-line code built from int pushes, `newarray int`, `dup`,
    /// `iastore`, `putstatic` and `return` is understood. A class without a
    /// `<clinit>` yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::UnsupportedOpcode`] or
    /// [`ClassFileError::MalformedCode`] for anything else.
    pub fn static_int_arrays(&self) -> Result<Vec<(String, Vec<i32>)>, ClassFileError> {
        let Some(code) = self.method("<clinit>").and_then(|m| m.code.as_ref()) else {
            return Ok(Vec::new());
        };
        run_initializer(&code.bytecode, &self.pool)
    }
}

fn read_pool(cur: &mut Cursor<'_>) -> Result<Vec<PoolEntry>, ClassFileError> {
    let count = cur.u16()?;
    let mut pool = Vec::with_capacity(usize::from(count));
    pool.push(PoolEntry::Unusable);
    let mut index: u16 = 1;
    while index < count {
        let tag = cur.u8()?;
        let entry = match tag {
            1 => {
                let len = cur.u16()?;
                let raw = cur.bytes(usize::from(len))?;
                PoolEntry::Utf8(
                    mutf8::decode(raw).ok_or(ClassFileError::MalformedUtf8 { index })?,
                )
            }
            3 => PoolEntry::Integer(cur.u32()? as i32),
            4 => {
                cur.bytes(4)?;
                PoolEntry::Other
            }
            5 | 6 => {
                cur.bytes(8)?;
                pool.push(PoolEntry::Other);
                index += 1;
                PoolEntry::Unusable
            }
            7 => PoolEntry::Class(cur.u16()?),
            9 => PoolEntry::Fieldref(cur.u16()?, cur.u16()?),
            12 => PoolEntry::NameAndType(cur.u16()?, cur.u16()?),
            8 | 16 | 19 | 20 => {
                cur.bytes(2)?;
                PoolEntry::Other
            }
            10 | 11 | 17 | 18 => {
                cur.bytes(4)?;
                PoolEntry::Other
            }
            15 => {
                cur.bytes(3)?;
                PoolEntry::Other
            }
            _ => return Err(ClassFileError::UnknownConstant { tag, index }),
        };
        pool.push(entry);
        index += 1;
    }
    Ok(pool)
}

fn utf8(pool: &[PoolEntry], index: u16) -> Result<String, ClassFileError> {
    match pool.get(usize::from(index)) {
        Some(PoolEntry::Utf8(value)) => Ok(value.clone()),
        _ => Err(ClassFileError::BadConstantRef {
            index,
            expected: "Utf8",
        }),
    }
}

fn class_name(pool: &[PoolEntry], index: u16) -> Result<String, ClassFileError> {
    match pool.get(usize::from(index)) {
        Some(PoolEntry::Class(name)) => utf8(pool, *name),
        _ => Err(ClassFileError::BadConstantRef {
            index,
            expected: "Class",
        }),
    }
}

fn optional_class_name(pool: &[PoolEntry], index: u16) -> Result<Option<String>, ClassFileError> {
    match index {
        0 => Ok(None),
        idx => class_name(pool, idx).map(Some),
    }
}

fn read_field(cur: &mut Cursor<'_>, pool: &[PoolEntry]) -> Result<FieldInfo, ClassFileError> {
    let access = AccessFlags::from_bits(cur.u16()?);
    let name = utf8(pool, cur.u16()?)?;
    let descriptor = utf8(pool, cur.u16()?)?;
    let mut constant_value = None;

    for _ in 0..cur.u16()? {
        let attr_name = utf8(pool, cur.u16()?)?;
        let len = cur.u32()? as usize;
        let data = cur.bytes(len)?;
        if attr_name == "ConstantValue" && data.len() == 2 {
            let idx = u16::from_be_bytes([data[0], data[1]]);
            if let Some(PoolEntry::Integer(value)) = pool.get(usize::from(idx)) {
                constant_value = Some(*value);
            }
        }
    }

    Ok(FieldInfo {
        access,
        name,
        descriptor,
        constant_value,
    })
}

fn read_method(cur: &mut Cursor<'_>, pool: &[PoolEntry]) -> Result<MethodInfo, ClassFileError> {
    let access = AccessFlags::from_bits(cur.u16()?);
    let name = utf8(pool, cur.u16()?)?;
    let descriptor = utf8(pool, cur.u16()?)?;
    let mut code = None;

    for _ in 0..cur.u16()? {
        let attr_name = utf8(pool, cur.u16()?)?;
        let len = cur.u32()? as usize;
        let data = cur.bytes(len)?;
        if attr_name == "Code" {
            let mut body = Cursor::new(data);
            let max_stack = body.u16()?;
            let max_locals = body.u16()?;
            let code_len = body.u32()? as usize;
            let bytecode = body.bytes(code_len)?.to_vec();
            code = Some(CodeInfo {
                max_stack,
                max_locals,
                bytecode,
            });
        }
    }

    Ok(MethodInfo {
        access,
        name,
        descriptor,
        code,
    })
}

fn read_inner_classes(
    data: &[u8],
    pool: &[PoolEntry],
) -> Result<Vec<InnerClassInfo>, ClassFileError> {
    let mut cur = Cursor::new(data);
    let count = cur.u16()?;
    let mut out = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        let inner = class_name(pool, cur.u16()?)?;
        let outer = optional_class_name(pool, cur.u16()?)?;
        let simple_name = match cur.u16()? {
            0 => None,
            idx => Some(utf8(pool, idx)?),
        };
        let access = AccessFlags::from_bits(cur.u16()?);
        out.push(InnerClassInfo {
            inner,
            outer,
            simple_name,
            access,
        });
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy)]
enum Value {
    Int(i32),
    Array(usize),
}

fn run_initializer(
    code: &[u8],
    pool: &[PoolEntry],
) -> Result<Vec<(String, Vec<i32>)>, ClassFileError> {
    let mut cur = Cursor::new(code);
    let mut stack: Vec<Value> = Vec::new();
    let mut arrays: Vec<Vec<i32>> = Vec::new();
    let mut stored = Vec::new();

    let malformed = |pc: usize, reason: &'static str| ClassFileError::MalformedCode { pc, reason };

    while cur.pos < code.len() {
        let pc = cur.pos;
        let op = cur.u8()?;
        match op {
            opcode::ICONST_M1..=opcode::ICONST_5 => {
                stack.push(Value::Int(i32::from(op) - i32::from(opcode::ICONST_0)));
            }
            opcode::BIPUSH => stack.push(Value::Int(i32::from(cur.u8()? as i8))),
            opcode::SIPUSH => stack.push(Value::Int(i32::from(cur.u16()? as i16))),
            opcode::LDC | opcode::LDC_W => {
                let idx = if op == opcode::LDC {
                    u16::from(cur.u8()?)
                } else {
                    cur.u16()?
                };
                match pool.get(usize::from(idx)) {
                    Some(PoolEntry::Integer(value)) => stack.push(Value::Int(*value)),
                    _ => {
                        return Err(ClassFileError::BadConstantRef {
                            index: idx,
                            expected: "Integer",
                        });
                    }
                }
            }
            opcode::NEWARRAY => {
                if cur.u8()? != opcode::T_INT {
                    return Err(ClassFileError::UnsupportedOpcode { opcode: op, pc });
                }
                let Some(Value::Int(len)) = stack.pop() else {
                    return Err(malformed(pc, "newarray expects an int length"));
                };
                let len = usize::try_from(len).map_err(|_| malformed(pc, "negative array size"))?;
                arrays.push(vec![0; len]);
                stack.push(Value::Array(arrays.len() - 1));
            }
            opcode::DUP => {
                let top = *stack.last().ok_or(malformed(pc, "dup on empty stack"))?;
                stack.push(top);
            }
            opcode::IASTORE => {
                let (Some(Value::Int(value)), Some(Value::Int(index)), Some(Value::Array(array))) =
                    (stack.pop(), stack.pop(), stack.pop())
                else {
                    return Err(malformed(pc, "iastore expects arrayref, index, value"));
                };
                let slot = usize::try_from(index)
                    .ok()
                    .and_then(|i| arrays[array].get_mut(i))
                    .ok_or(malformed(pc, "array index out of bounds"))?;
                *slot = value;
            }
            opcode::PUTSTATIC => {
                let idx = cur.u16()?;
                let name = field_ref_name(pool, idx)?;
                let Some(Value::Array(array)) = stack.pop() else {
                    return Err(malformed(pc, "putstatic expects an int array"));
                };
                stored.push((name, arrays[array].clone()));
            }
            opcode::RETURN => break,
            _ => return Err(ClassFileError::UnsupportedOpcode { opcode: op, pc }),
        }
    }
    Ok(stored)
}

fn field_ref_name(pool: &[PoolEntry], index: u16) -> Result<String, ClassFileError> {
    let bad = |index, expected| ClassFileError::BadConstantRef { index, expected };
    let Some(PoolEntry::Fieldref(_, nat)) = pool.get(usize::from(index)) else {
        return Err(bad(index, "Fieldref"));
    };
    let Some(PoolEntry::NameAndType(name, _)) = pool.get(usize::from(*nat)) else {
        return Err(bad(*nat, "NameAndType"));
    };
    utf8(pool, *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_input_reports_offset() {
        let err = ClassFile::parse(&[0xCA, 0xFE]).unwrap_err();
        assert_eq!(err, ClassFileError::UnexpectedEof { offset: 0 });
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let err = ClassFile::parse(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 50]).unwrap_err();
        assert_eq!(err, ClassFileError::BadMagic(0xDEAD_BEEF));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut bytes = MAGIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 50, 0, 2, 99]);
        let err = ClassFile::parse(&bytes).unwrap_err();
        assert_eq!(err, ClassFileError::UnknownConstant { tag: 99, index: 1 });
    }

    #[test]
    fn wide_constants_take_two_slots() {
        let mut bytes = MAGIC.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 50]);
        // count 4: Long (slots 1-2), Utf8 "A" (slot 3)
        bytes.extend_from_slice(&[0, 4, 5, 0, 0, 0, 0, 0, 0, 0, 1, 1, 0, 1, b'A']);
        let mut cur = Cursor::new(&bytes[8..]);
        let pool = read_pool(&mut cur).unwrap();
        assert_eq!(pool.len(), 4);
        assert_eq!(utf8(&pool, 3).unwrap(), "A");
        assert!(utf8(&pool, 2).is_err());
    }

    #[test]
    fn interpreter_rejects_unknown_opcodes() {
        let err = run_initializer(&[0x00], &[PoolEntry::Unusable]).unwrap_err();
        assert_eq!(err, ClassFileError::UnsupportedOpcode { opcode: 0, pc: 0 });
    }

    #[test]
    fn interpreter_rejects_out_of_bounds_stores() {
        // iconst_1, newarray int, iconst_2, iconst_0, iastore
        let code = [0x04, 0xbc, 10, 0x05, 0x03, 0x4f];
        let err = run_initializer(&code, &[PoolEntry::Unusable]).unwrap_err();
        assert!(matches!(err, ClassFileError::MalformedCode { pc: 5, .. }));
    }
}
