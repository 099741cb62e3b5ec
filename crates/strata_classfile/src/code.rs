//! The bytecode subset used by generated method bodies.

use crate::error::ClassFileError;
use crate::pool::ConstantPool;

pub(crate) mod opcode {
    pub(crate) const ICONST_M1: u8 = 0x02;
    pub(crate) const ICONST_0: u8 = 0x03;
    pub(crate) const ICONST_5: u8 = 0x08;
    pub(crate) const BIPUSH: u8 = 0x10;
    pub(crate) const SIPUSH: u8 = 0x11;
    pub(crate) const LDC: u8 = 0x12;
    pub(crate) const LDC_W: u8 = 0x13;
    pub(crate) const ALOAD_0: u8 = 0x2a;
    pub(crate) const IASTORE: u8 = 0x4f;
    pub(crate) const DUP: u8 = 0x59;
    pub(crate) const RETURN: u8 = 0xb1;
    pub(crate) const PUTSTATIC: u8 = 0xb3;
    pub(crate) const INVOKESPECIAL: u8 = 0xb7;
    pub(crate) const NEWARRAY: u8 = 0xbc;

    /// `atype` operand of `newarray` for `int[]`.
    pub(crate) const T_INT: u8 = 10;
}

/// A single JVM instruction.
///
/// Symbolic operands are resolved against the class's constant pool when the
/// method is added to a [`ClassWriter`](crate::ClassWriter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Pushes an `int`, choosing the shortest encoding.
    PushInt(i32),
    /// `aload_0`
    LoadThis,
    /// `newarray int`
    NewIntArray,
    /// `dup`
    Dup,
    /// `iastore`
    StoreIntElement,
    /// `putstatic owner.name:descriptor`
    PutStatic {
        /// Internal name of the owning class.
        owner: String,
        /// Field name.
        name: String,
        /// Field descriptor.
        descriptor: String,
    },
    /// `invokespecial owner.name:descriptor`
    InvokeSpecial {
        /// Internal name of the owning class.
        owner: String,
        /// Method name.
        name: String,
        /// Method descriptor.
        descriptor: String,
    },
    /// `return`
    Return,
}

impl Instruction {
    pub(crate) fn encode(
        &self,
        pool: &mut ConstantPool,
        out: &mut Vec<u8>,
    ) -> Result<(), ClassFileError> {
        match self {
            Self::PushInt(value) => push_int(*value, pool, out)?,
            Self::LoadThis => out.push(opcode::ALOAD_0),
            Self::NewIntArray => out.extend_from_slice(&[opcode::NEWARRAY, opcode::T_INT]),
            Self::Dup => out.push(opcode::DUP),
            Self::StoreIntElement => out.push(opcode::IASTORE),
            Self::PutStatic {
                owner,
                name,
                descriptor,
            } => {
                let idx = pool.field_ref(owner, name, descriptor)?;
                out.push(opcode::PUTSTATIC);
                out.extend_from_slice(&idx.to_be_bytes());
            }
            Self::InvokeSpecial {
                owner,
                name,
                descriptor,
            } => {
                let idx = pool.method_ref(owner, name, descriptor)?;
                out.push(opcode::INVOKESPECIAL);
                out.extend_from_slice(&idx.to_be_bytes());
            }
            Self::Return => out.push(opcode::RETURN),
        }
        Ok(())
    }
}

fn push_int(value: i32, pool: &mut ConstantPool, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
    match value {
        -1..=5 => out.push((i32::from(opcode::ICONST_0) + value) as u8),
        -128..=127 => out.extend_from_slice(&[opcode::BIPUSH, value as i8 as u8]),
        -32768..=32767 => {
            out.push(opcode::SIPUSH);
            out.extend_from_slice(&(value as i16).to_be_bytes());
        }
        _ => {
            let idx = pool.integer(value)?;
            match u8::try_from(idx) {
                Ok(short) => out.extend_from_slice(&[opcode::LDC, short]),
                Err(_) => {
                    out.push(opcode::LDC_W);
                    out.extend_from_slice(&idx.to_be_bytes());
                }
            }
        }
    }
    Ok(())
}
