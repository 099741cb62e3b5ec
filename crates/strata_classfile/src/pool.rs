//! Constant pool construction with entry deduplication.

use hashbrown::HashMap;

use crate::error::ClassFileError;
use crate::mutf8;

/// Largest valid `constant_pool_count` is 65535, so at most 65534 slots.
const MAX_SLOTS: usize = u16::MAX as usize - 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Constant {
    Utf8(String),
    Integer(i32),
    Class(u16),
    NameAndType(u16, u16),
    Fieldref(u16, u16),
    Methodref(u16, u16),
}

impl Constant {
    fn tag(&self) -> u8 {
        match self {
            Self::Utf8(_) => 1,
            Self::Integer(_) => 3,
            Self::Class(_) => 7,
            Self::Fieldref(..) => 9,
            Self::Methodref(..) => 10,
            Self::NameAndType(..) => 12,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
    index: HashMap<Constant, u16>,
}

impl ConstantPool {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        if let Some(&idx) = self.index.get(&constant) {
            return Ok(idx);
        }
        if self.entries.len() >= MAX_SLOTS {
            return Err(ClassFileError::ConstantPoolOverflow { max: MAX_SLOTS });
        }
        // Slot 0 is reserved; the first entry is index 1.
        let idx = (self.entries.len() + 1) as u16;
        self.entries.push(constant.clone());
        self.index.insert(constant, idx);
        Ok(idx)
    }

    pub(crate) fn utf8(&mut self, value: &str) -> Result<u16, ClassFileError> {
        self.intern(Constant::Utf8(value.to_string()))
    }

    pub(crate) fn integer(&mut self, value: i32) -> Result<u16, ClassFileError> {
        self.intern(Constant::Integer(value))
    }

    pub(crate) fn class(&mut self, internal_name: &str) -> Result<u16, ClassFileError> {
        let name = self.utf8(internal_name)?;
        self.intern(Constant::Class(name))
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16, ClassFileError> {
        let name = self.utf8(name)?;
        let descriptor = self.utf8(descriptor)?;
        self.intern(Constant::NameAndType(name, descriptor))
    }

    pub(crate) fn field_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.intern(Constant::Fieldref(class, nat))
    }

    pub(crate) fn method_ref(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        let class = self.class(owner)?;
        let nat = self.name_and_type(name, descriptor)?;
        self.intern(Constant::Methodref(class, nat))
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        out.extend_from_slice(&((self.entries.len() + 1) as u16).to_be_bytes());
        for entry in &self.entries {
            out.push(entry.tag());
            match entry {
                Constant::Utf8(value) => {
                    let bytes = mutf8::encode(value);
                    let len = u16::try_from(bytes.len())
                        .map_err(|_| ClassFileError::StringTooLong { len: bytes.len() })?;
                    out.extend_from_slice(&len.to_be_bytes());
                    out.extend_from_slice(&bytes);
                }
                Constant::Integer(value) => out.extend_from_slice(&value.to_be_bytes()),
                Constant::Class(name) => out.extend_from_slice(&name.to_be_bytes()),
                Constant::NameAndType(a, b) | Constant::Fieldref(a, b) | Constant::Methodref(a, b) => {
                    out.extend_from_slice(&a.to_be_bytes());
                    out.extend_from_slice(&b.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_deduplicated() {
        let mut pool = ConstantPool::new();
        let a = pool.class("java/lang/Object").unwrap();
        let b = pool.class("java/lang/Object").unwrap();
        assert_eq!(a, b);
        // Utf8 + Class
        assert_eq!(pool.entries.len(), 2);
        assert_eq!(pool.utf8("java/lang/Object").unwrap(), 1);
    }

    #[test]
    fn field_ref_shares_class_and_name_entries() {
        let mut pool = ConstantPool::new();
        let first = pool.field_ref("p/R$styleable", "View", "[I").unwrap();
        let second = pool.field_ref("p/R$styleable", "View", "[I").unwrap();
        assert_eq!(first, second);
        let again = pool.class("p/R$styleable").unwrap();
        assert!(again < first);
    }

    #[test]
    fn overflow_is_reported() {
        let mut pool = ConstantPool::new();
        for value in 0..MAX_SLOTS as i32 {
            pool.integer(value).unwrap();
        }
        assert_eq!(
            pool.integer(-1),
            Err(ClassFileError::ConstantPoolOverflow { max: MAX_SLOTS })
        );
    }
}
