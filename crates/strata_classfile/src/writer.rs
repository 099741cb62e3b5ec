//! Class serialization.

use crate::access::AccessFlags;
use crate::code::Instruction;
use crate::error::ClassFileError;
use crate::pool::ConstantPool;
use crate::MAGIC;

const MAX_CODE_LEN: usize = u16::MAX as usize;

/// Class-file format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl ClassVersion {
    /// Java 6 (`50.0`), the oldest version layout renderers still load.
    /// Classes at this version need no `StackMapTable`.
    pub const JAVA_6: Self = Self {
        major: 50,
        minor: 0,
    };
}

struct Attribute {
    name: u16,
    data: Vec<u8>,
}

struct Member {
    access: AccessFlags,
    name: u16,
    descriptor: u16,
    attributes: Vec<Attribute>,
}

struct InnerClass {
    inner: u16,
    outer: u16,
    simple_name: u16,
    access: AccessFlags,
}

/// Assembles a class file.
///
/// Names are JVM internal names (`com/example/R$string`). Members are
/// written in insertion order.
pub struct ClassWriter {
    version: ClassVersion,
    access: AccessFlags,
    this_name: String,
    super_name: String,
    pool: ConstantPool,
    fields: Vec<Member>,
    methods: Vec<Member>,
    inner_classes: Vec<InnerClass>,
}

impl ClassWriter {
    /// Starts a class with the given name and superclass.
    #[must_use]
    pub fn new(
        version: ClassVersion,
        access: AccessFlags,
        this_name: impl Into<String>,
        super_name: impl Into<String>,
    ) -> Self {
        Self {
            version,
            access,
            this_name: this_name.into(),
            super_name: super_name.into(),
            pool: ConstantPool::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
        }
    }

    /// Returns the internal name of the class being written.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.this_name
    }

    /// Adds a field without an initial value.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::ConstantPoolOverflow`] if the pool is full.
    pub fn add_field(
        &mut self,
        access: AccessFlags,
        name: &str,
        descriptor: &str,
    ) -> Result<(), ClassFileError> {
        let member = Member {
            access,
            name: self.pool.utf8(name)?,
            descriptor: self.pool.utf8(descriptor)?,
            attributes: Vec::new(),
        };
        self.fields.push(member);
        Ok(())
    }

    /// Adds an `int` field with a `ConstantValue` attribute.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::ConstantPoolOverflow`] if the pool is full.
    pub fn add_int_constant(
        &mut self,
        access: AccessFlags,
        name: &str,
        value: i32,
    ) -> Result<(), ClassFileError> {
        let attribute = Attribute {
            name: self.pool.utf8("ConstantValue")?,
            data: self.pool.integer(value)?.to_be_bytes().to_vec(),
        };
        let member = Member {
            access,
            name: self.pool.utf8(name)?,
            descriptor: self.pool.utf8("I")?,
            attributes: vec![attribute],
        };
        self.fields.push(member);
        Ok(())
    }

    /// Adds a method with a `Code` attribute.
    ///
    /// # Errors
    ///
    /// - [`ClassFileError::ConstantPoolOverflow`] if the pool is full
    /// - [`ClassFileError::CodeTooLarge`] if the body exceeds 64 KiB
    pub fn add_method(
        &mut self,
        access: AccessFlags,
        name: &str,
        descriptor: &str,
        max_stack: u16,
        max_locals: u16,
        body: &[Instruction],
    ) -> Result<(), ClassFileError> {
        let mut code = Vec::new();
        for insn in body {
            insn.encode(&mut self.pool, &mut code)?;
        }
        if code.len() > MAX_CODE_LEN {
            return Err(ClassFileError::CodeTooLarge {
                method: name.to_string(),
                len: code.len(),
            });
        }

        let mut data = Vec::with_capacity(code.len() + 12);
        data.extend_from_slice(&max_stack.to_be_bytes());
        data.extend_from_slice(&max_locals.to_be_bytes());
        data.extend_from_slice(&(code.len() as u32).to_be_bytes());
        data.extend_from_slice(&code);
        // exception_table_length, attributes_count
        data.extend_from_slice(&[0, 0, 0, 0]);

        let member = Member {
            access,
            name: self.pool.utf8(name)?,
            descriptor: self.pool.utf8(descriptor)?,
            attributes: vec![Attribute {
                name: self.pool.utf8("Code")?,
                data,
            }],
        };
        self.methods.push(member);
        Ok(())
    }

    /// Adds a public no-argument constructor that calls the superclass one.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::ConstantPoolOverflow`] if the pool is full.
    pub fn add_default_constructor(&mut self) -> Result<(), ClassFileError> {
        let body = [
            Instruction::LoadThis,
            Instruction::InvokeSpecial {
                owner: self.super_name.clone(),
                name: "<init>".to_string(),
                descriptor: "()V".to_string(),
            },
            Instruction::Return,
        ];
        self.add_method(AccessFlags::PUBLIC, "<init>", "()V", 1, 1, &body)
    }

    /// Adds a `<clinit>` that assigns each named static `int[]` field of this
    /// class a freshly built array.
    ///
    /// The fields themselves must be added separately with descriptor `[I`.
    ///
    /// # Errors
    ///
    /// - [`ClassFileError::ConstantPoolOverflow`] if the pool is full
    /// - [`ClassFileError::CodeTooLarge`] if the arrays do not fit one method
    /// - [`ClassFileError::TooManyMembers`] if an array is longer than `i32::MAX`
    pub fn add_int_array_initializer<'a, I>(&mut self, arrays: I) -> Result<(), ClassFileError>
    where
        I: IntoIterator<Item = (&'a str, &'a [i32])>,
    {
        let mut body = Vec::new();
        for (field, values) in arrays {
            body.push(Instruction::PushInt(count_i32(values.len(), "array elements")?));
            body.push(Instruction::NewIntArray);
            for (index, value) in values.iter().enumerate() {
                body.push(Instruction::Dup);
                body.push(Instruction::PushInt(count_i32(index, "array elements")?));
                body.push(Instruction::PushInt(*value));
                body.push(Instruction::StoreIntElement);
            }
            body.push(Instruction::PutStatic {
                owner: self.this_name.clone(),
                name: field.to_string(),
                descriptor: "[I".to_string(),
            });
        }
        body.push(Instruction::Return);
        // arrayref, arrayref, index, value
        self.add_method(AccessFlags::STATIC, "<clinit>", "()V", 4, 0, &body)
    }

    /// Records an `InnerClasses` entry.
    ///
    /// # Errors
    ///
    /// Returns [`ClassFileError::ConstantPoolOverflow`] if the pool is full.
    pub fn add_inner_class(
        &mut self,
        inner: &str,
        outer: &str,
        simple_name: &str,
        access: AccessFlags,
    ) -> Result<(), ClassFileError> {
        let entry = InnerClass {
            inner: self.pool.class(inner)?,
            outer: self.pool.class(outer)?,
            simple_name: self.pool.utf8(simple_name)?,
            access,
        };
        self.inner_classes.push(entry);
        Ok(())
    }

    /// Serializes the class.
    ///
    /// # Errors
    ///
    /// - [`ClassFileError::ConstantPoolOverflow`] if the pool is full
    /// - [`ClassFileError::TooManyMembers`] if a member table exceeds 65535 entries
    /// - [`ClassFileError::StringTooLong`] if a name does not fit a constant
    pub fn finish(mut self) -> Result<Vec<u8>, ClassFileError> {
        let this_class = self.pool.class(&self.this_name)?;
        let super_class = self.pool.class(&self.super_name)?;
        let inner_classes_attr = if self.inner_classes.is_empty() {
            None
        } else {
            Some(self.pool.utf8("InnerClasses")?)
        };

        let mut body = Vec::new();
        body.extend_from_slice(&self.access.bits().to_be_bytes());
        body.extend_from_slice(&this_class.to_be_bytes());
        body.extend_from_slice(&super_class.to_be_bytes());
        // interfaces_count
        body.extend_from_slice(&[0, 0]);
        write_members(&mut body, &self.fields, "fields")?;
        write_members(&mut body, &self.methods, "methods")?;

        match inner_classes_attr {
            Some(name) => {
                let count = count_u16(self.inner_classes.len(), "inner classes")?;
                body.extend_from_slice(&1u16.to_be_bytes());
                body.extend_from_slice(&name.to_be_bytes());
                body.extend_from_slice(&(2 + 8 * u32::from(count)).to_be_bytes());
                body.extend_from_slice(&count.to_be_bytes());
                for entry in &self.inner_classes {
                    body.extend_from_slice(&entry.inner.to_be_bytes());
                    body.extend_from_slice(&entry.outer.to_be_bytes());
                    body.extend_from_slice(&entry.simple_name.to_be_bytes());
                    body.extend_from_slice(&entry.access.bits().to_be_bytes());
                }
            }
            None => body.extend_from_slice(&[0, 0]),
        }

        let mut out = Vec::with_capacity(body.len() + 256);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.version.minor.to_be_bytes());
        out.extend_from_slice(&self.version.major.to_be_bytes());
        self.pool.write(&mut out)?;
        out.extend_from_slice(&body);
        Ok(out)
    }
}

fn count_u16(count: usize, what: &'static str) -> Result<u16, ClassFileError> {
    u16::try_from(count).map_err(|_| ClassFileError::TooManyMembers { what, count })
}

/// `count` as a JVM `int` operand.
fn count_i32(count: usize, what: &'static str) -> Result<i32, ClassFileError> {
    i32::try_from(count).map_err(|_| ClassFileError::TooManyMembers { what, count })
}

fn write_members(
    out: &mut Vec<u8>,
    members: &[Member],
    what: &'static str,
) -> Result<(), ClassFileError> {
    out.extend_from_slice(&count_u16(members.len(), what)?.to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access.bits().to_be_bytes());
        out.extend_from_slice(&member.name.to_be_bytes());
        out.extend_from_slice(&member.descriptor.to_be_bytes());
        out.extend_from_slice(&count_u16(member.attributes.len(), "attributes")?.to_be_bytes());
        for attribute in &member.attributes {
            let len = u32::try_from(attribute.data.len()).map_err(|_| {
                ClassFileError::TooManyMembers {
                    what: "attribute bytes",
                    count: attribute.data.len(),
                }
            })?;
            out.extend_from_slice(&attribute.name.to_be_bytes());
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&attribute.data);
        }
    }
    Ok(())
}
