use core::ops::{BitOr, BitOrAssign};

/// Class, field and method access flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessFlags(u16);

impl AccessFlags {
    /// No flags.
    pub const NONE: Self = Self(0);
    /// `ACC_PUBLIC`
    pub const PUBLIC: Self = Self(0x0001);
    /// `ACC_PRIVATE`
    pub const PRIVATE: Self = Self(0x0002);
    /// `ACC_PROTECTED`
    pub const PROTECTED: Self = Self(0x0004);
    /// `ACC_STATIC`
    pub const STATIC: Self = Self(0x0008);
    /// `ACC_FINAL`
    pub const FINAL: Self = Self(0x0010);
    /// `ACC_SUPER` (classes only; shares its bit with `ACC_SYNCHRONIZED`).
    pub const SUPER: Self = Self(0x0020);

    /// Wraps raw flag bits.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw flag bits.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Returns true if every flag in `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
