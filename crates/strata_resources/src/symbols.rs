//! Library symbol manifests (`R.txt`).
//!
//! One declaration per line:
//!
//! ```text
//! int attr layout_gravity 0x7f010001
//! int[] styleable GridLayout_Layout { 0x010100f4, 0x010100f5, 0x7f010000, 0x7f010001 }
//! int styleable GridLayout_Layout_layout_gravity 3
//! ```

use hashbrown::HashMap;
use indexmap::IndexMap;

use crate::model::ResourceType;

/// Parsed contents of a symbol manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    ids: IndexMap<(ResourceType, String), i32>,
    styleables: IndexMap<String, Vec<i32>>,
}

impl SymbolTable {
    /// Parses manifest text. Lines that do not follow the format are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut table = Self::default();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if table.parse_line(line).is_none() {
                tracing::debug!(line = number + 1, content = line, "skipping malformed symbol");
            }
        }
        table
    }

    fn parse_line(&mut self, line: &str) -> Option<()> {
        let mut parts = line.splitn(4, char::is_whitespace);
        let kind = parts.next()?;
        let ty = ResourceType::from_name(parts.next()?)?;
        let name = parts.next()?.to_string();
        let rest = parts.next()?.trim();

        match kind {
            "int" => {
                let value = parse_int(rest)?;
                self.ids.insert((ty, name), value);
            }
            "int[]" if ty == ResourceType::Styleable => {
                let body = rest.strip_prefix('{')?.strip_suffix('}')?.trim();
                let values = if body.is_empty() {
                    Vec::new()
                } else {
                    body.split(',')
                        .map(|v| parse_int(v.trim()))
                        .collect::<Option<Vec<_>>>()?
                };
                self.styleables.insert(name, values);
            }
            _ => return None,
        }
        Some(())
    }

    /// Scalar id of `(ty, name)`.
    #[must_use]
    pub fn id(&self, ty: ResourceType, name: &str) -> Option<i32> {
        self.ids.get(&(ty, name.to_string())).copied()
    }

    /// All scalar entries in file order.
    pub fn ids(&self) -> impl Iterator<Item = (ResourceType, &str, i32)> {
        self.ids
            .iter()
            .map(|((ty, name), value)| (*ty, name.as_str(), *value))
    }

    /// Names declared with type `ty`, in file order.
    pub fn names(&self, ty: ResourceType) -> impl Iterator<Item = &str> {
        self.ids
            .keys()
            .filter(move |(t, _)| *t == ty)
            .map(|(_, name)| name.as_str())
    }

    /// All styleable arrays in file order.
    pub fn styleables(&self) -> impl Iterator<Item = (&str, &[i32])> {
        self.styleables
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Raw array of a styleable.
    #[must_use]
    pub fn styleable(&self, name: &str) -> Option<&[i32]> {
        self.styleables.get(name).map(Vec::as_slice)
    }

    /// Resolves the attribute ids of styleable `name` in the order of `attrs`.
    ///
    /// Each attribute's slot in the declared array comes from the
    /// `<name>_<attr>` index entry (`:` becomes `_`). Attributes without an
    /// index entry, or with an index outside the array, yield `0`.
    /// Returns `None` if the manifest does not declare the styleable.
    #[must_use]
    pub fn declared_styleable(&self, name: &str, attrs: &[String]) -> Option<Vec<i32>> {
        let array = self.styleable(name)?;
        let indices: HashMap<&str, i32> = self
            .ids
            .iter()
            .filter(|((ty, _), _)| *ty == ResourceType::Styleable)
            .filter_map(|((_, field), index)| {
                field
                    .strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|attr| (attr, *index))
            })
            .collect();

        let values = attrs
            .iter()
            .map(|attr| {
                indices
                    .get(attr.replace(':', "_").as_str())
                    .and_then(|index| usize::try_from(*index).ok())
                    .and_then(|index| array.get(index).copied())
                    .unwrap_or(0)
            })
            .collect();
        Some(values)
    }

    /// Returns true if the manifest declared nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.styleables.is_empty()
    }
}

fn parse_int(text: &str) -> Option<i32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok().map(|v| v as i32),
        None => text.parse().ok(),
    }
}
