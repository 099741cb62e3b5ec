//! Accessor class generation.
//!
//! For a package `p` the generator produces:
//!
//! - `p.R`, an empty holder listing one nested class per resource type present
//! - `p.R$<type>`, one `public static final int` per resource, valued by
//!   [`AppRepository::resource_id`]
//! - `p.R$styleable`, one `int[]` per styleable filled in `<clinit>`, plus an
//!   `int` index constant per attribute (`<Styleable>_<attr>`)
//!
//! `R$id` lists every id the app knows of, including ids only declared in
//! library symbol manifests. `R$attr` skips framework (`android:`) attributes.

use hashbrown::{HashMap, HashSet};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use strata_classfile::{AccessFlags, ClassFileError, ClassVersion, ClassWriter, OBJECT_CLASS};

use crate::app::AppRepository;
use crate::model::{ResourceType, ResourceValue};

const CLASS_ACCESS: AccessFlags = AccessFlags::from_bits(
    AccessFlags::PUBLIC.bits() | AccessFlags::FINAL.bits() | AccessFlags::SUPER.bits(),
);
const NESTED_ACCESS: AccessFlags = AccessFlags::from_bits(
    AccessFlags::PUBLIC.bits() | AccessFlags::STATIC.bits() | AccessFlags::FINAL.bits(),
);
const FIELD_ACCESS: AccessFlags = NESTED_ACCESS;

struct ClassCache {
    generation: u64,
    classes: HashMap<String, Arc<[u8]>>,
}

/// Generates accessor classes from one app repository.
///
/// Holds the repository weakly; once it is gone every request yields `None`.
pub struct ResourceClassGenerator {
    app: Weak<AppRepository>,
    cache: Mutex<ClassCache>,
}

impl core::fmt::Debug for ResourceClassGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResourceClassGenerator")
            .field("cached", &self.cache.lock().classes.len())
            .finish_non_exhaustive()
    }
}

impl ResourceClassGenerator {
    /// Creates a generator for `app`.
    #[must_use]
    pub fn new(app: &Arc<AppRepository>) -> Self {
        Self {
            app: Arc::downgrade(app),
            cache: Mutex::new(ClassCache {
                generation: 0,
                classes: HashMap::new(),
            }),
        }
    }

    /// Bytecode of `class_name` (`com.example.R` or `com.example.R$string`).
    ///
    /// Returns `Ok(None)` for an unknown nested type or a dropped repository.
    /// Results are cached until the repository's generation moves.
    ///
    /// # Errors
    ///
    /// Any [`ClassFileError`] raised while writing the class, typically a
    /// styleable table too large for one class initializer.
    pub fn generate(&self, class_name: &str) -> Result<Option<Arc<[u8]>>, ClassFileError> {
        let Some(app) = self.app.upgrade() else {
            return Ok(None);
        };

        let generation = app.generation();
        {
            let mut cache = self.cache.lock();
            if cache.generation != generation {
                cache.classes.clear();
                cache.generation = generation;
            }
            if let Some(bytes) = cache.classes.get(class_name) {
                return Ok(Some(Arc::clone(bytes)));
            }
        }

        let internal = class_name.replace('.', "/");
        let bytes = match internal.split_once('$') {
            None => outer_class(&app, &internal)?,
            Some((outer, nested)) => {
                let Some(ty) = ResourceType::from_name(nested) else {
                    return Ok(None);
                };
                nested_class(&app, outer, ty)?
            }
        };
        let bytes: Arc<[u8]> = bytes.into();
        tracing::debug!(class = class_name, len = bytes.len(), "class generated");

        let mut cache = self.cache.lock();
        if cache.generation == generation {
            cache
                .classes
                .insert(class_name.to_string(), Arc::clone(&bytes));
        }
        Ok(Some(bytes))
    }

    /// Number of cached classes.
    #[must_use]
    pub fn cached_classes(&self) -> usize {
        self.cache.lock().classes.len()
    }
}

/// Java field name of a resource name.
#[must_use]
pub fn field_name(resource: &str) -> String {
    resource
        .chars()
        .map(|c| if matches!(c, '.' | '-' | ':') { '_' } else { c })
        .collect()
}

fn outer_class(app: &AppRepository, name: &str) -> Result<Vec<u8>, ClassFileError> {
    let mut class = ClassWriter::new(ClassVersion::JAVA_6, CLASS_ACCESS, name, OBJECT_CLASS);
    for ty in ResourceType::ALL {
        let present = match ty {
            ResourceType::Id => !app.all_ids().is_empty(),
            _ => !app.items(ty).is_empty(),
        };
        if present {
            class.add_inner_class(&format!("{name}${ty}"), name, ty.name(), NESTED_ACCESS)?;
        }
    }
    class.add_default_constructor()?;
    class.finish()
}

fn nested_class(app: &AppRepository, outer: &str, ty: ResourceType) -> Result<Vec<u8>, ClassFileError> {
    let name = format!("{outer}${ty}");
    let mut class = ClassWriter::new(ClassVersion::JAVA_6, CLASS_ACCESS, name.as_str(), OBJECT_CLASS);
    class.add_inner_class(&name, outer, ty.name(), NESTED_ACCESS)?;

    match ty {
        ResourceType::Styleable => styleable_fields(app, &mut class)?,
        ResourceType::Id => {
            let mut ids: Vec<String> = app.all_ids().iter().cloned().collect();
            ids.sort();
            int_fields(app, &mut class, ty, ids.iter().map(String::as_str))?;
        }
        ResourceType::Attr => {
            let items = app.items(ty);
            // Framework attributes belong to android.R.
            let names = items.names().filter(|name| !name.contains(':'));
            int_fields(app, &mut class, ty, names)?;
        }
        _ => {
            let items = app.items(ty);
            int_fields(app, &mut class, ty, items.names())?;
        }
    }

    class.add_default_constructor()?;
    class.finish()
}

fn int_fields<'a>(
    app: &AppRepository,
    class: &mut ClassWriter,
    ty: ResourceType,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), ClassFileError> {
    let mut seen = HashSet::new();
    for name in names {
        let field = field_name(name);
        if seen.insert(field.clone()) {
            class.add_int_constant(FIELD_ACCESS, &field, app.resource_id(ty, name))?;
        }
    }
    Ok(())
}

fn styleable_fields(app: &AppRepository, class: &mut ClassWriter) -> Result<(), ClassFileError> {
    let items = app.items(ResourceType::Styleable);
    let mut arrays: Vec<(String, Vec<i32>)> = Vec::new();
    let mut seen = HashSet::new();

    for (name, declarations) in items.iter() {
        let field = field_name(name);
        if !seen.insert(field.clone()) {
            continue;
        }
        let attrs: &[String] = declarations
            .iter()
            .find_map(|item| match item.value() {
                ResourceValue::Styleable { attrs } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or_default();

        let values = app.declared_array_values(attrs, &field).unwrap_or_else(|| {
            attrs
                .iter()
                .map(|attr| app.resource_id(ResourceType::Attr, attr))
                .collect()
        });

        class.add_field(FIELD_ACCESS, &field, "[I")?;
        for (index, attr) in attrs.iter().enumerate() {
            let index_field = format!("{field}_{}", field_name(attr));
            if seen.insert(index_field.clone()) {
                class.add_int_constant(FIELD_ACCESS, &index_field, attr_index(index)?)?;
            }
        }
        arrays.push((field, values));
    }

    if !arrays.is_empty() {
        class.add_int_array_initializer(
            arrays
                .iter()
                .map(|(field, values)| (field.as_str(), values.as_slice())),
        )?;
    }
    Ok(())
}

fn attr_index(index: usize) -> Result<i32, ClassFileError> {
    i32::try_from(index).map_err(|_| ClassFileError::TooManyMembers {
        what: "styleable attributes",
        count: index,
    })
}
