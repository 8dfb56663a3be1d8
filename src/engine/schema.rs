//! Registry of payload types seen during registration.

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::engine::shape::TypeShape;

/// A registered payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Lower-cased, namespace-qualified name.
    pub full_name: String,
    /// Unique short alias, `foo`, `foo2`, ...
    pub short_name: String,
    pub shape: TypeShape,
}

/// Deduplicating index of request and response types.
///
/// Only named records produce entries. Short names are unique: when two
/// records from different namespaces share a bare name, the later one is
/// suffixed with the first free integer starting at 2.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, SchemaEntry>,
    short_names: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload shape. Registering the same type again is a no-op.
    ///
    /// Sequences, indirections and mappings are unwrapped to their element
    /// type first; elements that are not records are skipped.
    pub fn register(&mut self, shape: &TypeShape) {
        let element = shape.element();
        let TypeShape::Record(name) = element else {
            return;
        };

        let full_name = name.full_name();
        if self.schemas.contains_key(&full_name) {
            return;
        }

        let base = name.short_name();
        let mut short_name = base.clone();
        let mut suffix = 2;
        while let Some(existing) = self.short_names.get(&short_name) {
            if *existing == full_name {
                break;
            }
            short_name = format!("{base}{suffix}");
            suffix += 1;
        }

        debug!("Registered schema {full_name} as {short_name}");
        self.short_names.insert(short_name.clone(), full_name.clone());
        self.schemas.insert(
            full_name.clone(),
            SchemaEntry {
                full_name,
                short_name,
                shape: element.clone(),
            },
        );
    }

    /// Look up an entry by its fully-qualified name.
    pub fn get(&self, full_name: &str) -> Option<&SchemaEntry> {
        self.schemas.get(full_name)
    }

    /// Look up an entry by its short name.
    pub fn resolve(&self, short_name: &str) -> Option<&SchemaEntry> {
        self.short_names
            .get(short_name)
            .and_then(|full_name| self.schemas.get(full_name))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.schemas.values()
    }

    /// Short name to fully-qualified name, sorted by short name.
    pub fn short_names(&self) -> BTreeMap<String, String> {
        self.short_names
            .iter()
            .map(|(short, full)| (short.clone(), full.clone()))
            .collect()
    }
}
