//! Indexed view over the combined catalogs.
//!
//! The resolver itself scans catalogs in order; the index exists for the
//! questions asked around it: which names are known at all (crawling, strict
//! validation) and which properties are declared more than once.

use crate::catalog::ModuleMetadata;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
/// Property lookup across one or more catalogs, first entry wins.
pub struct CatalogIndex {
    by_property: BTreeMap<String, String>,
    duplicates: BTreeSet<String>,
}

impl CatalogIndex {
    /// Build an index over `catalogs`, consulted in the given order.
    pub fn new<'a, I>(catalogs: I) -> Self
    where
        I: IntoIterator<Item = &'a [ModuleMetadata]>,
    {
        let mut index = Self::default();
        for catalog in catalogs {
            for entry in catalog {
                index.insert(entry);
            }
        }
        index
    }

    fn insert(&mut self, entry: &ModuleMetadata) {
        if self.by_property.contains_key(&entry.property) {
            self.duplicates.insert(entry.property.clone());
            return;
        }
        self.by_property
            .insert(entry.property.clone(), entry.module_path.clone());
    }

    pub fn contains(&self, property: &str) -> bool {
        self.by_property.contains_key(property)
    }

    /// The module path of the first entry declaring `property`.
    pub fn module_path(&self, property: &str) -> Option<&str> {
        self.by_property.get(property).map(String::as_str)
    }

    /// Properties declared by more than one entry.
    pub fn duplicates(&self) -> &BTreeSet<String> {
        &self.duplicates
    }

    /// Names from `names` that no indexed entry declares, sorted.
    pub fn unknown<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let unknown: BTreeSet<&String> = names
            .into_iter()
            .filter(|name| !self.contains(name))
            .collect();
        unknown.into_iter().cloned().collect()
    }
}
