use crate::package::property::PropertyType;
use std::collections::HashMap;

pub const UNKNOWN_NAME: &str = "UNKNOWN";

#[derive(Debug, Clone)]
pub struct PropertyNameEntry {
    pub name: String,
    pub element_type: Option<PropertyType>,
}

/// Property ID to display name and declared element type.
///
/// Only used for the `{"name"}` field of text-form properties; a missing table
/// or a missing ID renders as `UNKNOWN`.
#[derive(Debug, Clone, Default)]
pub struct PropertyNameTable {
    entries: HashMap<u32, PropertyNameEntry>,
}

impl PropertyNameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>, element_type: Option<PropertyType>) {
        self.entries.insert(id, PropertyNameEntry { name: name.into(), element_type });
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.entries.get(&id).map(|e| e.name.as_str())
    }

    pub fn element_type(&self, id: u32) -> Option<PropertyType> {
        self.entries.get(&id).and_then(|e| e.element_type)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(u32, S, Option<PropertyType>)> for PropertyNameTable {
    fn from_iter<I: IntoIterator<Item = (u32, S, Option<PropertyType>)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (id, name, element_type) in iter {
            table.insert(id, name, element_type);
        }
        table
    }
}

/// Resolves the display name for `id`, falling back to `UNKNOWN`.
pub fn display_name(names: Option<&PropertyNameTable>, id: u32) -> &str {
    names.and_then(|t| t.name(id)).unwrap_or(UNKNOWN_NAME)
}
