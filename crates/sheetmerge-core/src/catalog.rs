use std::collections::BTreeMap;

/// Source of template workbooks addressable by identifier.
///
/// Implementations decide what an identifier is (a file name, a database
/// key, ...); the composer only ever asks for bytes.
pub trait TemplateCatalog: Send + Sync {
    /// Identifiers of every available template, sorted.
    fn template_ids(&self) -> Vec<String>;

    fn load(&self, id: &str) -> Option<Vec<u8>>;

    fn contains(&self, id: &str) -> bool {
        self.template_ids().iter().any(|t| t == id)
    }
}

/// Catalog holding template bytes in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryCatalog {
    templates: BTreeMap<String, Vec<u8>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, bytes: Vec<u8>) -> Option<Vec<u8>> {
        self.templates.insert(id.into(), bytes)
    }

    pub fn with_template(mut self, id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(id, bytes);
        self
    }
}

impl TemplateCatalog for MemoryCatalog {
    fn template_ids(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    fn load(&self, id: &str) -> Option<Vec<u8>> {
        self.templates.get(id).cloned()
    }

    fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }
}
