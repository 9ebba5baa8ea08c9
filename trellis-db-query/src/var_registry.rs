//! Variable registry for query execution
//!
//! Maps variable names (e.g. "?s", "?start") to compact [`VarId`] indices
//! used throughout the operator layer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Compact variable identifier.
///
/// u16 supports up to 65K variables per query, far beyond any realistic
/// query shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u16);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

/// Registry mapping variable names to compact VarId indices.
#[derive(Debug, Default)]
pub struct VarRegistry {
    name_to_id: HashMap<Arc<str>, VarId>,
    id_to_name: Vec<Arc<str>>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the existing VarId for `name` or intern a new one.
    pub fn get_or_insert(&mut self, name: &str) -> VarId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }

        // VarId is u16; wrapping would silently alias variables.
        assert!(
            self.id_to_name.len() < u16::MAX as usize,
            "VarRegistry capacity exceeded"
        );

        let id = VarId(self.id_to_name.len() as u16);
        let name: Arc<str> = Arc::from(name);
        self.name_to_id.insert(name.clone(), id);
        self.id_to_name.push(name);
        id
    }

    pub fn get(&self, name: &str) -> Option<VarId> {
        self.name_to_id.get(name).copied()
    }

    /// The name for `id`, if it was registered here.
    pub fn name(&self, id: VarId) -> Option<&str> {
        self.id_to_name.get(id.0 as usize).map(|s| s.as_ref())
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_and_lookup() {
        let mut reg = VarRegistry::new();
        let s = reg.get_or_insert("?s");
        let o = reg.get_or_insert("?o");
        assert_ne!(s, o);
        assert_eq!(reg.get_or_insert("?s"), s);
        assert_eq!(reg.get("?o"), Some(o));
        assert_eq!(reg.name(s), Some("?s"));
        assert_eq!(reg.len(), 2);
    }
}
