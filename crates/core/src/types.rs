//! Type Registry: storage-type keyword -> application type, plus per-name
//! `VTYPE` overrides.

use std::collections::BTreeMap;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    storage_types: BTreeMap<&'static str, &'static str>,
    native_overrides: BTreeMap<String, String>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut storage_types = BTreeMap::new();
        storage_types.insert("INTEGER", "int64_t");
        storage_types.insert("VARCHAR", "std::string");
        storage_types.insert("TEXT", "std::string");
        storage_types.insert("JSON", "std::string");

        Self {
            storage_types,
            native_overrides: BTreeMap::new(),
        }
    }

    /// Registers a `VTYPE name type` override. Never cleared for the
    /// lifetime of the Module.
    pub fn set_override(&mut self, name: impl Into<String>, native_type: impl Into<String>) {
        self.native_overrides.insert(name.into(), native_type.into());
    }

    pub fn get_override(&self, name: &str) -> Option<&str> {
        self.native_overrides.get(name).map(String::as_str)
    }

    /// `getType(sqlType)`: fatal if unknown.
    pub fn get_type(&self, sql_type: &str) -> CoreResult<&'static str> {
        self.storage_types
            .get(sql_type.to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| CoreError::UnknownType {
                sql_type: sql_type.to_string(),
            })
    }

    /// `getNativeType(name, fallback)`: per-name override if present, else fallback.
    pub fn get_native_type<'a>(&'a self, name: &str, fallback: &'a str) -> &'a str {
        self.get_override(name).unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_storage_types_resolve() {
        let reg = TypeRegistry::new();
        assert_eq!(reg.get_type("INTEGER").unwrap(), "int64_t");
        assert_eq!(reg.get_type("text").unwrap(), "std::string");
        assert_eq!(reg.get_type("JSON").unwrap(), "std::string");
        assert_eq!(reg.get_type("VARCHAR").unwrap(), "std::string");
    }

    #[test]
    fn unknown_storage_type_is_fatal() {
        let reg = TypeRegistry::new();
        let err = reg.get_type("BLOB").unwrap_err();
        assert!(matches!(err, CoreError::UnknownType { .. }));
    }

    #[test]
    fn native_override_wins_over_fallback() {
        let mut reg = TypeRegistry::new();
        reg.set_override("user_id", "UserId");
        assert_eq!(reg.get_native_type("user_id", "int64_t"), "UserId");
        assert_eq!(reg.get_native_type("other", "int64_t"), "int64_t");
    }
}
