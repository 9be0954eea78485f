use crate::core::{Result, WeaveError};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Names reserved by the persistence framework itself: anything starting
/// with `$` or `__`, plus the static configuration blocks of a model class.
pub const DEFAULT_CONFIGURATIONAL_PATTERN: &str = r"^(?:\$.*|__.*|hasMany|hasOne|belongsTo|mappedBy|mapping|constraints|transients|embedded|namedQueries|attach|discard|errors|metaClass|properties|dirtyPropertyNames|dirty)$";

lazy_static! {
    static ref DEFAULT_CONFIGURATIONAL: Regex = Regex::new(DEFAULT_CONFIGURATIONAL_PATTERN)
        .expect("default configurational pattern is a valid regex");
}

/// Getter/setter naming convention used to pair accessors with properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorNaming {
    /// `getName` / `isActive` / `setName`
    #[default]
    Bean,
    /// `get_name` / `is_active` / `set_name`
    Snake,
}

/// What to do with an attribute whose declared type is the void marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoidPolicy {
    /// Leave the attribute alone, like any other single-accessor shape.
    #[default]
    Disqualify,
    /// Synthesize only the writer.
    WriterOnly,
}

/// Configuration of a dirty-tracking pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassConfig {
    /// Identity attribute managed by the persistence layer
    pub identity_property: String,

    /// Optimistic-locking version attribute
    pub version_property: String,

    /// Capability marker attached to tracked classes
    pub capability: String,

    /// Name of the instrumentation method on the capability
    pub instrumentation_method: String,

    /// Annotation exempting a writer from weaving
    pub raw_accessor_marker: String,

    /// Annotation equivalent to the transient modifier
    pub transient_marker: String,

    /// Names treated as "no user-defined ancestor"
    pub base_objects: Vec<String>,

    /// Reserved framework names never tracked
    pub configurational_pattern: String,

    /// Value types returned as-is by synthesized readers
    pub primitive_types: Vec<String>,

    /// Types that also get the `is` reader
    pub boolean_types: Vec<String>,

    /// Type name denoting "no value"
    pub void_type: String,

    pub naming: AccessorNaming,

    pub void_policy: VoidPolicy,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            identity_property: "id".to_string(),
            version_property: "version".to_string(),
            capability: "DirtyCheckable".to_string(),
            instrumentation_method: "markDirty".to_string(),
            raw_accessor_marker: "PersistenceMethod".to_string(),
            transient_marker: "Transient".to_string(),
            base_objects: vec!["Object".to_string(), "java.lang.Object".to_string()],
            configurational_pattern: DEFAULT_CONFIGURATIONAL_PATTERN.to_string(),
            primitive_types: [
                "boolean", "byte", "char", "short", "int", "long", "float", "double",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            boolean_types: vec!["boolean".to_string(), "Boolean".to_string()],
            void_type: "void".to_string(),
            naming: AccessorNaming::Bean,
            void_policy: VoidPolicy::Disqualify,
        }
    }
}

impl PassConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset used by the `#[dirty_tracked]` macro.
    pub fn rust() -> Self {
        Self {
            capability: "DirtyTracking".to_string(),
            instrumentation_method: "mark_dirty".to_string(),
            raw_accessor_marker: "raw_access".to_string(),
            transient_marker: "transient".to_string(),
            base_objects: Vec::new(),
            primitive_types: [
                "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
                "u64", "u128", "usize", "f32", "f64",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
            boolean_types: vec!["bool".to_string()],
            void_type: "()".to_string(),
            naming: AccessorNaming::Snake,
            ..Self::default()
        }
    }

    /// Set the identity attribute name
    pub fn identity_property(mut self, name: &str) -> Self {
        self.identity_property = name.to_string();
        self
    }

    /// Set the version attribute name
    pub fn version_property(mut self, name: &str) -> Self {
        self.version_property = name.to_string();
        self
    }

    /// Set the capability marker
    pub fn capability(mut self, name: &str) -> Self {
        self.capability = name.to_string();
        self
    }

    /// Set the reserved-name pattern
    pub fn configurational_pattern(mut self, pattern: &str) -> Self {
        self.configurational_pattern = pattern.to_string();
        self
    }

    pub fn naming(mut self, naming: AccessorNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn void_policy(mut self, policy: VoidPolicy) -> Self {
        self.void_policy = policy;
        self
    }

    /// Load a configuration from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: PassConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("identity_property", &self.identity_property),
            ("version_property", &self.version_property),
            ("capability", &self.capability),
            ("instrumentation_method", &self.instrumentation_method),
            ("void_type", &self.void_type),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(WeaveError::ConfigError(format!("'{}' must not be empty", key)));
            }
        }
        self.compile_configurational()?;
        Ok(())
    }

    /// Compile the reserved-name matcher for one pass.
    pub fn compile_configurational(&self) -> Result<ConfigurationalNames> {
        if self.configurational_pattern == DEFAULT_CONFIGURATIONAL_PATTERN {
            return Ok(ConfigurationalNames {
                regex: DEFAULT_CONFIGURATIONAL.clone(),
            });
        }
        let regex = Regex::new(&self.configurational_pattern).map_err(|e| {
            WeaveError::ConfigError(format!(
                "Invalid configurational pattern '{}': {}",
                self.configurational_pattern, e
            ))
        })?;
        Ok(ConfigurationalNames { regex })
    }
}

/// Compiled matcher for framework-reserved property names.
#[derive(Debug, Clone)]
pub struct ConfigurationalNames {
    regex: Regex,
}

impl ConfigurationalNames {
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pattern_reserves_framework_names() {
        let names = PassConfig::default().compile_configurational().unwrap();
        for reserved in ["$changedProperties", "__timeStamp", "hasMany", "constraints", "mapping"] {
            assert!(names.matches(reserved), "{} should be reserved", reserved);
        }
        for ordinary in ["balance", "mappingCount", "owner", "hasManyThings"] {
            assert!(!names.matches(ordinary), "{} should not be reserved", ordinary);
        }
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = PassConfig::default()
            .configurational_pattern("(unclosed")
            .validate()
            .unwrap_err();
        assert!(matches!(err, WeaveError::ConfigError(msg) if msg.contains("(unclosed")));
    }

    #[test]
    fn empty_identity_name_is_rejected() {
        let err = PassConfig::default().identity_property("  ").validate().unwrap_err();
        assert!(matches!(err, WeaveError::ConfigError(_)));
    }

    #[test]
    fn rust_preset_uses_snake_case_accessors() {
        let config = PassConfig::rust();
        assert_eq!(config.naming, AccessorNaming::Snake);
        assert_eq!(config.instrumentation_method, "mark_dirty");
        assert!(config.primitive_types.contains(&"u64".to_string()));
        assert!(config.validate().is_ok());
    }
}
