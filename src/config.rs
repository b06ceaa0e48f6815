// Configuration module for callmap
// Runtime knobs come from environment variables, resolution rules from an
// optional callmap.yaml at the project root.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

pub const CONFIG_FILE_NAME: &str = "callmap.yaml";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker pool size, 0 lets rayon decide (CALLMAP_THREADS)
    pub threads: usize,

    /// Files above this size are skipped (CALLMAP_MAX_FILE_SIZE_MB)
    pub max_file_size_mb: u64,

    /// Accept trees that contain syntax errors (CALLMAP_LENIENT_PARSE)
    pub lenient_parse: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 0,
            max_file_size_mb: 10,
            lenient_parse: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(val) = env::var("CALLMAP_THREADS") {
            if let Ok(parsed) = val.parse() {
                config.threads = parsed;
            } else {
                warn!(
                    "invalid CALLMAP_THREADS value: {}, using default: {}",
                    val, config.threads
                );
            }
        }

        if let Ok(val) = env::var("CALLMAP_MAX_FILE_SIZE_MB") {
            if let Ok(parsed) = val.parse() {
                config.max_file_size_mb = parsed;
            } else {
                warn!(
                    "invalid CALLMAP_MAX_FILE_SIZE_MB value: {}, using default: {}",
                    val, config.max_file_size_mb
                );
            }
        }

        if let Ok(val) = env::var("CALLMAP_LENIENT_PARSE") {
            match parse_flag(&val) {
                Some(flag) => config.lenient_parse = flag,
                None => warn!(
                    "invalid CALLMAP_LENIENT_PARSE value: {}, using default: {}",
                    val, config.lenient_parse
                ),
            }
        }

        config
    }

    /// Get the global configuration instance
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(Config::from_env)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Rules the call resolver and the call graph use to decide which calls are
/// worth recording.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Member names whose calls never produce an edge.
    pub excluded_methods: BTreeSet<String>,
    /// Namespace prefixes the resolver refuses to emit.
    pub resolver_excluded_prefixes: Vec<String>,
    /// Namespace prefixes the graph refuses to store, on either end of an edge.
    pub graph_excluded_prefixes: Vec<String>,
    /// Package whose types are visible without an import.
    pub implicit_namespace: String,
    /// Simple names known to live in the implicit namespace.
    pub implicit_types: BTreeSet<String>,
}

const DEFAULT_EXCLUDED_METHODS: &[&str] = &[
    // iteration
    "iterator",
    "hasNext",
    "next",
    "remove",
    "forEach",
    "stream",
    "spliterator",
    "listIterator",
    // java.lang.Object
    "toString",
    "equals",
    "hashCode",
    "getClass",
    "clone",
    "notify",
    "notifyAll",
    "wait",
    "finalize",
    // collections
    "size",
    "isEmpty",
    "contains",
    "clear",
    "add",
    // misc
    "valueOf",
    "length",
    "trim",
];

const DEFAULT_RESOLVER_PREFIXES: &[&str] = &["java.", "javax.", "sun.", "com.sun."];

const DEFAULT_GRAPH_PREFIXES: &[&str] = &[
    "java.", "javax.", "sun.", "com.sun.", "org.w3c.", "org.xml.", "org.ietf.", "org.omg.",
    "org.jcp.", "android.",
];

const DEFAULT_IMPLICIT_TYPES: &[&str] = &[
    "Object",
    "String",
    "StringBuilder",
    "StringBuffer",
    "CharSequence",
    "Integer",
    "Long",
    "Double",
    "Float",
    "Boolean",
    "Byte",
    "Short",
    "Character",
    "Number",
    "Math",
    "StrictMath",
    "System",
    "Class",
    "ClassLoader",
    "Thread",
    "ThreadLocal",
    "Runnable",
    "Runtime",
    "Process",
    "ProcessBuilder",
    "Enum",
    "Record",
    "Iterable",
    "Comparable",
    "AutoCloseable",
    "Cloneable",
    "Void",
    "Throwable",
    "Exception",
    "Error",
    "RuntimeException",
    "IllegalArgumentException",
    "IllegalStateException",
    "NullPointerException",
    "UnsupportedOperationException",
    "IndexOutOfBoundsException",
    "ArrayIndexOutOfBoundsException",
    "ClassCastException",
    "ArithmeticException",
    "NumberFormatException",
    "InterruptedException",
    "CloneNotSupportedException",
    "Override",
    "Deprecated",
    "SuppressWarnings",
    "FunctionalInterface",
    "SafeVarargs",
];

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            excluded_methods: DEFAULT_EXCLUDED_METHODS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            resolver_excluded_prefixes: DEFAULT_RESOLVER_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            graph_excluded_prefixes: DEFAULT_GRAPH_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            implicit_namespace: "java.lang".to_string(),
            implicit_types: DEFAULT_IMPLICIT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ResolverConfig {
    /// Load overrides from a YAML file; fields missing from the file keep
    /// their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = crate::util::read_to_string(path)?;
        let config: ResolverConfig = serde_yaml_ng::from_str(&raw)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// Explicit path wins; otherwise `callmap.yaml` in the project root is
    /// used when present.
    pub fn discover(repo_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = repo_root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Self::from_file(&candidate);
        }
        Ok(Self::default())
    }

    pub fn is_excluded_method(&self, name: &str) -> bool {
        self.excluded_methods.contains(name)
    }

    pub fn is_resolver_excluded(&self, qualname: &str) -> bool {
        self.resolver_excluded_prefixes
            .iter()
            .any(|prefix| qualname.starts_with(prefix.as_str()))
    }

    pub fn is_implicit_type(&self, name: &str) -> bool {
        self.implicit_types.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.threads, 0);
        assert_eq!(config.max_file_size_mb, 10);
        assert!(!config.lenient_parse);
    }

    #[test]
    fn parse_flag_variants() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" TRUE "), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn resolver_defaults_cover_stdlib() {
        let config = ResolverConfig::default();
        assert!(config.is_excluded_method("size"));
        assert!(config.is_excluded_method("toString"));
        assert!(!config.is_excluded_method("save"));
        assert!(config.is_resolver_excluded("java.util.List.get"));
        assert!(!config.is_resolver_excluded("org.xml.Parser.parse"));
        assert!(config.graph_excluded_prefixes.iter().any(|p| p == "org.xml."));
        assert!(config.is_implicit_type("String"));
    }

    #[test]
    fn yaml_overrides_keep_missing_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "excluded_methods: [log]\nimplicit_namespace: kotlin\n").unwrap();
        let config = ResolverConfig::discover(dir.path(), None).unwrap();
        assert!(config.is_excluded_method("log"));
        assert!(!config.is_excluded_method("size"));
        assert_eq!(config.implicit_namespace, "kotlin");
        assert!(config.is_resolver_excluded("javax.swing.JFrame.show"));
    }
}
