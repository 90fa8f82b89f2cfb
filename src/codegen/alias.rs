// Package alias bookkeeping.
//
// `PackageNames` is owned by the host and lives for the whole run;
// `AliasRegistry` is created per generated file and dropped afterwards.

use std::collections::{HashMap, HashSet};

use super::names::clean_package_name;

/// Alias under which the file's own message types are referenced.
pub const OWN_PACKAGE_ALIAS: &str = "pb";

/// Alias of the serialization package imported by every template.
pub const SERIALIZATION_ALIAS: &str = "proto";

/// Set of package names already claimed; hands out unique variants.
#[derive(Debug, Default, Clone)]
pub struct PackageNames {
    in_use: HashSet<String>,
}

impl PackageNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` (cleaned), or `name1`, `name2`, … if it is taken.
    pub fn register_unique(&mut self, name: &str) -> String {
        let base = clean_package_name(name);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.in_use.contains(&candidate) {
            candidate = format!("{base}{suffix}");
            suffix += 1;
        }
        self.in_use.insert(candidate.clone());
        candidate
    }

    pub fn contains(&self, name: &str) -> bool {
        self.in_use.contains(name)
    }
}

/// Maps import paths referenced by one file's methods to collision-free aliases.
#[derive(Debug)]
pub struct AliasRegistry {
    names: PackageNames,
    by_path: HashMap<String, String>,
}

impl AliasRegistry {
    /// Fresh registry for a file whose own types live at `own_import_path`.
    pub fn new(own_import_path: &str) -> Self {
        let mut names = PackageNames::new();
        names.register_unique(SERIALIZATION_ALIAS);
        let own = names.register_unique(OWN_PACKAGE_ALIAS);

        let mut by_path = HashMap::new();
        by_path.insert(own_import_path.to_string(), own);
        Self { names, by_path }
    }

    /// Alias for `import_path`, minting one from `desired` on first use.
    pub fn alias(&mut self, import_path: &str, desired: &str) -> &str {
        if !self.by_path.contains_key(import_path) {
            let alias = self.names.register_unique(desired);
            self.by_path.insert(import_path.to_string(), alias);
        }
        &self.by_path[import_path]
    }

    /// Whether `name` is a package alias in this file, handed out or reserved.
    pub fn is_taken(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}
