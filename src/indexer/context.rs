use crate::config::ResolverConfig;
use crate::indexer::imports::{ImportTable, TypeResolver};
use crate::model::{MethodRecord, TypeRecord};
use std::collections::{BTreeMap, BTreeSet};

/// Project-wide map from qualified name to its declarations.
///
/// Overloads share a qualified name; each set is kept sorted by
/// `(arity, param_types)` so the order never depends on which file was
/// indexed first.
#[derive(Debug, Default, Clone)]
pub struct MethodIndex {
    entries: BTreeMap<String, Vec<MethodRecord>>,
}

fn overload_order(record: &MethodRecord) -> (usize, Vec<String>) {
    (record.parameters.len(), record.param_types())
}

impl MethodIndex {
    /// Inserts or replaces the declaration with the same
    /// [`MethodKey`](crate::model::MethodKey).
    pub fn insert(&mut self, record: MethodRecord) {
        let name = record.qualified_name();
        let key = record.key();
        let decls = self.entries.entry(name).or_default();
        match decls.iter().position(|existing| existing.key() == key) {
            Some(idx) => decls[idx] = record,
            None => {
                decls.push(record);
                decls.sort_by_key(overload_order);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of individual declarations, overloads included.
    pub fn declaration_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<MethodRecord>)> {
        self.entries.iter()
    }
}

#[derive(Debug, Clone)]
pub struct FileContext {
    pub imports: ImportTable,
    pub hash: String,
}

/// Immutable snapshot produced by the declaration pass and shared read-only
/// by call resolution and impact mapping.
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub methods: MethodIndex,
    pub types: BTreeMap<String, TypeRecord>,
    /// Field name -> resolved type, per declaring type.
    pub fields: BTreeMap<String, BTreeMap<String, String>>,
    pub files: BTreeMap<String, FileContext>,
    pub config: ResolverConfig,
}

impl ProjectContext {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn resolver<'a>(&'a self, imports: &'a ImportTable) -> TypeResolver<'a> {
        TypeResolver::new(imports, &self.config).with_known_types(&self.types)
    }

    pub fn superclass(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name)?.superclass.as_deref()
    }

    /// The type itself followed by its superclass chain, stopping at
    /// types outside the project or at a cycle.
    pub fn type_chain(&self, start: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = Some(start.to_string());
        while let Some(name) = current {
            if !seen.insert(name.clone()) {
                break;
            }
            current = self.superclass(&name).map(str::to_string);
            chain.push(name);
        }
        chain
    }

    /// Declared type of `field` on `owner` or the nearest superclass.
    pub fn field_type(&self, owner: &str, field: &str) -> Option<&str> {
        self.type_chain(owner).iter().find_map(|name| {
            self.fields
                .get(name)
                .and_then(|fields| fields.get(field))
                .map(String::as_str)
        })
    }

    /// Like [`field_type`](Self::field_type), then tries enclosing types so
    /// inner classes see their outer class fields.
    pub fn visible_field_type(&self, owner: &str, field: &str) -> Option<&str> {
        let mut current = owner;
        loop {
            if let Some(ty) = self.field_type(current, field) {
                return Some(ty);
            }
            let outer = crate::qualname::parent(current);
            if outer.is_empty() || !self.types.contains_key(outer) {
                return None;
            }
            current = outer;
        }
    }

    pub fn file_hashes(&self) -> BTreeMap<String, String> {
        self.files
            .iter()
            .map(|(path, file)| (path.clone(), file.hash.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DeclKind, Modifiers, Parameter, TypeKind};

    fn method(owner: &str, name: &str, params: &[&str]) -> MethodRecord {
        MethodRecord {
            name: name.into(),
            owner: owner.into(),
            file_path: "A.java".into(),
            kind: DeclKind::Method,
            modifiers: Modifiers::new(),
            signature: String::new(),
            parameters: params
                .iter()
                .map(|ty| Parameter {
                    type_name: ty.to_string(),
                    name: "p".into(),
                    variadic: false,
                })
                .collect(),
            return_type: None,
            throws: Vec::new(),
            start_line: 1,
            end_line: 2,
        }
    }

    fn class(name: &str, superclass: Option<&str>) -> TypeRecord {
        TypeRecord {
            qualified_name: name.into(),
            file_path: "A.java".into(),
            kind: TypeKind::Class,
            modifiers: Modifiers::new(),
            superclass: superclass.map(str::to_string),
            interfaces: Vec::new(),
        }
    }

    #[test]
    fn overloads_sort_independently_of_insert_order() {
        let mut first = MethodIndex::default();
        first.insert(method("p.A", "f", &["int", "int"]));
        first.insert(method("p.A", "f", &["java.lang.String"]));
        first.insert(method("p.A", "f", &[]));

        let mut second = MethodIndex::default();
        second.insert(method("p.A", "f", &[]));
        second.insert(method("p.A", "f", &["int", "int"]));
        second.insert(method("p.A", "f", &["java.lang.String"]));

        let keys = |index: &MethodIndex| -> Vec<String> {
            index
                .iter()
                .flat_map(|(_, decls)| decls.iter().map(MethodRecord::overload_key))
                .collect()
        };
        assert_eq!(keys(&first), keys(&second));
        assert_eq!(
            keys(&first),
            vec!["p.A.f()", "p.A.f(java.lang.String)", "p.A.f(int,int)"]
        );
        assert_eq!(first.iter().count(), 1);
        assert_eq!(first.declaration_count(), 3);
    }

    #[test]
    fn reinsert_replaces_same_key() {
        let mut index = MethodIndex::default();
        index.insert(method("p.A", "f", &["int"]));
        let mut updated = method("p.A", "f", &["int"]);
        updated.end_line = 9;
        index.insert(updated);
        assert_eq!(index.declaration_count(), 1);
        let (_, decls) = index.iter().next().unwrap();
        assert_eq!(decls[0].end_line, 9);
    }

    #[test]
    fn field_lookup_walks_superclasses_and_outer_types() {
        let mut ctx = ProjectContext::default();
        ctx.types.insert("p.Base".into(), class("p.Base", None));
        ctx.types.insert("p.Child".into(), class("p.Child", Some("p.Base")));
        ctx.types
            .insert("p.Child.Inner".into(), class("p.Child.Inner", None));
        ctx.fields
            .entry("p.Base".into())
            .or_default()
            .insert("repo".into(), "p.Repo".into());

        assert_eq!(ctx.field_type("p.Child", "repo"), Some("p.Repo"));
        assert_eq!(ctx.field_type("p.Child.Inner", "repo"), None);
        assert_eq!(ctx.visible_field_type("p.Child.Inner", "repo"), Some("p.Repo"));
        assert_eq!(ctx.type_chain("p.Child"), vec!["p.Child", "p.Base"]);
    }

    #[test]
    fn type_chain_stops_on_cycles() {
        let mut ctx = ProjectContext::default();
        ctx.types.insert("p.A".into(), class("p.A", Some("p.B")));
        ctx.types.insert("p.B".into(), class("p.B", Some("p.A")));
        assert_eq!(ctx.type_chain("p.A"), vec!["p.A", "p.B"]);
    }
}
