//! Per-file import tables and simple-name type resolution.

use crate::config::ResolverConfig;
use crate::model::TypeRecord;
use crate::qualname;
use crate::syntax::{CompilationUnit, Member, Stmt, TypeDecl, TypeRef};
use std::collections::BTreeMap;

const PRIMITIVES: &[&str] = &[
    "byte", "short", "int", "long", "float", "double", "boolean", "char", "void",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticImport {
    pub owner: String,
    pub member: String,
}

#[derive(Debug, Clone, Default)]
pub struct ImportTable {
    pub package: Option<String>,
    /// Single-type imports: simple name -> qualified name.
    pub classes: BTreeMap<String, String>,
    /// Packages imported with `.*`, in source order.
    pub wildcards: Vec<String>,
    /// `import static a.B.m;` keyed by member name.
    pub statics: BTreeMap<String, StaticImport>,
    /// Owners imported with `import static a.B.*;`.
    pub static_wildcards: Vec<String>,
    /// Types declared in this file, including nested and local ones.
    pub declared: BTreeMap<String, String>,
    pub implicit_namespace: String,
}

impl ImportTable {
    pub fn from_unit(unit: &CompilationUnit, config: &ResolverConfig) -> Self {
        let mut table = ImportTable {
            package: unit.package.clone(),
            implicit_namespace: config.implicit_namespace.clone(),
            ..ImportTable::default()
        };
        for import in &unit.imports {
            match (import.is_static, import.wildcard) {
                (false, false) => {
                    let simple = qualname::last_segment(&import.path).to_string();
                    table.classes.insert(simple, import.path.clone());
                }
                (false, true) => table.wildcards.push(import.path.clone()),
                (true, false) => {
                    let owner = qualname::parent(&import.path);
                    if owner.is_empty() {
                        continue;
                    }
                    let member = qualname::last_segment(&import.path).to_string();
                    table.statics.insert(
                        member.clone(),
                        StaticImport {
                            owner: owner.to_string(),
                            member,
                        },
                    );
                }
                (true, true) => table.static_wildcards.push(import.path.clone()),
            }
        }
        let prefix = table.package.clone().unwrap_or_default();
        for decl in &unit.types {
            register_declared(decl, &prefix, &mut table.declared);
        }
        table
    }

    pub fn package_name(&self) -> &str {
        self.package.as_deref().unwrap_or("")
    }
}

fn register_declared(decl: &TypeDecl, prefix: &str, out: &mut BTreeMap<String, String>) {
    let qualified = qualname::join(prefix, &decl.name);
    out.entry(decl.name.clone())
        .or_insert_with(|| qualified.clone());
    for member in &decl.members {
        match member {
            Member::Type(nested) => register_declared(nested, &qualified, out),
            Member::Method(method) | Member::Constructor(method) => {
                if let Some(body) = &method.body {
                    register_local_classes(body, &qualified, out);
                }
            }
            Member::Initializer(init) => register_local_classes(&init.body, &qualified, out),
            Member::Field(_) => {}
        }
    }
}

fn register_local_classes(body: &[Stmt], prefix: &str, out: &mut BTreeMap<String, String>) {
    for stmt in body {
        match stmt {
            Stmt::LocalClass(decl) => register_declared(decl, prefix, out),
            Stmt::Block(inner) => register_local_classes(inner, prefix, out),
            Stmt::LocalVar(_) | Stmt::Expr(_) => {}
        }
    }
}

/// Maps type names as written to qualified names for one file.
pub struct TypeResolver<'a> {
    imports: &'a ImportTable,
    config: &'a ResolverConfig,
    known: Option<&'a BTreeMap<String, TypeRecord>>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(imports: &'a ImportTable, config: &'a ResolverConfig) -> Self {
        Self {
            imports,
            config,
            known: None,
        }
    }

    /// Use project-wide type knowledge to pick between wildcard imports.
    pub fn with_known_types(mut self, known: &'a BTreeMap<String, TypeRecord>) -> Self {
        self.known = Some(known);
        self
    }

    fn is_known(&self, qualified: &str) -> bool {
        self.known
            .map(|types| types.contains_key(qualified))
            .unwrap_or(false)
    }

    /// Resolution order: dotted names unchanged, primitives unchanged, types
    /// declared in the file, single-type imports, wildcard imports, the
    /// implicit namespace, then the current package.
    pub fn resolve(&self, name: &str) -> String {
        if name.contains('.') || is_primitive(name) || name.is_empty() {
            return name.to_string();
        }
        if let Some(qualified) = self.imports.declared.get(name) {
            return qualified.clone();
        }
        if let Some(qualified) = self.imports.classes.get(name) {
            return qualified.clone();
        }
        let package = self.imports.package_name();
        if let Some(prefix) = self
            .imports
            .wildcards
            .iter()
            .find(|prefix| self.is_known(&qualname::join(prefix, name)))
        {
            return qualname::join(prefix, name);
        }
        if self.config.is_implicit_type(name) {
            return qualname::join(&self.imports.implicit_namespace, name);
        }
        let same_package = qualname::join(package, name);
        if self.is_known(&same_package) {
            return same_package;
        }
        if let Some(prefix) = self.imports.wildcards.first() {
            return qualname::join(prefix, name);
        }
        same_package
    }

    /// Resolves the base type, then re-appends array dimensions.
    pub fn resolve_ref(&self, ty: &TypeRef) -> String {
        let mut out = if ty.primitive {
            ty.name.clone()
        } else {
            self.resolve(&ty.name)
        };
        for _ in 0..ty.dims {
            out.push_str("[]");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeKind;

    fn table(source: &str) -> ImportTable {
        let unit = crate::syntax::parse(source).unwrap();
        ImportTable::from_unit(&unit, &ResolverConfig::default())
    }

    const SOURCE: &str = r#"package com.acme.app;

import com.acme.repo.UserRepo;
import com.acme.model.*;
import java.util.*;
import static com.acme.util.Strings.join;
import static com.acme.util.Checks.*;

class Service {
    static class Cache {}
}
"#;

    #[test]
    fn builds_table_from_imports() {
        let imports = table(SOURCE);
        assert_eq!(imports.package.as_deref(), Some("com.acme.app"));
        assert_eq!(imports.classes["UserRepo"], "com.acme.repo.UserRepo");
        assert_eq!(imports.wildcards, vec!["com.acme.model", "java.util"]);
        assert_eq!(
            imports.statics["join"],
            StaticImport {
                owner: "com.acme.util.Strings".into(),
                member: "join".into()
            }
        );
        assert_eq!(imports.static_wildcards, vec!["com.acme.util.Checks"]);
        assert_eq!(imports.declared["Cache"], "com.acme.app.Service.Cache");
    }

    #[test]
    fn resolution_order() {
        let imports = table(SOURCE);
        let config = ResolverConfig::default();
        let resolver = TypeResolver::new(&imports, &config);
        assert_eq!(resolver.resolve("int"), "int");
        assert_eq!(resolver.resolve("java.io.File"), "java.io.File");
        assert_eq!(resolver.resolve("UserRepo"), "com.acme.repo.UserRepo");
        assert_eq!(resolver.resolve("Cache"), "com.acme.app.Service.Cache");
        assert_eq!(resolver.resolve("String"), "java.lang.String");
        assert_eq!(resolver.resolve("Order"), "com.acme.model.Order");
    }

    #[test]
    fn known_types_pick_the_right_wildcard() {
        let imports = table(SOURCE);
        let config = ResolverConfig::default();
        let mut known = BTreeMap::new();
        known.insert(
            "com.acme.app.Helper".to_string(),
            TypeRecord {
                qualified_name: "com.acme.app.Helper".into(),
                file_path: "Helper.java".into(),
                kind: TypeKind::Class,
                modifiers: Default::default(),
                superclass: None,
                interfaces: Vec::new(),
            },
        );
        let resolver = TypeResolver::new(&imports, &config).with_known_types(&known);
        assert_eq!(resolver.resolve("Helper"), "com.acme.app.Helper");
    }

    #[test]
    fn default_package_falls_back_to_bare_name() {
        let imports = table("class A {}");
        let config = ResolverConfig::default();
        let resolver = TypeResolver::new(&imports, &config);
        assert_eq!(resolver.resolve("B"), "B");
        assert_eq!(resolver.resolve("A"), "A");
    }

    #[test]
    fn array_suffix_follows_resolution() {
        let imports = table(SOURCE);
        let config = ResolverConfig::default();
        let resolver = TypeResolver::new(&imports, &config);
        let ty = TypeRef::named("UserRepo").with_extra_dims(2);
        assert_eq!(resolver.resolve_ref(&ty), "com.acme.repo.UserRepo[][]");
    }
}
