//! Call-site resolution.
//!
//! Maps a call expression to the qualified name of its target using, in
//! order: the exclusion list, the current type, field accesses, locals,
//! fields, imports, dotted qualifiers and finally the current package.

use crate::indexer::context::ProjectContext;
use crate::indexer::imports::{ImportTable, TypeResolver};
use crate::indexer::locals::LocalScope;
use crate::qualname;
use crate::syntax::{Call, Expr, TypeRef};
use tracing::debug;

/// Everything known at one call site.
pub struct CallSite<'a> {
    pub project: &'a ProjectContext,
    pub imports: &'a ImportTable,
    pub resolver: TypeResolver<'a>,
    pub locals: &'a LocalScope,
    /// Qualified name of the type whose code contains the call.
    pub current_type: &'a str,
}

impl<'a> CallSite<'a> {
    pub fn new(
        project: &'a ProjectContext,
        imports: &'a ImportTable,
        locals: &'a LocalScope,
        current_type: &'a str,
    ) -> Self {
        Self {
            project,
            imports,
            resolver: project.resolver(imports),
            locals,
            current_type,
        }
    }

    /// `None` when the call is excluded or cannot be mapped.
    pub fn resolve_call(&self, call: &Call) -> Option<String> {
        if self.project.config.is_excluded_method(&call.name) {
            debug!("skipping generic method {}", call.name);
            return None;
        }
        let candidate = match call.object.as_deref() {
            None => self.unqualified_target(&call.name),
            Some(object) => {
                let owner = self.qualifier_type(object)?;
                qualname::join(&owner, &call.name)
            }
        };
        self.finish(candidate)
    }

    /// `new T(..)` targets `T.T`.
    pub fn resolve_new(&self, ty: &TypeRef) -> Option<String> {
        if ty.primitive {
            return None;
        }
        let owner = self.resolver.resolve(&ty.name);
        let simple = qualname::last_segment(&ty.name);
        self.finish(qualname::join(&owner, simple))
    }

    /// `this(..)` targets the current type's constructor, `super(..)` the
    /// superclass constructor.
    pub fn resolve_explicit_ctor(&self, is_super: bool) -> Option<String> {
        let owner = if is_super {
            self.project.superclass(self.current_type)?.to_string()
        } else {
            self.current_type.to_string()
        };
        let simple = qualname::last_segment(&owner).to_string();
        self.finish(qualname::join(&owner, &simple))
    }

    fn finish(&self, candidate: String) -> Option<String> {
        let normalized = qualname::normalize(&candidate);
        if normalized.is_empty() {
            return None;
        }
        if self.project.config.is_resolver_excluded(&normalized) {
            debug!("skipping platform call {normalized}");
            return None;
        }
        Some(normalized)
    }

    /// Unqualified `m()` is a call on self and always targets the current
    /// type, even when `m` is inherited or statically imported.
    fn unqualified_target(&self, name: &str) -> String {
        qualname::join(self.current_type, name)
    }

    /// Type that owns the member named after the qualifier.
    fn qualifier_type(&self, object: &Expr) -> Option<String> {
        match object {
            Expr::This => Some(self.current_type.to_string()),
            Expr::Super => self.project.superclass(self.current_type).map(str::to_string),
            Expr::FieldAccess { object: inner, field } => self.field_access_type(inner, field, object),
            Expr::Name(name) => Some(self.name_type(name)),
            Expr::New(new) => Some(self.resolver.resolve_ref(&new.ty)),
            Expr::Call(_)
            | Expr::ExplicitCtor { .. }
            | Expr::ClassLiteral(_)
            | Expr::Lambda(_)
            | Expr::Block(_)
            | Expr::Other(_) => None,
        }
    }

    /// `x.f.m()`: the declared type of `f` on the type of `x`. A plain dotted
    /// chain whose root is not a variable is taken as a qualified type name.
    fn field_access_type(&self, inner: &Expr, field: &str, whole: &Expr) -> Option<String> {
        let owner = match inner {
            Expr::This => Some(self.current_type.to_string()),
            Expr::Super => self.project.superclass(self.current_type).map(str::to_string),
            Expr::Name(name) if self.is_variable(name) => Some(self.name_type(name)),
            Expr::Name(name) => {
                let ty = self.resolver.resolve(name);
                self.project.types.contains_key(&ty).then_some(ty)
            }
            Expr::FieldAccess {
                object: nested,
                field: nested_field,
            } => self.field_access_type(nested, nested_field, inner),
            _ => None,
        };
        if let Some(owner) = owner.as_deref() {
            if let Some(ty) = self.project.field_type(owner, field) {
                return Some(ty.to_string());
            }
        }
        let dotted = whole.dotted_name()?;
        let (root, rest) = dotted.split_once('.').unwrap_or((dotted.as_str(), ""));
        if self.is_variable(root) {
            return None;
        }
        match self.known_simple_type(root) {
            Some(qualified) => Some(qualname::join(&qualified, rest)),
            None => Some(dotted),
        }
    }

    /// A simple name the file itself declares, imports, or sees implicitly.
    /// No package fallback, so `com.acme.X` stays as written.
    fn known_simple_type(&self, name: &str) -> Option<String> {
        if let Some(qualified) = self
            .imports
            .declared
            .get(name)
            .or_else(|| self.imports.classes.get(name))
        {
            return Some(qualified.clone());
        }
        self.project
            .config
            .is_implicit_type(name)
            .then(|| qualname::join(&self.imports.implicit_namespace, name))
    }

    fn is_variable(&self, name: &str) -> bool {
        self.locals.contains(name)
            || self
                .project
                .visible_field_type(self.current_type, name)
                .is_some()
    }

    /// Locals shadow fields; fields shadow type names.
    fn name_type(&self, name: &str) -> String {
        if let Some(ty) = self.locals.get(name) {
            return ty.to_string();
        }
        if let Some(ty) = self.project.visible_field_type(self.current_type, name) {
            return ty.to_string();
        }
        self.resolver.resolve(name)
    }
}
