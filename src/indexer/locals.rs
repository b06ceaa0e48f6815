use crate::indexer::imports::TypeResolver;
use crate::syntax::{Declarator, Expr, LocalVar, Param, Stmt, TypeRef};
use std::collections::BTreeMap;

/// Parameter and local-variable types of one executable declaration.
#[derive(Debug, Default, Clone)]
pub struct LocalScope {
    vars: BTreeMap<String, String>,
}

impl LocalScope {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, ty: impl Into<String>) {
        self.vars.insert(name.into(), ty.into());
    }
}

/// Single linear walk over the body. Nested blocks are entered; lambda
/// bodies, anonymous class bodies and local classes are not.
pub fn collect_locals(params: &[Param], body: &[Stmt], resolver: &TypeResolver<'_>) -> LocalScope {
    let mut scope = LocalScope::default();
    for param in params {
        let mut ty = resolver.resolve_ref(&param.ty);
        if param.variadic {
            ty.push_str("[]");
        }
        scope.insert(param.name.clone(), ty);
    }
    walk_stmts(body, resolver, &mut scope);
    scope
}

fn walk_stmts(body: &[Stmt], resolver: &TypeResolver<'_>, scope: &mut LocalScope) {
    for stmt in body {
        match stmt {
            Stmt::LocalVar(local) => bind_local(local, resolver, scope),
            Stmt::Block(inner) => walk_stmts(inner, resolver, scope),
            Stmt::Expr(expr) => walk_expr(expr, resolver, scope),
            Stmt::LocalClass(_) => {}
        }
    }
}

/// Only statement blocks embedded in expressions (switch arms) declare
/// locals of this scope.
fn walk_expr(expr: &Expr, resolver: &TypeResolver<'_>, scope: &mut LocalScope) {
    match expr {
        Expr::Block(inner) => walk_stmts(inner, resolver, scope),
        Expr::Other(children) => {
            for child in children {
                walk_expr(child, resolver, scope);
            }
        }
        Expr::Lambda(_)
        | Expr::Call(_)
        | Expr::New(_)
        | Expr::ExplicitCtor { .. }
        | Expr::FieldAccess { .. }
        | Expr::Name(_)
        | Expr::This
        | Expr::Super
        | Expr::ClassLiteral(_) => {}
    }
}

fn bind_local(local: &LocalVar, resolver: &TypeResolver<'_>, scope: &mut LocalScope) {
    for declarator in &local.declarators {
        if let Some(ty) = local_type(&local.ty, declarator, resolver) {
            scope.insert(declarator.name.clone(), ty);
        }
    }
}

fn local_type(declared: &TypeRef, declarator: &Declarator, resolver: &TypeResolver<'_>) -> Option<String> {
    if let Some(inferred) = declarator.init.as_ref().and_then(|init| infer_from_init(init, resolver)) {
        return Some(inferred);
    }
    if declared.is_inferred() {
        return None;
    }
    Some(resolver.resolve_ref(&declared.with_extra_dims(declarator.dims)))
}

/// `new T(..)` binds to `T`; a factory call whose first argument is
/// `T.class` binds to `T`.
pub fn infer_from_init(init: &Expr, resolver: &TypeResolver<'_>) -> Option<String> {
    match init {
        Expr::New(new) => Some(resolver.resolve_ref(&new.ty)),
        Expr::Call(call) => match call.args.first() {
            Some(Expr::ClassLiteral(ty)) => Some(resolver.resolve_ref(ty)),
            _ => None,
        },
        _ => None,
    }
}
