//! Resolution pass: walks every executable body of a file and emits
//! caller -> callee edges.

use crate::indexer::context::ProjectContext;
use crate::indexer::declarations::static_init_name;
use crate::indexer::imports::ImportTable;
use crate::indexer::locals::{collect_locals, LocalScope};
use crate::indexer::resolve::CallSite;
use crate::qualname;
use crate::syntax::{CompilationUnit, Expr, Member, Param, Stmt, TypeDecl};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
    pub line: u32,
}

#[derive(Debug, Default)]
pub struct FileCalls {
    pub edges: Vec<CallEdge>,
    /// Calls outside any method, constructor or static initializer.
    pub unattributed: usize,
}

pub fn extract_calls(unit: &CompilationUnit, imports: &ImportTable, project: &ProjectContext) -> FileCalls {
    let mut out = FileCalls::default();
    let package = unit.package.clone().unwrap_or_default();
    for decl in &unit.types {
        let qualified = qualname::join(&package, &decl.name);
        walk_type(decl, &qualified, imports, project, &mut out);
    }
    out
}

fn walk_type(
    decl: &TypeDecl,
    qualified: &str,
    imports: &ImportTable,
    project: &ProjectContext,
    out: &mut FileCalls,
) {
    let mut static_inits = 0;
    for member in &decl.members {
        match member {
            Member::Method(method) | Member::Constructor(method) => {
                let Some(body) = method.body.as_deref() else {
                    continue;
                };
                let caller = qualname::join(qualified, &method.name);
                walk_executable(&caller, &method.params, body, qualified, imports, project, out);
            }
            Member::Initializer(init) => {
                if init.is_static {
                    static_inits += 1;
                    let caller = qualname::join(qualified, &static_init_name(static_inits));
                    walk_executable(&caller, &[], &init.body, qualified, imports, project, out);
                } else {
                    out.unattributed += count_calls_in_stmts(&init.body);
                    walk_local_types(&init.body, qualified, imports, project, out);
                }
            }
            Member::Field(field) => {
                out.unattributed += field
                    .declarators
                    .iter()
                    .filter_map(|declarator| declarator.init.as_ref())
                    .map(count_calls)
                    .sum::<usize>();
            }
            Member::Type(nested) => {
                let nested_name = qualname::join(qualified, &nested.name);
                walk_type(nested, &nested_name, imports, project, out);
            }
        }
    }
}

fn walk_executable(
    caller: &str,
    params: &[Param],
    body: &[Stmt],
    current_type: &str,
    imports: &ImportTable,
    project: &ProjectContext,
    out: &mut FileCalls,
) {
    let resolver = project.resolver(imports);
    let locals = collect_locals(params, body, &resolver);
    let mut walker = BodyWalker {
        caller,
        site: CallSite::new(project, imports, &locals, current_type),
        edges: &mut out.edges,
    };
    walker.stmts(body);
    walk_local_types(body, current_type, imports, project, out);
}

/// Local classes get their own callers.
fn walk_local_types(
    body: &[Stmt],
    owner: &str,
    imports: &ImportTable,
    project: &ProjectContext,
    out: &mut FileCalls,
) {
    for stmt in body {
        match stmt {
            Stmt::LocalClass(decl) => {
                let qualified = qualname::join(owner, &decl.name);
                walk_type(decl, &qualified, imports, project, out);
            }
            Stmt::Block(inner) => walk_local_types(inner, owner, imports, project, out),
            Stmt::Expr(Expr::Lambda(inner)) | Stmt::Expr(Expr::Block(inner)) => {
                walk_local_types(inner, owner, imports, project, out)
            }
            Stmt::LocalVar(_) | Stmt::Expr(_) => {}
        }
    }
}

/// Collects edges for one caller. Lambdas and anonymous class bodies are
/// walked in place so their calls belong to the enclosing declaration.
struct BodyWalker<'w, 'a> {
    caller: &'w str,
    site: CallSite<'a>,
    edges: &'w mut Vec<CallEdge>,
}

impl BodyWalker<'_, '_> {
    fn push(&mut self, callee: Option<String>, line: u32) {
        let Some(callee) = callee else {
            return;
        };
        debug!("call {} -> {} (line {line})", self.caller, callee);
        self.edges.push(CallEdge {
            caller: self.caller.to_string(),
            callee,
            line,
        });
    }

    fn stmts(&mut self, body: &[Stmt]) {
        for stmt in body {
            match stmt {
                Stmt::LocalVar(local) => {
                    for declarator in &local.declarators {
                        if let Some(init) = &declarator.init {
                            self.expr(init);
                        }
                    }
                }
                Stmt::Expr(expr) => self.expr(expr),
                Stmt::Block(inner) => self.stmts(inner),
                Stmt::LocalClass(_) => {}
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Call(call) => {
                let callee = self.site.resolve_call(call);
                self.push(callee, call.line);
                if let Some(object) = call.object.as_deref() {
                    self.expr(object);
                }
                for arg in &call.args {
                    self.expr(arg);
                }
            }
            Expr::New(new) => {
                let callee = self.site.resolve_new(&new.ty);
                self.push(callee, new.line);
                for arg in &new.args {
                    self.expr(arg);
                }
                if let Some(members) = &new.body {
                    self.anonymous_body(members);
                }
            }
            Expr::ExplicitCtor {
                is_super,
                args,
                line,
            } => {
                let callee = self.site.resolve_explicit_ctor(*is_super);
                self.push(callee, *line);
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::FieldAccess { object, .. } => self.expr(object),
            Expr::Lambda(body) | Expr::Block(body) => self.stmts(body),
            Expr::Other(children) => {
                for child in children {
                    self.expr(child);
                }
            }
            Expr::Name(_) | Expr::This | Expr::Super | Expr::ClassLiteral(_) => {}
        }
    }

    fn anonymous_body(&mut self, members: &[Member]) {
        for member in members {
            match member {
                Member::Method(method) | Member::Constructor(method) => {
                    if let Some(body) = method.body.as_deref() {
                        self.stmts(body);
                    }
                }
                Member::Initializer(init) => self.stmts(&init.body),
                Member::Field(field) => {
                    for declarator in &field.declarators {
                        if let Some(init) = &declarator.init {
                            self.expr(init);
                        }
                    }
                }
                Member::Type(_) => {}
            }
        }
    }
}

fn count_calls_in_stmts(body: &[Stmt]) -> usize {
    body.iter()
        .map(|stmt| match stmt {
            Stmt::LocalVar(local) => local
                .declarators
                .iter()
                .filter_map(|declarator| declarator.init.as_ref())
                .map(count_calls)
                .sum(),
            Stmt::Expr(expr) => count_calls(expr),
            Stmt::Block(inner) => count_calls_in_stmts(inner),
            Stmt::LocalClass(_) => 0,
        })
        .sum()
}

fn count_calls(expr: &Expr) -> usize {
    match expr {
        Expr::Call(call) => {
            1 + call.object.as_deref().map(count_calls).unwrap_or(0)
                + call.args.iter().map(count_calls).sum::<usize>()
        }
        Expr::New(new) => 1 + new.args.iter().map(count_calls).sum::<usize>(),
        Expr::ExplicitCtor { args, .. } => 1 + args.iter().map(count_calls).sum::<usize>(),
        Expr::FieldAccess { object, .. } => count_calls(object),
        Expr::Lambda(body) | Expr::Block(body) => count_calls_in_stmts(body),
        Expr::Other(children) => children.iter().map(count_calls).sum(),
        Expr::Name(_) | Expr::This | Expr::Super | Expr::ClassLiteral(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::indexer::declarations::index_unit;
    use crate::indexer::imports::TypeResolver;

    const SOURCE: &str = r#"package pkg;

class A {
    private Helper helper = new Helper();
    private int size = compute();

    static {
        boot();
    }

    {
        warm();
    }

    A() {
        this(1);
    }

    A(int n) {
        helper.assist(n);
    }

    void f() {
        g();
        Runnable r = () -> helper.assist(2);
        new Thread(new Runnable() {
            public void run() { g(); }
        });
        class Local {
            void go() { f(); }
        }
    }

    void g() {}
}
"#;

    fn run(source: &str) -> FileCalls {
        let unit = crate::syntax::parse(source).unwrap();
        let config = ResolverConfig::default();
        let imports = ImportTable::from_unit(&unit, &config);
        let mut project = ProjectContext::new(config.clone());
        let decls = {
            let resolver = TypeResolver::new(&imports, &config);
            index_unit(&unit, "pkg/A.java", &resolver)
        };
        for ty in decls.types {
            project.types.insert(ty.qualified_name.clone(), ty);
        }
        for method in decls.methods {
            project.methods.insert(method);
        }
        project.fields = decls.fields;
        extract_calls(&unit, &imports, &project)
    }

    fn pairs(calls: &FileCalls) -> Vec<(String, String)> {
        let mut out: Vec<_> = calls
            .edges
            .iter()
            .map(|edge| (edge.caller.clone(), edge.callee.clone()))
            .collect();
        out.sort();
        out.dedup();
        out
    }

    #[test]
    fn attributes_calls_to_enclosing_declarations() {
        let calls = run(SOURCE);
        let pairs = pairs(&calls);
        let expected: Vec<(String, String)> = [
            ("pkg.A.A", "pkg.A.A"),
            ("pkg.A.A", "pkg.Helper.assist"),
            ("pkg.A.Local.go", "pkg.A.Local.f"),
            ("pkg.A.f", "pkg.A.g"),
            ("pkg.A.f", "pkg.Helper.assist"),
            ("pkg.A.static_init_1", "pkg.A.boot"),
        ]
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn counts_calls_outside_declarations() {
        let calls = run(SOURCE);
        assert_eq!(calls.unattributed, 3);
    }

    #[test]
    fn end_to_end_pair() {
        let calls = run("package pkg;\nclass A { void f() { g(); } void g() {} }\n");
        assert_eq!(pairs(&calls), vec![("pkg.A.f".to_string(), "pkg.A.g".to_string())]);
    }
}
