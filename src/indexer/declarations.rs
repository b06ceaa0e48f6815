//! Declaration pass: turns a lowered compilation unit into type records,
//! method records and per-type field tables.

use crate::indexer::imports::TypeResolver;
use crate::model::{DeclKind, LineRange, MethodRecord, Modifier, Parameter, TypeRecord};
use crate::qualname;
use crate::syntax::{CompilationUnit, Expr, MethodDecl, Member, Stmt, TypeDecl};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone)]
pub struct FileDeclarations {
    pub types: Vec<TypeRecord>,
    /// Source order.
    pub methods: Vec<MethodRecord>,
    pub fields: BTreeMap<String, BTreeMap<String, String>>,
}

impl FileDeclarations {
    /// Qualified name and range of every declaration, in source order.
    pub fn ranges(&self) -> Vec<(String, LineRange)> {
        self.methods
            .iter()
            .map(|record| (record.qualified_name(), record.range()))
            .collect()
    }
}

pub fn index_unit(unit: &CompilationUnit, rel_path: &str, resolver: &TypeResolver<'_>) -> FileDeclarations {
    let mut out = FileDeclarations::default();
    let package = unit.package.clone().unwrap_or_default();
    for decl in &unit.types {
        let qualified = qualname::join(&package, &decl.name);
        index_type(decl, &qualified, rel_path, resolver, &mut out);
    }
    out
}

fn index_type(
    decl: &TypeDecl,
    qualified: &str,
    rel_path: &str,
    resolver: &TypeResolver<'_>,
    out: &mut FileDeclarations,
) {
    out.types.push(TypeRecord {
        qualified_name: qualified.to_string(),
        file_path: rel_path.to_string(),
        kind: decl.kind,
        modifiers: decl.modifiers.clone(),
        superclass: decl.superclass.as_ref().map(|ty| resolver.resolve_ref(ty)),
        interfaces: decl
            .interfaces
            .iter()
            .map(|ty| resolver.resolve_ref(ty))
            .collect(),
    });

    let mut static_inits = 0;
    for member in &decl.members {
        match member {
            Member::Method(method) => {
                out.methods
                    .push(method_record(method, false, qualified, rel_path, resolver));
                index_local_types(method.body.as_deref(), qualified, rel_path, resolver, out);
            }
            Member::Constructor(ctor) => {
                out.methods
                    .push(method_record(ctor, true, qualified, rel_path, resolver));
                index_local_types(ctor.body.as_deref(), qualified, rel_path, resolver, out);
            }
            Member::Initializer(init) => {
                if init.is_static {
                    static_inits += 1;
                    out.methods.push(MethodRecord {
                        name: static_init_name(static_inits),
                        owner: qualified.to_string(),
                        file_path: rel_path.to_string(),
                        kind: DeclKind::StaticInitializer,
                        modifiers: [Modifier::Static].into_iter().collect(),
                        signature: "static {}".to_string(),
                        parameters: Vec::new(),
                        return_type: None,
                        throws: Vec::new(),
                        start_line: init.span.start_line,
                        end_line: init.span.end_line,
                    });
                }
                index_local_types(Some(&init.body), qualified, rel_path, resolver, out);
            }
            Member::Field(field) => {
                let table = out.fields.entry(qualified.to_string()).or_default();
                for declarator in &field.declarators {
                    let ty = field.ty.with_extra_dims(declarator.dims);
                    table.insert(declarator.name.clone(), resolver.resolve_ref(&ty));
                }
            }
            Member::Type(nested) => {
                let nested_name = qualname::join(qualified, &nested.name);
                index_type(nested, &nested_name, rel_path, resolver, out);
            }
        }
    }
}

pub fn static_init_name(ordinal: usize) -> String {
    format!("static_init_{ordinal}")
}

/// Local classes are indexed as members of the enclosing type. Anonymous
/// class bodies are not.
fn index_local_types(
    body: Option<&[Stmt]>,
    owner: &str,
    rel_path: &str,
    resolver: &TypeResolver<'_>,
    out: &mut FileDeclarations,
) {
    let Some(body) = body else {
        return;
    };
    for stmt in body {
        match stmt {
            Stmt::LocalClass(decl) => {
                let qualified = qualname::join(owner, &decl.name);
                index_type(decl, &qualified, rel_path, resolver, out);
            }
            Stmt::Block(inner) => index_local_types(Some(inner), owner, rel_path, resolver, out),
            Stmt::Expr(Expr::Lambda(inner)) | Stmt::Expr(Expr::Block(inner)) => {
                index_local_types(Some(inner), owner, rel_path, resolver, out)
            }
            Stmt::LocalVar(_) | Stmt::Expr(_) => {}
        }
    }
}

fn method_kind(method: &MethodDecl, constructor: bool) -> DeclKind {
    if constructor {
        DeclKind::Constructor
    } else if method.modifiers.contains(&Modifier::Static) {
        DeclKind::StaticMethod
    } else if method.modifiers.contains(&Modifier::Abstract)
        || (method.body.is_none() && !method.modifiers.contains(&Modifier::Native))
    {
        DeclKind::AbstractMethod
    } else {
        DeclKind::Method
    }
}

fn method_record(
    method: &MethodDecl,
    constructor: bool,
    owner: &str,
    rel_path: &str,
    resolver: &TypeResolver<'_>,
) -> MethodRecord {
    let parameters = method
        .params
        .iter()
        .map(|param| Parameter {
            type_name: resolver.resolve_ref(&param.ty),
            name: param.name.clone(),
            variadic: param.variadic,
        })
        .collect();
    MethodRecord {
        name: method.name.clone(),
        owner: owner.to_string(),
        file_path: rel_path.to_string(),
        kind: method_kind(method, constructor),
        modifiers: method.modifiers.clone(),
        signature: render_signature(method),
        parameters,
        return_type: method.return_type.as_ref().map(|ty| resolver.resolve_ref(ty)),
        throws: method
            .throws
            .iter()
            .map(|ty| resolver.resolve_ref(ty))
            .collect(),
        start_line: method.span.start_line,
        end_line: method.span.end_line,
    }
}

/// `public static int parse(String raw, int... radix) throws IOException`
fn render_signature(method: &MethodDecl) -> String {
    let mut parts: Vec<String> = method
        .modifiers
        .iter()
        .map(|modifier| modifier.keyword().to_string())
        .collect();
    if let Some(ret) = &method.return_type {
        parts.push(ret.render());
    }
    let params = method
        .params
        .iter()
        .map(|param| {
            if param.variadic {
                format!("{}... {}", param.ty.render(), param.name)
            } else {
                format!("{} {}", param.ty.render(), param.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    parts.push(format!("{}({})", method.name, params));
    let mut signature = parts.join(" ");
    if !method.throws.is_empty() {
        let throws = method
            .throws
            .iter()
            .map(|ty| ty.render())
            .collect::<Vec<_>>()
            .join(", ");
        signature.push_str(" throws ");
        signature.push_str(&throws);
    }
    signature
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::indexer::imports::ImportTable;
    use crate::model::TypeKind;

    const SOURCE: &str = r#"package shop;

import shop.repo.OrderRepo;

public class OrderService extends BaseService {
    private OrderRepo repo;
    private String[] tags;

    static {
        warmUp();
    }

    public OrderService(OrderRepo repo) {
        this.repo = repo;
    }

    public static OrderService create() throws java.io.IOException {
        return new OrderService(null);
    }

    abstract void hook(int... codes);

    native void poke();

    void plan() {
        class Step {
            void run() {}
        }
        new Step().run();
    }

    interface Listener {
        void onOrder(Order order);
        default void ping() {}
    }
}
"#;

    fn index(source: &str) -> FileDeclarations {
        let unit = crate::syntax::parse(source).unwrap();
        let config = ResolverConfig::default();
        let imports = ImportTable::from_unit(&unit, &config);
        let resolver = TypeResolver::new(&imports, &config);
        index_unit(&unit, "shop/OrderService.java", &resolver)
    }

    fn find<'a>(decls: &'a FileDeclarations, name: &str) -> &'a MethodRecord {
        decls
            .methods
            .iter()
            .find(|m| m.qualified_name() == name)
            .unwrap_or_else(|| panic!("missing {name}"))
    }

    #[test]
    fn indexes_every_executable_declaration() {
        let decls = index(SOURCE);
        let names: Vec<_> = decls.methods.iter().map(|m| m.qualified_name()).collect();
        assert_eq!(
            names,
            vec![
                "shop.OrderService.static_init_1",
                "shop.OrderService.OrderService",
                "shop.OrderService.create",
                "shop.OrderService.hook",
                "shop.OrderService.poke",
                "shop.OrderService.plan",
                "shop.OrderService.Step.run",
                "shop.OrderService.Listener.onOrder",
                "shop.OrderService.Listener.ping",
            ]
        );
    }

    #[test]
    fn classifies_declaration_kinds() {
        let decls = index(SOURCE);
        assert_eq!(find(&decls, "shop.OrderService.static_init_1").kind, DeclKind::StaticInitializer);
        assert_eq!(find(&decls, "shop.OrderService.OrderService").kind, DeclKind::Constructor);
        assert_eq!(find(&decls, "shop.OrderService.create").kind, DeclKind::StaticMethod);
        assert_eq!(find(&decls, "shop.OrderService.hook").kind, DeclKind::AbstractMethod);
        assert_eq!(find(&decls, "shop.OrderService.poke").kind, DeclKind::Method);
        assert_eq!(find(&decls, "shop.OrderService.Listener.onOrder").kind, DeclKind::AbstractMethod);
        assert_eq!(find(&decls, "shop.OrderService.Listener.ping").kind, DeclKind::Method);
    }

    #[test]
    fn records_signature_and_resolved_types() {
        let decls = index(SOURCE);
        let create = find(&decls, "shop.OrderService.create");
        assert_eq!(
            create.signature,
            "public static OrderService create() throws java.io.IOException"
        );
        assert_eq!(create.return_type.as_deref(), Some("shop.OrderService"));
        assert_eq!(create.throws, vec!["java.io.IOException"]);
        assert_eq!((create.start_line, create.end_line), (17, 19));

        let ctor = find(&decls, "shop.OrderService.OrderService");
        assert_eq!(ctor.return_type, None);
        assert_eq!(ctor.parameters[0].type_name, "shop.repo.OrderRepo");

        let hook = find(&decls, "shop.OrderService.hook");
        assert!(hook.parameters[0].variadic);
        assert_eq!(hook.overload_key(), "shop.OrderService.hook(int...)");
    }

    #[test]
    fn records_types_and_fields() {
        let decls = index(SOURCE);
        let service = &decls.types[0];
        assert_eq!(service.qualified_name, "shop.OrderService");
        assert_eq!(service.superclass.as_deref(), Some("shop.BaseService"));
        let listener = decls
            .types
            .iter()
            .find(|t| t.qualified_name == "shop.OrderService.Listener")
            .unwrap();
        assert_eq!(listener.kind, TypeKind::Interface);

        let fields = &decls.fields["shop.OrderService"];
        assert_eq!(fields["repo"], "shop.repo.OrderRepo");
        assert_eq!(fields["tags"], "java.lang.String[]");
    }
}
