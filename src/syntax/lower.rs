use super::{
    Call, CompilationUnit, Declarator, Expr, FieldDecl, ImportDecl, Initializer, LocalVar, Member,
    MethodDecl, New, Param, Span, Stmt, TypeDecl, TypeRef,
};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::model::{Modifier, Modifiers, TypeKind};
use anyhow::Result;
use tree_sitter::{Node, Parser};

pub struct JavaParser {
    parser: Parser,
    lenient: bool,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_java::LANGUAGE;
        parser.set_language(&language.into())?;
        Ok(Self {
            parser,
            lenient: Config::get().lenient_parse,
        })
    }

    /// Accept trees with error nodes instead of rejecting the file.
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn parse(&mut self, source: &str, path: &str) -> Result<CompilationUnit, AnalysisError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| AnalysisError::parse(path, "parser returned no tree"))?;
        let root = tree.root_node();
        if root.has_error() && !self.lenient {
            let line = first_error_line(root).unwrap_or(1);
            return Err(AnalysisError::parse(
                path,
                format!("syntax error near line {line}"),
            ));
        }
        Ok(lower_program(root, source))
    }
}

/// One-shot parse with a fresh parser.
pub fn parse(source: &str) -> Result<CompilationUnit, AnalysisError> {
    let mut parser =
        JavaParser::new().map_err(|err| AnalysisError::parse("<memory>", err.to_string()))?;
    parser.parse(source, "<memory>")
}

fn first_error_line(node: Node<'_>) -> Option<u32> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row as u32 + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            if let Some(line) = first_error_line(child) {
                return Some(line);
            }
        }
    }
    None
}

fn lower_program(root: Node<'_>, source: &str) -> CompilationUnit {
    let mut unit = CompilationUnit::default();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_declaration" => unit.package = package_name(child, source),
            "import_declaration" => {
                if let Some(import) = lower_import(child, source) {
                    unit.imports.push(import);
                }
            }
            _ => {
                if let Some(decl) = lower_type_decl(child, source) {
                    unit.types.push(decl);
                }
            }
        }
    }
    unit
}

fn package_name(node: Node<'_>, source: &str) -> Option<String> {
    let mut cursor = node.walk();
    let found = node
        .named_children(&mut cursor)
        .find(|child| matches!(child.kind(), "scoped_identifier" | "identifier"));
    found.map(|child| strip_whitespace(&node_text(child, source)))
}

fn lower_import(node: Node<'_>, source: &str) -> Option<ImportDecl> {
    let mut path = None;
    let mut is_static = false;
    let mut wildcard = false;
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "static" => is_static = true,
            "asterisk" => wildcard = true,
            "scoped_identifier" | "identifier" => {
                path = Some(strip_whitespace(&node_text(child, source)))
            }
            _ => {}
        }
    }
    Some(ImportDecl {
        path: path?,
        is_static,
        wildcard,
    })
}

fn type_kind(kind: &str) -> Option<TypeKind> {
    match kind {
        "class_declaration" => Some(TypeKind::Class),
        "interface_declaration" => Some(TypeKind::Interface),
        "enum_declaration" => Some(TypeKind::Enum),
        "record_declaration" => Some(TypeKind::Record),
        "annotation_type_declaration" => Some(TypeKind::Annotation),
        _ => None,
    }
}

fn lower_type_decl(node: Node<'_>, source: &str) -> Option<TypeDecl> {
    let kind = type_kind(node.kind())?;
    let name = node_text(node.child_by_field_name("name")?, source);
    let superclass = node
        .child_by_field_name("superclass")
        .and_then(|sup| sup.named_child(0))
        .map(|ty| lower_type(ty, source));

    let mut interfaces = Vec::new();
    if let Some(list) = node.child_by_field_name("interfaces") {
        collect_type_list(list, source, &mut interfaces);
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "extends_interfaces" {
            collect_type_list(child, source, &mut interfaces);
        }
    }

    let mut members = Vec::new();
    let record_params = if kind == TypeKind::Record {
        let params = node
            .child_by_field_name("parameters")
            .map(|params| lower_params(params, source))
            .unwrap_or_default();
        for param in &params {
            members.push(Member::Field(FieldDecl {
                modifiers: [Modifier::Private, Modifier::Final].into_iter().collect(),
                ty: param.ty.clone(),
                declarators: vec![Declarator {
                    name: param.name.clone(),
                    dims: 0,
                    init: None,
                }],
                span: span(node),
            }));
        }
        params
    } else {
        Vec::new()
    };
    if let Some(body) = node.child_by_field_name("body") {
        lower_body(body, source, &name, &record_params, &mut members);
    }

    Some(TypeDecl {
        name,
        kind,
        modifiers: modifiers_of(node),
        superclass,
        interfaces,
        members,
        span: span(node),
    })
}

fn collect_type_list(node: Node<'_>, source: &str, out: &mut Vec<TypeRef>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "type_list" => collect_type_list(child, source, out),
            kind if is_type_kind(kind) => out.push(lower_type(child, source)),
            _ => {}
        }
    }
}

/// Members of a class, interface, enum, record or anonymous class body.
fn lower_body(
    body: Node<'_>,
    source: &str,
    owner: &str,
    record_params: &[Param],
    out: &mut Vec<Member>,
) {
    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "method_declaration" => {
                if let Some(method) = lower_method(child, source, false) {
                    out.push(Member::Method(method));
                }
            }
            "constructor_declaration" => {
                if let Some(ctor) = lower_method(child, source, true) {
                    out.push(Member::Constructor(ctor));
                }
            }
            "compact_constructor_declaration" => {
                if let Some(mut ctor) = lower_method(child, source, true) {
                    ctor.params = record_params.to_vec();
                    out.push(Member::Constructor(ctor));
                }
            }
            "field_declaration" | "constant_declaration" => {
                out.push(Member::Field(lower_field(child, source)));
            }
            "static_initializer" | "block" => {
                let is_static = child.kind() == "static_initializer";
                let block = if is_static {
                    let mut inner = child.walk();
                    let found = child
                        .named_children(&mut inner)
                        .find(|node| node.kind() == "block");
                    found
                } else {
                    Some(child)
                };
                out.push(Member::Initializer(Initializer {
                    is_static,
                    body: block.map(|b| lower_block(b, source)).unwrap_or_default(),
                    span: span(child),
                }));
            }
            "enum_constant" => {
                let Some(name) = child.child_by_field_name("name") else {
                    continue;
                };
                out.push(Member::Field(FieldDecl {
                    modifiers: [Modifier::Public, Modifier::Static, Modifier::Final]
                        .into_iter()
                        .collect(),
                    ty: TypeRef::named(owner),
                    declarators: vec![Declarator {
                        name: node_text(name, source),
                        dims: 0,
                        init: None,
                    }],
                    span: span(child),
                }));
            }
            "enum_body_declarations" => lower_body(child, source, owner, record_params, out),
            kind if type_kind(kind).is_some() => {
                if let Some(decl) = lower_type_decl(child, source) {
                    out.push(Member::Type(decl));
                }
            }
            _ => {}
        }
    }
}

fn lower_method(node: Node<'_>, source: &str, constructor: bool) -> Option<MethodDecl> {
    let name = node_text(node.child_by_field_name("name")?, source);
    let return_type = if constructor {
        None
    } else {
        node.child_by_field_name("type").map(|ty| {
            let extra = node
                .child_by_field_name("dimensions")
                .map(count_dims)
                .unwrap_or(0);
            lower_type(ty, source).with_extra_dims(extra)
        })
    };
    let params = node
        .child_by_field_name("parameters")
        .map(|params| lower_params(params, source))
        .unwrap_or_default();

    let mut throws = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "throws" {
            collect_type_list(child, source, &mut throws);
        }
    }

    Some(MethodDecl {
        name,
        modifiers: modifiers_of(node),
        return_type,
        params,
        throws,
        body: node
            .child_by_field_name("body")
            .map(|body| lower_block(body, source)),
        span: span(node),
    })
}

fn lower_params(node: Node<'_>, source: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "formal_parameter" => {
                let (Some(ty), Some(name)) = (
                    child.child_by_field_name("type"),
                    child.child_by_field_name("name"),
                ) else {
                    continue;
                };
                let extra = child
                    .child_by_field_name("dimensions")
                    .map(count_dims)
                    .unwrap_or(0);
                params.push(Param {
                    ty: lower_type(ty, source).with_extra_dims(extra),
                    name: node_text(name, source),
                    variadic: false,
                });
            }
            "spread_parameter" => {
                let mut ty = None;
                let mut name = None;
                let mut inner = child.walk();
                for part in child.named_children(&mut inner) {
                    match part.kind() {
                        "variable_declarator" => {
                            name = part
                                .child_by_field_name("name")
                                .map(|n| node_text(n, source));
                        }
                        "identifier" => name = Some(node_text(part, source)),
                        kind if is_type_kind(kind) && ty.is_none() => {
                            ty = Some(lower_type(part, source));
                        }
                        _ => {}
                    }
                }
                if let (Some(ty), Some(name)) = (ty, name) {
                    params.push(Param {
                        ty,
                        name,
                        variadic: true,
                    });
                }
            }
            _ => {}
        }
    }
    params
}

fn lower_field(node: Node<'_>, source: &str) -> FieldDecl {
    let ty = node
        .child_by_field_name("type")
        .map(|ty| lower_type(ty, source))
        .unwrap_or_else(|| TypeRef::named("Object"));
    FieldDecl {
        modifiers: modifiers_of(node),
        ty,
        declarators: lower_declarators(node, source),
        span: span(node),
    }
}

fn lower_declarators(node: Node<'_>, source: &str) -> Vec<Declarator> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    for declarator in node.children_by_field_name("declarator", &mut cursor) {
        let Some(name) = declarator.child_by_field_name("name") else {
            continue;
        };
        out.push(Declarator {
            name: node_text(name, source),
            dims: declarator
                .child_by_field_name("dimensions")
                .map(count_dims)
                .unwrap_or(0),
            init: declarator
                .child_by_field_name("value")
                .map(|value| lower_expr(value, source)),
        });
    }
    out
}

fn lower_block(node: Node<'_>, source: &str) -> Vec<Stmt> {
    let mut stmts = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if let Some(stmt) = lower_stmt(child, source) {
            stmts.push(stmt);
        }
    }
    stmts
}

fn lower_stmt(node: Node<'_>, source: &str) -> Option<Stmt> {
    let stmt = match node.kind() {
        "line_comment" | "block_comment" => return None,
        "local_variable_declaration" => Stmt::LocalVar(LocalVar {
            ty: lower_type(node.child_by_field_name("type")?, source),
            declarators: lower_declarators(node, source),
        }),
        "expression_statement" => Stmt::Expr(lower_expr(node.named_child(0)?, source)),
        "enhanced_for_statement" => {
            let mut parts = Vec::new();
            if let (Some(ty), Some(name)) = (
                node.child_by_field_name("type"),
                node.child_by_field_name("name"),
            ) {
                parts.push(Stmt::LocalVar(LocalVar {
                    ty: lower_type(ty, source),
                    declarators: vec![Declarator {
                        name: node_text(name, source),
                        dims: node
                            .child_by_field_name("dimensions")
                            .map(count_dims)
                            .unwrap_or(0),
                        init: None,
                    }],
                }));
            }
            if let Some(value) = node.child_by_field_name("value") {
                parts.push(Stmt::Expr(lower_expr(value, source)));
            }
            if let Some(body) = node.child_by_field_name("body").and_then(|b| lower_stmt(b, source))
            {
                parts.push(body);
            }
            Stmt::Block(parts)
        }
        "catch_formal_parameter" => {
            let name = node_text(node.child_by_field_name("name")?, source);
            let mut cursor = node.walk();
            let catch_type = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "catch_type")?;
            let mut inner = catch_type.walk();
            let first = catch_type
                .named_children(&mut inner)
                .find(|child| is_type_kind(child.kind()))?;
            Stmt::LocalVar(LocalVar {
                ty: lower_type(first, source),
                declarators: vec![Declarator {
                    name,
                    dims: 0,
                    init: None,
                }],
            })
        }
        "resource" => match (
            node.child_by_field_name("type"),
            node.child_by_field_name("name"),
        ) {
            (Some(ty), Some(name)) => Stmt::LocalVar(LocalVar {
                ty: lower_type(ty, source),
                declarators: vec![Declarator {
                    name: node_text(name, source),
                    dims: 0,
                    init: node
                        .child_by_field_name("value")
                        .map(|value| lower_expr(value, source)),
                }],
            }),
            _ => Stmt::Expr(lower_expr(node.named_child(0)?, source)),
        },
        kind if type_kind(kind).is_some() => Stmt::LocalClass(lower_type_decl(node, source)?),
        kind if is_expression_kind(kind) => Stmt::Expr(lower_expr(node, source)),
        _ => Stmt::Block(lower_block(node, source)),
    };
    Some(stmt)
}

fn lower_expr(node: Node<'_>, source: &str) -> Expr {
    let line = node.start_position().row as u32 + 1;
    match node.kind() {
        "method_invocation" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| node_text(n, source))
                .unwrap_or_default();
            Expr::Call(Call {
                object: node
                    .child_by_field_name("object")
                    .map(|object| Box::new(lower_expr(object, source))),
                name,
                args: lower_args(node, source),
                line,
            })
        }
        "object_creation_expression" => {
            let ty = node
                .child_by_field_name("type")
                .map(|ty| lower_type(ty, source))
                .unwrap_or_else(|| TypeRef::named("Object"));
            let mut cursor = node.walk();
            let class_body = node
                .named_children(&mut cursor)
                .find(|child| child.kind() == "class_body");
            let body = class_body.map(|body| {
                let mut members = Vec::new();
                lower_body(body, source, &ty.name, &[], &mut members);
                members
            });
            Expr::New(New {
                ty,
                args: lower_args(node, source),
                body,
                line,
            })
        }
        "explicit_constructor_invocation" => {
            let is_super = node
                .child_by_field_name("constructor")
                .map(|ctor| ctor.kind() == "super")
                .unwrap_or(false);
            Expr::ExplicitCtor {
                is_super,
                args: lower_args(node, source),
                line,
            }
        }
        "field_access" => {
            let (Some(object), Some(field)) = (
                node.child_by_field_name("object"),
                node.child_by_field_name("field"),
            ) else {
                return Expr::Other(Vec::new());
            };
            Expr::FieldAccess {
                object: Box::new(lower_expr(object, source)),
                field: node_text(field, source),
            }
        }
        "identifier" => Expr::Name(node_text(node, source)),
        "this" => Expr::This,
        "super" => Expr::Super,
        "class_literal" => match node.named_child(0) {
            Some(ty) => Expr::ClassLiteral(lower_type(ty, source)),
            None => Expr::Other(Vec::new()),
        },
        "lambda_expression" => {
            let body = match node.child_by_field_name("body") {
                Some(body) if body.kind() == "block" => lower_block(body, source),
                Some(body) => vec![Stmt::Expr(lower_expr(body, source))],
                None => Vec::new(),
            };
            Expr::Lambda(body)
        }
        kind if is_statement_kind(kind) => Expr::Block(lower_stmt(node, source).into_iter().collect()),
        _ => {
            let mut children = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if matches!(child.kind(), "line_comment" | "block_comment") {
                    continue;
                }
                children.push(lower_expr(child, source));
            }
            Expr::Other(children)
        }
    }
}

fn lower_args(node: Node<'_>, source: &str) -> Vec<Expr> {
    let Some(arguments) = node.child_by_field_name("arguments") else {
        return Vec::new();
    };
    let mut args = Vec::new();
    let mut cursor = arguments.walk();
    for child in arguments.named_children(&mut cursor) {
        if matches!(child.kind(), "line_comment" | "block_comment") {
            continue;
        }
        args.push(lower_expr(child, source));
    }
    args
}

fn lower_type(node: Node<'_>, source: &str) -> TypeRef {
    match node.kind() {
        "array_type" => {
            let dims = node
                .child_by_field_name("dimensions")
                .map(count_dims)
                .unwrap_or(1);
            match node.child_by_field_name("element") {
                Some(element) => lower_type(element, source).with_extra_dims(dims),
                None => TypeRef::named(strip_generics(&node_text(node, source))),
            }
        }
        "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => TypeRef {
            name: node_text(node, source),
            dims: 0,
            primitive: true,
        },
        "generic_type" | "annotated_type" => {
            let mut cursor = node.walk();
            let base = node
                .named_children(&mut cursor)
                .filter(|child| matches!(child.kind(), "type_identifier" | "scoped_type_identifier"))
                .last();
            match base {
                Some(base) => lower_type(base, source),
                None => TypeRef::named(strip_generics(&node_text(node, source))),
            }
        }
        _ => TypeRef::named(strip_generics(&node_text(node, source))),
    }
}

fn modifiers_of(node: Node<'_>) -> Modifiers {
    let mut out = Modifiers::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() != "modifiers" {
            continue;
        }
        let mut inner = child.walk();
        for token in child.children(&mut inner) {
            if let Some(modifier) = Modifier::from_keyword(token.kind()) {
                out.insert(modifier);
            }
        }
    }
    out
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "array_type"
            | "annotated_type"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
            | "void_type"
    )
}

fn is_expression_kind(kind: &str) -> bool {
    matches!(
        kind,
        "method_invocation"
            | "object_creation_expression"
            | "explicit_constructor_invocation"
            | "field_access"
            | "identifier"
            | "this"
            | "super"
            | "class_literal"
            | "lambda_expression"
            | "assignment_expression"
            | "binary_expression"
            | "unary_expression"
            | "update_expression"
            | "ternary_expression"
            | "cast_expression"
            | "instanceof_expression"
            | "parenthesized_expression"
            | "array_access"
            | "array_creation_expression"
            | "array_initializer"
            | "method_reference"
            | "switch_expression"
    )
}

fn is_statement_kind(kind: &str) -> bool {
    kind == "block"
        || kind.ends_with("_statement")
        || matches!(
            kind,
            "local_variable_declaration"
                | "switch_block"
                | "switch_block_statement_group"
                | "switch_rule"
        )
}

fn count_dims(node: Node<'_>) -> u32 {
    let mut cursor = node.walk();
    let count = node
        .children(&mut cursor)
        .filter(|child| child.kind() == "[")
        .count() as u32;
    count.max(1)
}

/// Drops generic arguments and whitespace: `Map<K, V>` -> `Map`.
fn strip_generics(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ch if depth > 0 || ch.is_whitespace() => {}
            ch => out.push(ch),
        }
    }
    out
}

fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|ch| !ch.is_whitespace()).collect()
}

fn span(node: Node<'_>) -> Span {
    let start = node.start_position();
    let end = node.end_position();
    let end_row = if end.column == 0 && end.row > start.row {
        end.row
    } else {
        end.row + 1
    };
    Span {
        start_line: start.row as u32 + 1,
        end_line: end_row as u32,
    }
}

fn node_text(node: Node<'_>, source: &str) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    source.get(start..end).unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"package com.acme.app;

import java.util.List;
import java.util.*;
import static com.acme.util.Strings.join;

public class Service extends Base implements Runnable, Comparable<Service> {
    private final Repo repo;
    private int[] counts, totals[];

    static {
        init();
    }

    public Service(Repo repo) {
        super(repo);
        this.repo = repo;
    }

    @Override
    public void run() {
        List<String> names = repo.names();
        for (String name : names) {
            process(name);
        }
        Runnable r = () -> helper.work();
    }

    abstract int size(String... parts);

    class Inner {
        void go() {}
    }
}
"#;

    fn parse_sample() -> CompilationUnit {
        parse(SAMPLE).expect("sample parses")
    }

    #[test]
    fn lowers_package_and_imports() {
        let unit = parse_sample();
        assert_eq!(unit.package.as_deref(), Some("com.acme.app"));
        assert_eq!(
            unit.imports,
            vec![
                ImportDecl {
                    path: "java.util.List".into(),
                    is_static: false,
                    wildcard: false
                },
                ImportDecl {
                    path: "java.util".into(),
                    is_static: false,
                    wildcard: true
                },
                ImportDecl {
                    path: "com.acme.util.Strings.join".into(),
                    is_static: true,
                    wildcard: false
                },
            ]
        );
    }

    #[test]
    fn lowers_type_header_and_members() {
        let unit = parse_sample();
        let service = &unit.types[0];
        assert_eq!(service.name, "Service");
        assert_eq!(service.kind, TypeKind::Class);
        assert!(service.modifiers.contains(&Modifier::Public));
        assert_eq!(service.superclass.as_ref().map(|t| t.name.as_str()), Some("Base"));
        let interfaces: Vec<_> = service.interfaces.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(interfaces, vec!["Runnable", "Comparable"]);

        let fields: Vec<_> = service.fields().collect();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].ty.render(), "int[]");
        assert_eq!(fields[1].declarators[1].name, "totals");
        assert_eq!(fields[1].declarators[1].dims, 1);

        let names: Vec<_> = service.methods().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Service", "run", "size"]);

        let size = service.methods().find(|m| m.name == "size").unwrap();
        assert!(size.body.is_none());
        assert!(size.params[0].variadic);
        assert_eq!(size.params[0].ty.name, "String");

        assert!(service
            .members
            .iter()
            .any(|m| matches!(m, Member::Initializer(init) if init.is_static)));
        assert!(service
            .members
            .iter()
            .any(|m| matches!(m, Member::Type(inner) if inner.name == "Inner")));
    }

    #[test]
    fn method_spans_cover_annotations_and_body() {
        let unit = parse_sample();
        let run = unit.types[0].methods().find(|m| m.name == "run").unwrap();
        assert_eq!(run.span.start_line, 20);
        assert_eq!(run.span.end_line, 27);
    }

    #[test]
    fn lowers_calls_in_body() {
        let unit = parse_sample();
        let ctor = unit.types[0].methods().find(|m| m.name == "Service").unwrap();
        let body = ctor.body.as_ref().unwrap();
        assert!(matches!(
            &body[0],
            Stmt::Expr(Expr::ExplicitCtor { is_super: true, .. })
        ));

        let run = unit.types[0].methods().find(|m| m.name == "run").unwrap();
        let body = run.body.as_ref().unwrap();
        let Stmt::LocalVar(local) = &body[0] else {
            panic!("expected local declaration");
        };
        assert_eq!(local.ty.name, "List");
        let Some(Expr::Call(call)) = &local.declarators[0].init else {
            panic!("expected call initializer");
        };
        assert_eq!(call.name, "names");
        assert!(matches!(call.object.as_deref(), Some(Expr::Name(n)) if n == "repo"));
        assert_eq!(call.line, 22);
    }

    #[test]
    fn strict_mode_rejects_broken_source() {
        let mut parser = JavaParser::new().unwrap().with_lenient(false);
        let err = parser.parse("class A { void f( { }", "A.java").unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { .. }));

        let mut lenient = JavaParser::new().unwrap().with_lenient(true);
        assert!(lenient.parse("class A { void f( { }", "A.java").is_ok());
    }

    #[test]
    fn strip_generics_handles_nesting() {
        assert_eq!(strip_generics("Map<String, List<Integer>>"), "Map");
        assert_eq!(strip_generics("Outer<T>.Inner"), "Outer.Inner");
    }
}
