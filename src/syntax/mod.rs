//! Owned syntax tree for Java sources.
//!
//! Tree-sitter output is lowered once per file into these types so the
//! indexer and resolver match on enum variants instead of probing node kinds.
//! Only the shapes the analysis needs are modelled; everything else lowers to
//! [`Expr::Other`] or [`Stmt::Block`] and keeps its nested calls reachable.

mod lower;

pub use lower::{parse, JavaParser};

use crate::model::{Modifiers, TypeKind};

/// 1-based inclusive line span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CompilationUnit {
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDecl {
    /// Dotted path without the trailing `.*`.
    pub path: String,
    pub is_static: bool,
    pub wildcard: bool,
}

#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub modifiers: Modifiers,
    pub superclass: Option<TypeRef>,
    pub interfaces: Vec<TypeRef>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Member {
    Method(MethodDecl),
    Constructor(MethodDecl),
    Initializer(Initializer),
    Field(FieldDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    /// `None` for constructors.
    pub return_type: Option<TypeRef>,
    pub params: Vec<Param>,
    pub throws: Vec<TypeRef>,
    /// `None` for abstract, interface and native declarations.
    pub body: Option<Vec<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Initializer {
    pub is_static: bool,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeRef,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: TypeRef,
    pub name: String,
    pub variadic: bool,
}

#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: String,
    /// Extra `[]` written after the variable name.
    pub dims: u32,
    pub init: Option<Expr>,
}

/// A type as written, generic arguments erased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Simple or dotted name (`String`, `Map.Entry`, `java.util.List`).
    pub name: String,
    pub dims: u32,
    pub primitive: bool,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dims: 0,
            primitive: false,
        }
    }

    pub fn with_extra_dims(&self, dims: u32) -> Self {
        Self {
            dims: self.dims + dims,
            ..self.clone()
        }
    }

    /// `var` in a local declaration.
    pub fn is_inferred(&self) -> bool {
        self.name == "var" && self.dims == 0
    }

    pub fn render(&self) -> String {
        let mut out = self.name.clone();
        for _ in 0..self.dims {
            out.push_str("[]");
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct LocalVar {
    pub ty: TypeRef,
    pub declarators: Vec<Declarator>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    LocalVar(LocalVar),
    LocalClass(TypeDecl),
    Expr(Expr),
    /// Any compound statement; conditions and bodies appear in order.
    Block(Vec<Stmt>),
}

#[derive(Debug, Clone)]
pub struct Call {
    pub object: Option<Box<Expr>>,
    pub name: String,
    pub args: Vec<Expr>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct New {
    pub ty: TypeRef,
    pub args: Vec<Expr>,
    /// Anonymous class body.
    pub body: Option<Vec<Member>>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Call(Call),
    New(New),
    /// `this(...)` or `super(...)` at the top of a constructor body.
    ExplicitCtor {
        is_super: bool,
        args: Vec<Expr>,
        line: u32,
    },
    FieldAccess {
        object: Box<Expr>,
        field: String,
    },
    Name(String),
    This,
    Super,
    ClassLiteral(TypeRef),
    Lambda(Vec<Stmt>),
    /// Statements nested in an expression, e.g. switch expression arms.
    Block(Vec<Stmt>),
    Other(Vec<Expr>),
}

impl Expr {
    /// `a.b.c` as a dotted string when the expression is a plain name chain.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Expr::Name(name) => Some(name.clone()),
            Expr::FieldAccess { object, field } => {
                let head = object.dotted_name()?;
                Some(format!("{head}.{field}"))
            }
            _ => None,
        }
    }
}

impl TypeDecl {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Method(method) | Member::Constructor(method) => Some(method),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_name_only_for_name_chains() {
        let chain = Expr::FieldAccess {
            object: Box::new(Expr::FieldAccess {
                object: Box::new(Expr::Name("com".into())),
                field: "acme".into(),
            }),
            field: "Util".into(),
        };
        assert_eq!(chain.dotted_name().as_deref(), Some("com.acme.Util"));
        let this_field = Expr::FieldAccess {
            object: Box::new(Expr::This),
            field: "repo".into(),
        };
        assert_eq!(this_field.dotted_name(), None);
    }

    #[test]
    fn type_ref_render() {
        let ty = TypeRef::named("String").with_extra_dims(2);
        assert_eq!(ty.render(), "String[][]");
        assert!(TypeRef::named("var").is_inferred());
    }
}
