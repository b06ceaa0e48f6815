use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclKind {
    Method,
    StaticMethod,
    AbstractMethod,
    Constructor,
    StaticInitializer,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Method => "method",
            DeclKind::StaticMethod => "static_method",
            DeclKind::AbstractMethod => "abstract_method",
            DeclKind::Constructor => "constructor",
            DeclKind::StaticInitializer => "static_initializer",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Final,
    Abstract,
    Default,
    Synchronized,
    Native,
    Strictfp,
    Transient,
    Volatile,
    Sealed,
    NonSealed,
}

impl Modifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let modifier = match keyword {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "static" => Modifier::Static,
            "final" => Modifier::Final,
            "abstract" => Modifier::Abstract,
            "default" => Modifier::Default,
            "synchronized" => Modifier::Synchronized,
            "native" => Modifier::Native,
            "strictfp" => Modifier::Strictfp,
            "transient" => Modifier::Transient,
            "volatile" => Modifier::Volatile,
            "sealed" => Modifier::Sealed,
            "non-sealed" => Modifier::NonSealed,
            _ => return None,
        };
        Some(modifier)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Final => "final",
            Modifier::Abstract => "abstract",
            Modifier::Default => "default",
            Modifier::Synchronized => "synchronized",
            Modifier::Native => "native",
            Modifier::Strictfp => "strictfp",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
        }
    }
}

pub type Modifiers = BTreeSet<Modifier>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: u32,
    pub end_line: u32,
}

impl LineRange {
    pub fn new(start_line: u32, end_line: u32) -> Self {
        Self {
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn intersects<'a>(&self, mut lines: impl Iterator<Item = &'a u32>) -> bool {
        lines.any(|line| self.contains(*line))
    }
}

/// Identity of one declaration, independent of file or declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MethodKey {
    pub owner: String,
    pub name: String,
    pub param_types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    pub owner: String,
    pub file_path: String,
    pub kind: DeclKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    pub signature: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(default)]
    pub throws: Vec<String>,
    pub start_line: u32,
    pub end_line: u32,
}

impl MethodRecord {
    /// Graph key: `owner.name`.
    pub fn qualified_name(&self) -> String {
        crate::qualname::join(&self.owner, &self.name)
    }

    pub fn param_types(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|param| {
                if param.variadic {
                    format!("{}...", param.type_name)
                } else {
                    param.type_name.clone()
                }
            })
            .collect()
    }

    pub fn key(&self) -> MethodKey {
        MethodKey {
            owner: self.owner.clone(),
            name: self.name.clone(),
            param_types: self.param_types(),
        }
    }

    /// Per-declaration identity, `owner.name(T1,T2)`.
    pub fn overload_key(&self) -> String {
        format!("{}({})", self.qualified_name(), self.param_types().join(","))
    }

    pub fn range(&self) -> LineRange {
        LineRange::new(self.start_line, self.end_line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub qualified_name: String,
    pub file_path: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

/// Counters reported by a full index build.
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexStats {
    pub scanned: usize,
    pub indexed: usize,
    pub skipped: usize,
    pub errors: usize,
    pub types: usize,
    pub methods: usize,
    pub calls: usize,
    pub unattributed_calls: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(params: &[(&str, bool)]) -> MethodRecord {
        MethodRecord {
            name: "save".into(),
            owner: "pkg.Repo".into(),
            file_path: "pkg/Repo.java".into(),
            kind: DeclKind::Method,
            modifiers: Modifiers::new(),
            signature: "void save()".into(),
            parameters: params
                .iter()
                .enumerate()
                .map(|(idx, (ty, variadic))| Parameter {
                    type_name: ty.to_string(),
                    name: format!("p{idx}"),
                    variadic: *variadic,
                })
                .collect(),
            return_type: Some("void".into()),
            throws: Vec::new(),
            start_line: 3,
            end_line: 7,
        }
    }

    #[test]
    fn overload_key_includes_params() {
        let rec = record(&[("java.lang.String", false), ("int", true)]);
        assert_eq!(rec.qualified_name(), "pkg.Repo.save");
        assert_eq!(rec.overload_key(), "pkg.Repo.save(java.lang.String,int...)");
        assert_eq!(record(&[]).overload_key(), "pkg.Repo.save()");
    }

    #[test]
    fn range_is_inclusive() {
        let range = LineRange::new(20, 35);
        assert!(!range.contains(19));
        assert!(range.contains(20));
        assert!(range.contains(35));
        assert!(!range.contains(36));
        assert!(!range.intersects([19u32, 36].iter()));
    }

    #[test]
    fn modifier_keywords_round_trip() {
        for keyword in ["public", "static", "non-sealed", "default"] {
            let modifier = Modifier::from_keyword(keyword).unwrap();
            assert_eq!(modifier.keyword(), keyword);
        }
        assert_eq!(Modifier::from_keyword("@Override"), None);
    }
}
