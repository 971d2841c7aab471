//! The subset of TypeScript syntax the web client is built from.

#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    Primitive(TsPrimitive),
    Array(Box<TsType>),
    /// `A | B`
    Union(Vec<TsType>),
    /// `Record<K, V>` for additionalProperties maps.
    Record {
        key: Box<TsType>,
        value: Box<TsType>,
    },
    /// Literal member of a boolean enum alias.
    Literal(TsLiteral),
    /// `Wrapper<Foo>`, `Promise<void>`
    Generic { name: String, args: Vec<TsType> },
    Ref(String),
}

impl TsType {
    pub fn string() -> Self {
        TsType::Primitive(TsPrimitive::String)
    }

    pub fn unknown() -> Self {
        TsType::Primitive(TsPrimitive::Unknown)
    }

    /// `T | null`, flattening existing unions.
    pub fn nullable(self) -> Self {
        match self {
            TsType::Union(mut types) => {
                if !types.contains(&TsType::Primitive(TsPrimitive::Null)) {
                    types.push(TsType::Primitive(TsPrimitive::Null));
                }
                TsType::Union(types)
            }
            other => TsType::Union(vec![other, TsType::Primitive(TsPrimitive::Null)]),
        }
    }

    pub fn promise(inner: TsType) -> Self {
        TsType::Generic {
            name: "Promise".into(),
            args: vec![inner],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    String,
    Number,
    Boolean,
    Null,
    Void,
    Unknown,
}

/// Property of an interface.
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    pub name: String,
    pub ty: TsType,
    pub optional: bool,
    pub doc: Option<String>,
}

/// Enum member values.
#[derive(Debug, Clone, PartialEq)]
pub enum TsLiteral {
    String(String),
    Number(f64),
    Int(i64),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsExpr {
    Ident(String),
    Literal(TsLiteral),
    Call {
        callee: Box<TsExpr>,
        args: Vec<TsExpr>,
    },
    /// Object literal; a `Spread` value prints without its key.
    Object(Vec<(String, TsExpr)>),
    Member { object: Box<TsExpr>, prop: String },
    /// Backtick template, used for request paths.
    Template(Vec<TemplatePart>),
    Await(Box<TsExpr>),
    Spread(Box<TsExpr>),
    New {
        callee: Box<TsExpr>,
        args: Vec<TsExpr>,
    },
    /// `value["kind"]`
    Index {
        object: Box<TsExpr>,
        index: Box<TsExpr>,
    },
    /// `expr as Type`
    Cast { expr: Box<TsExpr>, ty: TsType },
    Raw(String),
}

impl TsExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        TsExpr::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        TsExpr::Literal(TsLiteral::String(value.into()))
    }

    pub fn call(callee: TsExpr, args: Vec<TsExpr>) -> Self {
        TsExpr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn member(object: TsExpr, prop: impl Into<String>) -> Self {
        TsExpr::Member {
            object: Box::new(object),
            prop: prop.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    pub name: String,
    pub ty: Option<TsType>,
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Static(String),
    /// `${expr}`
    Dynamic(TsExpr),
}

/// `import [type] { A, B } from "./a";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsImport {
    pub items: Vec<String>,
    pub from: String,
    pub type_only: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    /// interface Foo<T> { ...; [key: string]: V }
    Interface {
        type_params: Vec<String>,
        properties: Vec<TsProp>,
        index_signature: Option<TsType>,
    },
    TypeAlias { ty: TsType },
    /// enum Foo { A = "a" }
    Enum { members: Vec<(String, TsLiteral)> },
}

/// Exported top-level type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeDef {
    pub name: String,
    pub doc: Option<String>,
    pub deprecated: bool,
    pub kind: TypeDefKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsStmt {
    /// `const name = init;`
    Const { name: String, init: TsExpr },
    Expr(TsExpr),
    Return(Option<TsExpr>),
    /// switch with a default arm
    Switch {
        discriminant: TsExpr,
        cases: Vec<(TsExpr, Vec<TsStmt>)>,
        default: Vec<TsStmt>,
    },
    Throw(TsExpr),
    /// Pre-formatted lines, re-indented on print.
    Raw(String),
}

/// Top-level `function`, optionally `export`ed and `async`.
#[derive(Debug, Clone, PartialEq)]
pub struct TsFunction {
    pub name: String,
    pub doc: Option<String>,
    pub deprecated: bool,
    pub type_params: Vec<String>,
    pub params: Vec<TsParam>,
    pub return_type: Option<TsType>,
    pub body: Vec<TsStmt>,
    pub is_async: bool,
    pub is_export: bool,
}
