//! Go syntax tree for structs and functions.

/// Go type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoType {
    /// `string`, `time.Time`, `User`
    Named(String),
    /// `Wrapper[User]`
    Generic { name: String, args: Vec<GoType> },
    /// `*T`
    Pointer(Box<GoType>),
    /// `[]T`
    Slice(Box<GoType>),
    /// `map[string]T`
    Map(Box<GoType>),
}

impl GoType {
    pub fn named(name: impl Into<String>) -> Self {
        GoType::Named(name.into())
    }

    pub fn pointer(self) -> Self {
        // Slices, maps and `any` already have a zero value of nil.
        let nilable = match &self {
            GoType::Slice(_) | GoType::Map(_) | GoType::Pointer(_) => true,
            GoType::Named(name) => name == "any",
            GoType::Generic { .. } => false,
        };
        if nilable { self } else { GoType::Pointer(Box::new(self)) }
    }
}

/// Struct field with its tags (`json:"id,omitempty"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoField {
    pub name: String,
    pub ty: GoType,
    pub tags: Vec<(String, String)>,
    pub doc: Option<String>,
    pub deprecated: bool,
}

/// `type Name[T any] struct { ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoStruct {
    pub name: String,
    pub doc: Option<String>,
    pub deprecated: bool,
    pub type_params: Vec<String>,
    pub fields: Vec<GoField>,
}

/// A function parameter; the type is kept as text since it may be a
/// function type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoParam {
    pub name: String,
    pub ty: String,
}

/// Top-level function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoFunc {
    pub doc: Option<String>,
    /// `e UserColor`, `u *Pet`
    pub receiver: Option<String>,
    pub name: String,
    pub params: Vec<GoParam>,
    pub results: Vec<String>,
    /// Body lines, indented relative to the function body.
    pub body: Vec<String>,
}
