//! Dart syntax tree, limited to what freezed models and retrofit clients
//! need.

/// A Dart type reference: `String`, `List<int>?`, `Wrapper<User>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartType {
    pub name: String,
    pub args: Vec<DartType>,
    pub nullable: bool,
}

impl DartType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<DartType>) -> Self {
        Self {
            name: name.into(),
            args,
            nullable: false,
        }
    }

    pub fn dynamic() -> Self {
        Self::named("dynamic")
    }

    pub fn list(inner: DartType) -> Self {
        Self::generic("List", vec![inner])
    }

    /// `T?`; `dynamic` is already nullable and stays as is.
    pub fn nullable(mut self) -> Self {
        if self.name != "dynamic" {
            self.nullable = true;
        }
        self
    }

    pub fn is_list(&self) -> bool {
        self.name == "List"
    }
}

/// `@name` or `@name(args)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub name: String,
    pub args: Option<String>,
}

impl Annotation {
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }

    pub fn with_args(name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Some(args.into()),
        }
    }
}

/// Parameter of a factory, constructor or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartParam {
    pub annotations: Vec<Annotation>,
    /// Prefix with `required` (named parameters only).
    pub required: bool,
    pub ty: DartType,
    pub name: String,
}

/// Member of a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassMember {
    /// `const factory Name.variant({...}) = Redirect;`
    Factory {
        doc: Option<String>,
        name: Option<String>,
        params: Vec<DartParam>,
        redirect: String,
    },
    /// `final T name;`
    Field {
        annotations: Vec<Annotation>,
        ty: DartType,
        name: String,
    },
    /// A member whose text does not fit the tree, one entry per line.
    Raw(Vec<String>),
}

/// A class declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartClass {
    pub doc: Option<String>,
    pub deprecated: bool,
    pub annotations: Vec<Annotation>,
    /// Everything between `class` and `{`, e.g. `User with _$User`.
    pub header: String,
    pub members: Vec<ClassMember>,
}

/// An enum member with its wire literal (already rendered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartEnumMember {
    pub name: String,
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartEnum {
    pub doc: Option<String>,
    pub deprecated: bool,
    pub name: String,
    pub members: Vec<DartEnumMember>,
    /// Type returned by `toJson`.
    pub json_type: DartType,
}

/// Abstract retrofit method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DartMethod {
    pub doc: Option<String>,
    pub deprecated: bool,
    pub annotations: Vec<Annotation>,
    pub return_type: DartType,
    pub name: String,
    pub positional: Vec<DartParam>,
    pub named: Vec<DartParam>,
}
