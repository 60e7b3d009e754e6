//! Declaration model types.
//!
//! A [`Declaration`] is a tagged variant over the C++ entities the binder
//! understands. Every variant exposes the same dependency-edge list, so the
//! sorter and the import resolver never look at the kind.

use parser::BindKind;
use std::fmt;

/// How a declaration refers to another one.
///
/// Ordered by strength: when a declaration refers to the same name in several
/// ways, the strongest usage is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Usage {
    /// `T*` or `opencascade::handle<T>`. Forward declarable.
    Pointer,
    /// `T&`. Forward declarable, but the bound type must exist first.
    Reference,
    /// Plain `T`.
    Value,
    /// Public base class.
    Base,
}

impl Usage {
    /// Whether the referenced binder must be emitted before the referencing one.
    #[must_use]
    pub fn orders(self) -> bool {
        !matches!(self, Self::Pointer)
    }

    /// Whether a forward declaration is enough to compile the reference.
    #[must_use]
    pub fn is_deferrable(self) -> bool {
        matches!(self, Self::Pointer | Self::Reference)
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pointer => "pointer",
            Self::Reference => "reference",
            Self::Value => "value",
            Self::Base => "base",
        };
        write!(f, "{s}")
    }
}

/// A name appearing in a type, as spelled in the header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    pub name: String,
    pub usage: Usage,
}

/// A C++ type as written in a signature, plus the names it mentions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeRef {
    spelling: String,
    names: Vec<TypeName>,
}

impl TypeRef {
    #[must_use]
    pub fn new(spelling: String, names: Vec<TypeName>) -> Self {
        Self { spelling, names }
    }

    /// Normalized C++ spelling, e.g. `const gp_Pnt&`.
    #[must_use]
    #[inline]
    pub fn spelling(&self) -> &str {
        &self.spelling
    }

    #[must_use]
    #[inline]
    pub fn names(&self) -> &[TypeName] {
        &self.names
    }

    /// Whether the type is `const`-qualified at the top level (`const T`, not `const T*`).
    #[must_use]
    pub fn is_const_value(&self) -> bool {
        self.spelling.starts_with("const ") && !self.spelling.ends_with(['*', '&'])
    }

    /// Textually substitute whole-word `from` with `to` in the spelling and names.
    #[must_use]
    pub fn substitute(&self, from: &str, to: &str) -> Self {
        Self {
            spelling: replace_word(&self.spelling, from, to),
            names: self
                .names
                .iter()
                .map(|n| TypeName {
                    name: replace_word(&n.name, from, to),
                    usage: n.usage,
                })
                .collect(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling)
    }
}

/// Replace whole identifier occurrences of `from` in `text`.
#[must_use]
pub fn replace_word(text: &str, from: &str, to: &str) -> String {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    if from.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut consumed = 0;
    while let Some(pos) = text[consumed..].find(from).map(|p| consumed + p) {
        let before = text[..pos].chars().next_back();
        let after = text[pos + from.len()..].chars().next();
        out.push_str(&text[consumed..pos]);
        if before.is_some_and(is_ident) || after.is_some_and(is_ident) {
            out.push_str(from);
        } else {
            out.push_str(to);
        }
        consumed = pos + from.len();
    }
    out.push_str(&text[consumed..]);
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Option<String>,
    pub ty: TypeRef,
    pub has_default: bool,
}

/// Parameter list and optional return type of a callable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    pub return_type: Option<TypeRef>,
    pub params: Vec<Param>,
}

impl Signature {
    /// Comma-separated parameter spellings, as used in casts and `py::init<...>`.
    #[must_use]
    pub fn param_list(&self) -> String {
        self.params
            .iter()
            .map(|p| p.ty.spelling())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.return_type
            .iter()
            .chain(self.params.iter().map(|p| &p.ty))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub name: String,
    pub signature: Signature,
    pub is_const: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure: bool,
}

impl Method {
    /// Whether this is an operator overload (`operator+`, `operator==`, ...).
    #[must_use]
    pub fn is_operator(&self) -> bool {
        self.name.starts_with("operator")
            && self.name["operator".len()..]
                .chars()
                .next()
                .is_some_and(|c| !c.is_ascii_alphanumeric() && c != '_')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub is_static: bool,
}

/// Class or struct with a body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDecl {
    /// Public base classes as spelled.
    pub bases: Vec<String>,
    /// Public constructors.
    pub constructors: Vec<Signature>,
    /// Whether any constructor is declared, public or not.
    pub declares_constructor: bool,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    pub is_abstract: bool,
    /// Destructor declared protected or private.
    pub hidden_destructor: bool,
}

impl ClassDecl {
    pub fn types(&self) -> impl Iterator<Item = &TypeRef> {
        self.constructors
            .iter()
            .flat_map(Signature::types)
            .chain(self.methods.iter().flat_map(|m| m.signature.types()))
            .chain(self.fields.iter().map(|f| &f.ty))
    }

    /// Whether more than one public method carries `name`.
    #[must_use]
    pub fn is_overloaded(&self, name: &str) -> bool {
        self.methods.iter().filter(|m| m.name == name).count() > 1
    }

    /// The class with template parameters replaced by concrete arguments.
    #[must_use]
    pub fn substitute(&self, params: &[String], args: &[String]) -> Self {
        let sub_type = |ty: &TypeRef| {
            params
                .iter()
                .zip(args)
                .fold(ty.clone(), |ty, (from, to)| ty.substitute(from, to))
        };
        let sub_signature = |sig: &Signature| Signature {
            return_type: sig.return_type.as_ref().map(sub_type),
            params: sig
                .params
                .iter()
                .map(|p| Param {
                    name: p.name.clone(),
                    ty: sub_type(&p.ty),
                    has_default: p.has_default,
                })
                .collect(),
        };
        Self {
            bases: self
                .bases
                .iter()
                .map(|b| {
                    params
                        .iter()
                        .zip(args)
                        .fold(b.clone(), |b, (from, to)| replace_word(&b, from, to))
                })
                .collect(),
            constructors: self.constructors.iter().map(sub_signature).collect(),
            declares_constructor: self.declares_constructor,
            methods: self
                .methods
                .iter()
                .map(|m| Method {
                    signature: sub_signature(&m.signature),
                    ..m.clone()
                })
                .collect(),
            fields: self
                .fields
                .iter()
                .map(|f| Field {
                    ty: sub_type(&f.ty),
                    ..f.clone()
                })
                .collect(),
            is_abstract: self.is_abstract,
            hidden_destructor: self.hidden_destructor,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumDecl {
    pub scoped: bool,
    pub enumerators: Vec<String>,
}

/// Free function; same-named declarations are merged into one overload set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionDecl {
    pub overloads: Vec<Signature>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypedefDecl {
    pub target: TypeRef,
}

/// Class template: parameter names plus the class body written in terms of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDecl {
    pub params: Vec<String>,
    pub class: ClassDecl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Class(ClassDecl),
    Enum(EnumDecl),
    Function(FunctionDecl),
    Typedef(TypedefDecl),
    Template(TemplateDecl),
}

impl DeclKind {
    /// Configuration toggle governing this kind.
    #[must_use]
    pub fn bind_kind(&self) -> BindKind {
        match self {
            Self::Class(_) => BindKind::Classes,
            Self::Enum(_) => BindKind::Enums,
            Self::Function(_) => BindKind::Functions,
            Self::Typedef(_) => BindKind::Typedefs,
            Self::Template(_) => BindKind::Templates,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Class(_) => "class",
            Self::Enum(_) => "enum",
            Self::Function(_) => "function",
            Self::Typedef(_) => "typedef",
            Self::Template(_) => "template",
        }
    }

    /// Whether a `class X;` forward declaration names this kind.
    #[must_use]
    pub fn is_class_like(&self) -> bool {
        matches!(self, Self::Class(_))
    }
}

/// Package-qualified module, e.g. `OCCT.gp`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleRef {
    pub package: String,
    pub module: String,
}

impl ModuleRef {
    #[must_use]
    pub fn new(package: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            module: module.into(),
        }
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.package, self.module)
    }
}

/// Resolved reference from one declaration to another model declaration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeDependency {
    /// Qualified name of the referenced declaration.
    pub name: String,
    pub usage: Usage,
}

/// One parsed C++ entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    kind: DeclKind,
    header: String,
    module: Option<ModuleRef>,
    dependencies: Vec<TypeDependency>,
    bindable: bool,
}

impl Declaration {
    #[must_use]
    pub fn new(name: String, kind: DeclKind, header: String) -> Self {
        Self {
            name,
            kind,
            header,
            module: None,
            dependencies: Vec::new(),
            bindable: false,
        }
    }

    /// Fully qualified name without leading `::`.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enclosing scope (`a::b` for `a::b::C`), empty at global scope.
    #[must_use]
    pub fn scope(&self) -> &str {
        self.name.rsplit_once("::").map_or("", |(scope, _)| scope)
    }

    #[must_use]
    #[inline]
    pub fn kind(&self) -> &DeclKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut DeclKind {
        &mut self.kind
    }

    /// Header file name the declaration was found in.
    #[must_use]
    #[inline]
    pub fn header(&self) -> &str {
        &self.header
    }

    #[must_use]
    #[inline]
    pub fn module(&self) -> Option<&ModuleRef> {
        self.module.as_ref()
    }

    pub(crate) fn set_module(&mut self, module: Option<ModuleRef>) {
        self.module = module;
    }

    /// Resolved dependencies, sorted by name, one entry per name with the
    /// strongest usage.
    #[must_use]
    #[inline]
    pub fn dependencies(&self) -> &[TypeDependency] {
        &self.dependencies
    }

    pub(crate) fn set_dependencies(&mut self, dependencies: Vec<TypeDependency>) {
        self.dependencies = dependencies;
    }

    #[must_use]
    #[inline]
    pub fn is_bindable(&self) -> bool {
        self.bindable
    }

    pub(crate) fn set_bindable(&mut self, bindable: bool) {
        self.bindable = bindable;
    }

    /// Names mentioned by the declaration's public surface, with usage.
    ///
    /// Template parameters are excluded.
    #[must_use]
    pub fn referenced_names(&self) -> Vec<TypeName> {
        fn class_names(class: &ClassDecl) -> Vec<TypeName> {
            class
                .bases
                .iter()
                .map(|b| TypeName {
                    name: b.clone(),
                    usage: Usage::Base,
                })
                .chain(class.types().flat_map(|ty| ty.names().iter().cloned()))
                .collect()
        }

        match &self.kind {
            DeclKind::Class(class) => class_names(class),
            DeclKind::Template(tmpl) => {
                let mut names = class_names(&tmpl.class);
                names.retain(|n| !tmpl.params.iter().any(|p| p == &n.name));
                names
            }
            DeclKind::Function(func) => func
                .overloads
                .iter()
                .flat_map(Signature::types)
                .flat_map(|ty| ty.names().iter().cloned())
                .collect(),
            DeclKind::Typedef(typedef) => typedef.target.names().to_vec(),
            DeclKind::Enum(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.kind.label(), self.name, self.header)
    }
}
