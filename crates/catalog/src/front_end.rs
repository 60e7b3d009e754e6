//! C++ front end.
//!
//! Headers are parsed with tree-sitter-cpp and the concrete syntax tree is
//! walked for the declarations the binder understands. Only public surface is
//! collected: public bases, constructors, methods and fields of classes,
//! enums, free functions, typedefs and class templates.

use crate::decl::{
    ClassDecl, DeclKind, Declaration, EnumDecl, Field, FunctionDecl, Method, Param, Signature,
    TemplateDecl, TypeName, TypeRef, TypedefDecl, Usage,
};
use crate::{sanitize::sanitize, CatalogError, Result};
use tree_sitter::{Node, Parser};

/// Declarations and syntax errors found in one header.
#[derive(Debug, Default)]
pub struct HeaderContents {
    pub declarations: Vec<Declaration>,
    /// 1-based line numbers of syntax errors, in order of appearance.
    pub error_lines: Vec<usize>,
}

/// Reusable C++ parser.
pub struct FrontEnd {
    parser: Parser,
}

impl FrontEnd {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| CatalogError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Sanitize and parse the text of `header`.
    pub fn parse_header(&mut self, header: &str, text: &str) -> Result<HeaderContents> {
        let source = sanitize(text);
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| CatalogError::ParseFailed(header.to_string()))?;

        let root = tree.root_node();
        let mut contents = HeaderContents::default();
        if root.has_error() {
            collect_errors(root, &mut contents.error_lines);
        }

        let mut walker = Walker {
            source: &source,
            header,
            out: &mut contents.declarations,
        };
        walker.visit_scope(root, "");
        Ok(contents)
    }
}

fn collect_errors(node: Node, lines: &mut Vec<usize>) {
    if node.is_error() || node.is_missing() {
        lines.push(node.start_position().row + 1);
        return;
    }
    if node.has_error() {
        for child in children(node) {
            collect_errors(child, lines);
        }
    }
}

// =========================================================================
// Node helpers
// =========================================================================

fn named_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let nodes = node.named_children(&mut cursor).collect();
    nodes
}

fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let nodes = node.children(&mut cursor).collect();
    nodes
}

fn field<'t>(node: Node<'t>, name: &str) -> Option<Node<'t>> {
    node.child_by_field_name(name)
}

fn fields<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let nodes = node.children_by_field_name(name, &mut cursor).collect();
    nodes
}

fn has_child_kind(node: Node, kind: &str) -> bool {
    children(node).iter().any(|c| c.kind() == kind)
}

/// Whether `node` carries a keyword-like child such as `static` or `virtual`.
fn has_specifier(node: Node, source: &str, keyword: &str) -> bool {
    children(node).iter().any(|c| {
        matches!(
            c.kind(),
            "storage_class_specifier" | "virtual" | "virtual_function_specifier" | "type_qualifier"
        ) && source[c.byte_range()].trim() == keyword
    })
}

fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}::{name}")
    }
}

// =========================================================================
// Declarators
// =========================================================================

/// A declarator unwrapped down to its name.
#[derive(Debug, Default)]
struct Declarator<'t> {
    name: Option<String>,
    /// `*` and `&` in source order.
    modifiers: String,
    params: Option<Node<'t>>,
    is_const: bool,
}

impl Declarator<'_> {
    fn usage(&self) -> Usage {
        if self.modifiers.contains('*') {
            Usage::Pointer
        } else if self.modifiers.contains('&') {
            Usage::Reference
        } else {
            Usage::Value
        }
    }
}

fn unwrap_declarator<'t>(node: Option<Node<'t>>, source: &str) -> Declarator<'t> {
    let mut decl = Declarator::default();
    let mut current = node;
    while let Some(node) = current {
        current = match node.kind() {
            "pointer_declarator" | "abstract_pointer_declarator" => {
                decl.modifiers.push('*');
                field(node, "declarator")
            }
            "reference_declarator" | "abstract_reference_declarator" => {
                let text = &source[node.byte_range()];
                decl.modifiers
                    .push_str(if text.trim_start().starts_with("&&") { "&&" } else { "&" });
                named_children(node).last().copied()
            }
            "function_declarator" | "abstract_function_declarator" => {
                decl.params = field(node, "parameters");
                decl.is_const = children(node)
                    .iter()
                    .any(|c| c.kind() == "type_qualifier" && &source[c.byte_range()] == "const");
                field(node, "declarator")
            }
            "init_declarator" | "array_declarator" | "attributed_declarator" => {
                field(node, "declarator").or_else(|| named_children(node).first().copied())
            }
            "parenthesized_declarator" => named_children(node).first().copied(),
            "identifier" | "field_identifier" | "type_identifier" | "qualified_identifier"
            | "destructor_name" | "operator_name" | "template_function" => {
                decl.name = Some(source[node.byte_range()].split_whitespace().collect());
                None
            }
            _ => None,
        };
    }
    decl
}

// =========================================================================
// Types
// =========================================================================

/// Names referenced by a type specifier. `usage` applies to the outermost
/// name; handle arguments are always pointer usage.
fn type_names(node: Node, source: &str, usage: Usage, out: &mut Vec<TypeName>) {
    match node.kind() {
        "type_identifier" | "qualified_identifier" | "namespace_identifier" => {
            // A qualified template type keeps its structure under the qualifier.
            if node.kind() == "qualified_identifier" {
                if let Some(name) = field(node, "name").filter(|n| n.kind() == "template_type") {
                    let scope = field(node, "scope")
                        .map(|s| source[s.byte_range()].to_string())
                        .unwrap_or_default();
                    template_names(name, source, &scope, usage, out);
                    return;
                }
            }
            out.push(TypeName {
                name: squash(&source[node.byte_range()]).trim_start_matches("::").to_string(),
                usage,
            });
        }
        "template_type" => template_names(node, source, "", usage, out),
        "type_descriptor" => {
            let decl = unwrap_declarator(field(node, "declarator"), source);
            let inner = combine(usage, decl.usage());
            if let Some(ty) = field(node, "type") {
                type_names(ty, source, inner, out);
            }
        }
        "class_specifier" | "struct_specifier" | "enum_specifier" | "union_specifier" => {
            if let Some(name) = field(node, "name") {
                type_names(name, source, usage, out);
            }
        }
        _ => {}
    }
}

fn template_names(node: Node, source: &str, scope: &str, usage: Usage, out: &mut Vec<TypeName>) {
    let Some(name) = field(node, "name") else {
        return;
    };
    let name = qualify(scope, &source[name.byte_range()]);
    let name = name.trim_start_matches("::").to_string();
    let is_handle = name == "opencascade::handle" || name == "handle" || name == "Handle";
    let arg_usage = if is_handle { Usage::Pointer } else { usage };
    if !is_handle {
        out.push(TypeName { name, usage });
    }
    if let Some(args) = field(node, "arguments") {
        for arg in named_children(args) {
            type_names(arg, source, arg_usage, out);
        }
    }
}

/// Usage of an inner name given the outer usage and the inner declarator.
fn combine(outer: Usage, inner: Usage) -> Usage {
    outer.min(inner)
}

/// Build a [`TypeRef`] from a declaration node's type and declarator modifiers.
fn type_ref(decl_node: Node, type_node: Node, modifiers: &str, usage: Usage, source: &str) -> TypeRef {
    let is_const = children(decl_node).iter().any(|c| {
        c.kind() == "type_qualifier"
            && &source[c.byte_range()] == "const"
            && c.start_byte() < type_node.start_byte()
    });
    let mut spelling = String::new();
    if is_const {
        spelling.push_str("const ");
    }
    spelling.push_str(&squash(&source[type_node.byte_range()]));
    if children(decl_node)
        .iter()
        .any(|c| c.kind() == "type_qualifier" && &source[c.byte_range()] == "const" && c.start_byte() > type_node.start_byte())
    {
        spelling.push_str(" const");
    }
    spelling.push_str(modifiers);

    let mut names = Vec::new();
    type_names(type_node, source, usage, &mut names);
    TypeRef::new(spelling, names)
}

fn parameters(list: Node, source: &str) -> Vec<Param> {
    named_children(list)
        .into_iter()
        .filter(|p| {
            matches!(
                p.kind(),
                "parameter_declaration" | "optional_parameter_declaration"
            )
        })
        .filter_map(|p| {
            let ty = field(p, "type")?;
            let decl = unwrap_declarator(field(p, "declarator"), source);
            Some(Param {
                name: decl.name.clone(),
                ty: type_ref(p, ty, &decl.modifiers, decl.usage(), source),
                has_default: p.kind() == "optional_parameter_declaration",
            })
        })
        // `f(void)` takes no arguments.
        .filter(|p| !(p.name.is_none() && p.ty.spelling() == "void"))
        .collect()
}

// =========================================================================
// Declarations
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    fn parse(text: &str) -> Self {
        match text.trim().trim_end_matches(':').trim() {
            "public" => Self::Public,
            "protected" => Self::Protected,
            _ => Self::Private,
        }
    }
}

struct Walker<'a> {
    source: &'a str,
    header: &'a str,
    out: &'a mut Vec<Declaration>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn push(&mut self, name: String, kind: DeclKind) {
        self.out
            .push(Declaration::new(name, kind, self.header.to_string()));
    }

    /// Visit declarations of a namespace-level scope.
    fn visit_scope(&mut self, node: Node, scope: &str) {
        for child in named_children(node) {
            self.visit_item(child, scope);
        }
    }

    fn visit_item(&mut self, node: Node, scope: &str) {
        match node.kind() {
            "namespace_definition" => {
                let Some(name) = field(node, "name") else {
                    return; // anonymous namespace
                };
                let inner = qualify(scope, &squash(self.text(name)));
                if let Some(body) = field(node, "body") {
                    self.visit_scope(body, &inner);
                }
            }
            "linkage_specification" => {
                if let Some(body) = field(node, "body") {
                    if body.kind() == "declaration_list" {
                        self.visit_scope(body, scope);
                    } else {
                        self.visit_item(body, scope);
                    }
                }
            }
            "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif"
            | "preproc_elifdef" | "declaration_list" => self.visit_scope(node, scope),
            "class_specifier" | "struct_specifier" => self.visit_class(node, scope, None),
            "enum_specifier" => self.visit_enum(node, scope, None),
            "template_declaration" => self.visit_template(node, scope),
            "type_definition" => self.visit_typedef(node, scope),
            "alias_declaration" => self.visit_alias(node, scope),
            "declaration" | "function_definition" => {
                if let Some(ty) = field(node, "type") {
                    if matches!(
                        ty.kind(),
                        "class_specifier" | "struct_specifier" | "enum_specifier"
                    ) && field(ty, "body").is_some()
                    {
                        self.visit_item(ty, scope);
                    }
                }
                self.visit_function(node, scope);
            }
            _ => {}
        }
    }

    fn visit_function(&mut self, node: Node, scope: &str) {
        let Some(ty) = field(node, "type") else {
            return;
        };
        for declarator in fields(node, "declarator") {
            let decl = unwrap_declarator(Some(declarator), self.source);
            let (Some(name), Some(params)) = (decl.name.as_deref(), decl.params) else {
                continue;
            };
            // Out-of-line member definitions and free operators are not bound.
            if name.contains("::") || name.starts_with("operator") {
                continue;
            }
            let signature = Signature {
                return_type: Some(type_ref(node, ty, &decl.modifiers, decl.usage(), self.source)),
                params: parameters(params, self.source),
            };
            let qualified = qualify(scope, name);
            let existing = self
                .out
                .iter()
                .position(|d| d.name() == qualified && matches!(d.kind(), DeclKind::Function(_)));
            match existing {
                Some(index) => {
                    if let DeclKind::Function(func) = self.out[index].kind_mut() {
                        if !func.overloads.contains(&signature) {
                            func.overloads.push(signature);
                        }
                    }
                }
                None => self.push(
                    qualified,
                    DeclKind::Function(FunctionDecl {
                        overloads: vec![signature],
                    }),
                ),
            }
        }
    }

    /// Parse a class body. Returns the qualified name and the class, or `None`
    /// for forward declarations, anonymous classes and specializations.
    fn parse_class(&mut self, node: Node, scope: &str, name_override: Option<&str>) -> Option<(String, ClassDecl)> {
        let body = field(node, "body")?;
        let name = match (field(node, "name"), name_override) {
            (Some(n), _) if n.kind() == "type_identifier" => self.text(n).to_string(),
            (None, Some(alias)) => alias.to_string(),
            _ => return None,
        };
        let qualified = qualify(scope, &name);
        let default_access = if node.kind() == "struct_specifier" {
            Access::Public
        } else {
            Access::Private
        };

        let mut class = ClassDecl {
            bases: self.bases(node, default_access),
            ..ClassDecl::default()
        };

        let mut access = default_access;
        for member in named_children(body) {
            if member.kind() == "access_specifier" {
                access = Access::parse(self.text(member));
                continue;
            }
            self.visit_member(member, &name, &qualified, access, &mut class);
        }
        Some((qualified, class))
    }

    fn bases(&self, node: Node, default_access: Access) -> Vec<String> {
        let Some(clause) = children(node).into_iter().find(|c| c.kind() == "base_class_clause")
        else {
            return Vec::new();
        };
        let mut bases = Vec::new();
        let mut access = default_access;
        for child in named_children(clause) {
            match child.kind() {
                "access_specifier" => access = Access::parse(self.text(child)),
                "type_identifier" | "qualified_identifier" | "template_type" => {
                    if access == Access::Public {
                        bases.push(squash(self.text(child)).trim_start_matches("::").to_string());
                    }
                    access = default_access;
                }
                _ => {}
            }
        }
        bases
    }

    fn visit_member(
        &mut self,
        member: Node,
        class_name: &str,
        qualified: &str,
        access: Access,
        class: &mut ClassDecl,
    ) {
        match member.kind() {
            "field_declaration" | "declaration" | "function_definition" => {}
            "type_definition" | "alias_declaration" if access == Access::Public => {
                self.visit_item(member, qualified);
                return;
            }
            "class_specifier" | "struct_specifier" | "enum_specifier" if access == Access::Public => {
                self.visit_item(member, qualified);
                return;
            }
            _ => return,
        }

        let ty = field(member, "type");
        if let Some(ty) = ty {
            // Nested type definitions: `class Inner { ... };`
            if matches!(ty.kind(), "class_specifier" | "struct_specifier" | "enum_specifier")
                && field(ty, "body").is_some()
            {
                if access == Access::Public {
                    self.visit_item(ty, qualified);
                }
                if fields(member, "declarator").is_empty() {
                    return;
                }
            }
        }

        for declarator in fields(member, "declarator") {
            let decl = unwrap_declarator(Some(declarator), self.source);
            let Some(name) = decl.name.clone() else {
                continue;
            };

            if let Some(params) = decl.params {
                let signature_params = parameters(params, self.source);
                match ty {
                    // Constructors have no return type.
                    None if name == class_name => {
                        class.declares_constructor = true;
                        if access == Access::Public {
                            class.constructors.push(Signature {
                                return_type: None,
                                params: signature_params,
                            });
                        }
                    }
                    None if name.strip_prefix('~') == Some(class_name) => {
                        class.hidden_destructor = access != Access::Public;
                    }
                    None => {}
                    Some(ty) => {
                        let is_pure = field(member, "default_value")
                            .is_some_and(|v| self.text(v).trim() == "0")
                            || squash(self.text(member))
                                .replace(' ', "")
                                .trim_end_matches(';')
                                .ends_with("=0");
                        let method = Method {
                            name: squash(&name).replace(' ', ""),
                            signature: Signature {
                                return_type: Some(type_ref(
                                    member,
                                    ty,
                                    &decl.modifiers,
                                    decl.usage(),
                                    self.source,
                                )),
                                params: signature_params,
                            },
                            is_const: decl.is_const,
                            is_static: has_specifier(member, self.source, "static"),
                            is_virtual: has_specifier(member, self.source, "virtual")
                                || has_child_kind(member, "virtual"),
                            is_pure,
                        };
                        // Pure virtuals make the class abstract even when not public.
                        if is_pure {
                            class.is_abstract = true;
                        }
                        if access == Access::Public && !method.name.starts_with('~') {
                            class.methods.push(method);
                        }
                    }
                }
            } else if let Some(ty) = ty {
                if access == Access::Public && !name.contains("::") {
                    class.fields.push(Field {
                        ty: type_ref(member, ty, &decl.modifiers, decl.usage(), self.source),
                        is_static: has_specifier(member, self.source, "static"),
                        name,
                    });
                }
            }
        }
    }

    fn visit_class(&mut self, node: Node, scope: &str, name_override: Option<&str>) {
        if let Some((name, class)) = self.parse_class(node, scope, name_override) {
            self.push(name, DeclKind::Class(class));
        }
    }

    fn visit_enum(&mut self, node: Node, scope: &str, name_override: Option<&str>) {
        let Some(body) = field(node, "body") else {
            return;
        };
        let name = match (field(node, "name"), name_override) {
            (Some(n), _) => self.text(n).to_string(),
            (None, Some(alias)) => alias.to_string(),
            (None, None) => return,
        };
        let enumerators = named_children(body)
            .into_iter()
            .filter(|e| e.kind() == "enumerator")
            .filter_map(|e| field(e, "name").map(|n| self.text(n).to_string()))
            .collect();
        let scoped = has_child_kind(node, "class") || has_child_kind(node, "struct");
        self.push(
            qualify(scope, &name),
            DeclKind::Enum(EnumDecl {
                scoped,
                enumerators,
            }),
        );
    }

    fn visit_template(&mut self, node: Node, scope: &str) {
        let params = field(node, "parameters")
            .map(|list| self.template_params(list))
            .unwrap_or_default();
        let Some(inner) = named_children(node)
            .into_iter()
            .find(|c| matches!(c.kind(), "class_specifier" | "struct_specifier"))
        else {
            return; // function and alias templates are not bound
        };
        if let Some((name, class)) = self.parse_class(inner, scope, None) {
            self.push(name, DeclKind::Template(TemplateDecl { params, class }));
        }
    }

    fn template_params(&self, list: Node) -> Vec<String> {
        named_children(list)
            .into_iter()
            .filter_map(|p| match p.kind() {
                "type_parameter_declaration" | "variadic_type_parameter_declaration" => {
                    named_children(p)
                        .into_iter()
                        .find(|c| c.kind() == "type_identifier")
                        .map(|c| self.text(c).to_string())
                }
                "optional_type_parameter_declaration" => {
                    field(p, "name").map(|n| self.text(n).to_string())
                }
                "parameter_declaration" | "optional_parameter_declaration" => {
                    unwrap_declarator(field(p, "declarator"), self.source).name
                }
                _ => None,
            })
            .collect()
    }

    fn visit_typedef(&mut self, node: Node, scope: &str) {
        let Some(ty) = field(node, "type") else {
            return;
        };
        for declarator in fields(node, "declarator") {
            let decl = unwrap_declarator(Some(declarator), self.source);
            let Some(name) = decl.name.clone() else {
                continue;
            };
            if decl.params.is_some() {
                continue; // function pointer typedefs
            }
            // `typedef struct { ... } Name;`
            if matches!(ty.kind(), "class_specifier" | "struct_specifier") && field(ty, "body").is_some() {
                if field(ty, "name").is_none() {
                    self.visit_class(ty, scope, Some(&name));
                    continue;
                }
                self.visit_class(ty, scope, None);
            }
            if ty.kind() == "enum_specifier" && field(ty, "body").is_some() {
                if field(ty, "name").is_none() {
                    self.visit_enum(ty, scope, Some(&name));
                    continue;
                }
                self.visit_enum(ty, scope, None);
            }
            let target = type_ref(node, ty, &decl.modifiers, decl.usage(), self.source);
            self.push(qualify(scope, &name), DeclKind::Typedef(TypedefDecl { target }));
        }
    }

    fn visit_alias(&mut self, node: Node, scope: &str) {
        let (Some(name), Some(ty)) = (field(node, "name"), field(node, "type")) else {
            return;
        };
        let decl = unwrap_declarator(field(ty, "declarator"), self.source);
        let Some(inner) = field(ty, "type") else {
            return;
        };
        let target = type_ref(ty, inner, &decl.modifiers, decl.usage(), self.source);
        self.push(
            qualify(scope, self.text(name)),
            DeclKind::Typedef(TypedefDecl { target }),
        );
    }
}
