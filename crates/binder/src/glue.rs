//! pybind11 glue for one binder.
//!
//! [`render_glue`] produces the statements of the binder's registration
//! function body; the emitter wraps them with includes and imports.

use crate::binder::{sanitize_name, Binder, ImportKind};
use catalog::{ClassDecl, DeclKind, Declaration, DeclarationModel, EnumDecl, FunctionDecl, Method, Signature, TypedefDecl};
use itertools::Itertools;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Root of the reference-counted OCCT class hierarchy.
const TRANSIENT_ROOT: &str = "Standard_Transient";

/// Python special method for a member operator with `arity` parameters.
fn python_operator(name: &str, arity: usize) -> Option<&'static str> {
    let op = name.strip_prefix("operator")?.trim();
    Some(match (op, arity) {
        ("+", 1) => "__add__",
        ("-", 1) => "__sub__",
        ("-", 0) => "__neg__",
        ("*", 1) => "__mul__",
        ("/", 1) => "__truediv__",
        ("+=", 1) => "__iadd__",
        ("-=", 1) => "__isub__",
        ("*=", 1) => "__imul__",
        ("/=", 1) => "__itruediv__",
        ("==", 1) => "__eq__",
        ("!=", 1) => "__ne__",
        ("<", 1) => "__lt__",
        ("<=", 1) => "__le__",
        (">", 1) => "__gt__",
        (">=", 1) => "__ge__",
        ("()", _) => "__call__",
        _ => return None,
    })
}

/// Name of the registration function of `binder`.
#[must_use]
pub fn bind_function(binder: &Binder) -> String {
    format!("bind_{}", binder.sanitized_name())
}

/// Python-visible name of a binder.
#[must_use]
pub fn python_name(binder: &Binder) -> String {
    sanitize_name(binder.name())
}

/// Body statements registering `binder` on `mod`.
#[must_use]
pub fn render_glue(binder: &Binder, model: &DeclarationModel) -> String {
    let Some(decl) = model.get(binder.declaration()) else {
        return format!("{INDENT}// {} is not in the declaration model\n", binder.declaration());
    };
    let py_name = python_name(binder);
    match (decl.kind(), binder.instantiation()) {
        (DeclKind::Template(tmpl), Some(inst)) => {
            let class = tmpl.class.substitute(&tmpl.params, inst.args());
            render_class(&inst.spelling(), &py_name, decl, &class, model)
        }
        (DeclKind::Class(class), _) => render_class(decl.name(), &py_name, decl, class, model),
        (DeclKind::Enum(e), _) => render_enum(decl.name(), &py_name, e),
        (DeclKind::Function(f), _) => render_function(decl.name(), &py_name, f),
        (DeclKind::Typedef(t), _) => render_typedef(binder, decl, &py_name, t, model),
        (DeclKind::Template(_), None) => {
            format!("{INDENT}// class template {} is bound through instantiations\n", decl.name())
        }
    }
}

fn args(sig: &Signature) -> String {
    if sig.params.is_empty() || sig.params.iter().any(|p| p.name.is_none()) {
        return String::new();
    }
    sig.params
        .iter()
        .filter_map(|p| p.name.as_deref())
        .map(|name| format!(", py::arg(\"{name}\")"))
        .collect()
}

fn return_spelling(sig: &Signature) -> &str {
    sig.return_type.as_ref().map_or("void", |ty| ty.spelling())
}

fn method_cast(cpp_name: &str, method: &Method) -> String {
    let sig = &method.signature;
    if method.is_static {
        format!("({} (*)({}))", return_spelling(sig), sig.param_list())
    } else {
        let qualifier = if method.is_const { " const" } else { "" };
        format!(
            "({} ({cpp_name}::*)({}){qualifier})",
            return_spelling(sig),
            sig.param_list()
        )
    }
}

fn render_class(cpp_name: &str, py_name: &str, decl: &Declaration, class: &ClassDecl, model: &DeclarationModel) -> String {
    let mut out = String::new();
    let mut parameters = vec![cpp_name.to_string()];
    if model.derives_from(decl.name(), TRANSIENT_ROOT) {
        parameters.push(format!("opencascade::handle<{cpp_name}>"));
    } else if class.hidden_destructor {
        parameters.push(format!("std::unique_ptr<{cpp_name}, py::nodelete>"));
    } else if model.hides_destructor(decl.name()) {
        // Holders must agree along a hierarchy once a base opts out of the default.
        parameters.push(format!("std::unique_ptr<{cpp_name}, Deleter<{cpp_name}>>"));
    }
    let scope = match decl.kind() {
        DeclKind::Template(_) => decl.scope(),
        _ => decl.name(),
    };
    parameters.extend(
        class
            .bases
            .iter()
            .filter_map(|base| model.resolve(scope, base))
            .filter(|base| base.is_bindable() && !matches!(base.kind(), DeclKind::Template(_)))
            .map(|base| base.name().to_string()),
    );
    let _ = writeln!(
        out,
        "{INDENT}py::class_<{}> cls(mod, \"{py_name}\");",
        parameters.join(", ")
    );

    if !class.is_abstract {
        if !class.declares_constructor {
            let _ = writeln!(out, "{INDENT}cls.def(py::init<>());");
        }
        for ctor in &class.constructors {
            let _ = writeln!(out, "{INDENT}cls.def(py::init<{}>(){});", ctor.param_list(), args(ctor));
        }
    }

    for method in &class.methods {
        let pointer = format!("&{cpp_name}::{}", method.name);
        if method.is_operator() {
            let Some(dunder) = python_operator(&method.name, method.signature.params.len()) else {
                continue;
            };
            let _ = writeln!(
                out,
                "{INDENT}cls.def(\"{dunder}\", {} {pointer}, py::is_operator());",
                method_cast(cpp_name, method)
            );
            continue;
        }
        let def = if method.is_static { "def_static" } else { "def" };
        let target = if class.is_overloaded(&method.name) {
            format!("{} {pointer}", method_cast(cpp_name, method))
        } else {
            pointer
        };
        let _ = writeln!(
            out,
            "{INDENT}cls.{def}(\"{}\", {target}{});",
            method.name,
            args(&method.signature)
        );
    }

    for field in &class.fields {
        let access = if field.ty.is_const_value() { "readonly" } else { "readwrite" };
        let suffix = if field.is_static { "_static" } else { "" };
        let _ = writeln!(
            out,
            "{INDENT}cls.def_{access}{suffix}(\"{}\", &{cpp_name}::{});",
            field.name, field.name
        );
    }
    out
}

fn render_enum(cpp_name: &str, py_name: &str, decl: &EnumDecl) -> String {
    let mut out = format!("{INDENT}py::enum_<{cpp_name}>(mod, \"{py_name}\")");
    for value in &decl.enumerators {
        let _ = write!(out, "\n{INDENT}{INDENT}.value(\"{value}\", {cpp_name}::{value})");
    }
    if !decl.scoped {
        let _ = write!(out, "\n{INDENT}{INDENT}.export_values()");
    }
    out.push_str(";\n");
    out
}

fn render_function(cpp_name: &str, py_name: &str, decl: &FunctionDecl) -> String {
    decl.overloads
        .iter()
        .map(|sig| {
            format!(
                "{INDENT}mod.def(\"{py_name}\", ({} (*)({})) &{cpp_name}{});\n",
                return_spelling(sig),
                sig.param_list(),
                args(sig)
            )
        })
        .collect()
}

/// Alias the Python object of the target type, when the target is bound.
fn render_typedef(binder: &Binder, decl: &Declaration, py_name: &str, typedef: &TypedefDecl, model: &DeclarationModel) -> String {
    let target_spelling = typedef.target.spelling().trim_start_matches("const ").trim();
    let target = model
        .resolve(decl.scope(), target_spelling)
        .filter(|t| t.is_bindable() && !matches!(t.kind(), DeclKind::Template(_) | DeclKind::Typedef(_)));
    let (Some(target), Some(target_module)) = (target, target.and_then(Declaration::module)) else {
        return format!("{INDENT}// {} aliases {}, which has no Python object\n", decl.name(), typedef.target);
    };
    let target_name = sanitize_name(target.name());
    let source = if target_module == binder.module() {
        "mod".to_string()
    } else {
        format!("py::module_::import(\"{target_module}\")")
    };
    format!(
        "{INDENT}if (py::hasattr({source}, \"{target_name}\")) {{\n\
         {INDENT}{INDENT}mod.attr(\"{py_name}\") = {source}.attr(\"{target_name}\");\n\
         {INDENT}}}\n"
    )
}

/// Forward declarations of the class-like types reached through deferred imports.
#[must_use]
pub fn forward_declarations(binder: &Binder, model: &DeclarationModel) -> Vec<String> {
    binder
        .imports()
        .values()
        .filter(|import| import.kind() == ImportKind::Deferred)
        .flat_map(|import| import.types())
        .filter_map(|name| model.get(name))
        .filter(|decl| decl.kind().is_class_like())
        // Nested classes cannot be forward declared outside their class.
        .filter(|decl| model.get(decl.scope()).is_none())
        .map(|decl| {
            let (scope, name) = decl.name().rsplit_once("::").unwrap_or(("", decl.name()));
            if scope.is_empty() {
                format!("class {name};")
            } else {
                let open = scope.split("::").map(|ns| format!("namespace {ns} {{")).join(" ");
                let close = "}".repeat(scope.split("::").count());
                format!("{open} class {name}; {close}")
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::BinderRegistry;
    use catalog::{ModuleRef, Namespace};
    use parser::{BinderConfig, Instantiation};
    use std::collections::BTreeMap;

    fn model(sources: &[(&str, &str)]) -> DeclarationModel {
        let namespace = Namespace::new(
            BTreeMap::from([(
                "OCCT".to_string(),
                vec![
                    "gp".to_string(),
                    "Geom".to_string(),
                    "Standard".to_string(),
                    "NCollection".to_string(),
                    "TopAbs".to_string(),
                ],
            )]),
            BTreeMap::new(),
        );
        let mut model = DeclarationModel::from_sources(sources.iter().copied(), &namespace).unwrap();
        model.apply_config(&BinderConfig::default());
        model
    }

    fn glue_of(model: &DeclarationModel, name: &str) -> String {
        let registry = BinderRegistry::from_model(model);
        render_glue(registry.get(name).unwrap(), model)
    }

    #[test]
    fn value_class_with_overloads_and_operators() {
        let m = model(&[(
            "gp_Vec.hxx",
            "class gp_Vec { public: gp_Vec(); gp_Vec(double x, double y);\n\
             double Coord(int i) const; void Coord(double& x) const;\n\
             gp_Vec operator+(const gp_Vec& other) const;\n\
             static gp_Vec Zero();\n\
             double X; };",
        )]);
        let glue = glue_of(&m, "gp_Vec");
        assert!(glue.contains("py::class_<gp_Vec> cls(mod, \"gp_Vec\");"));
        assert!(glue.contains("cls.def(py::init<>());"));
        assert!(glue.contains("cls.def(py::init<double, double>(), py::arg(\"x\"), py::arg(\"y\"));"));
        assert!(glue.contains("cls.def(\"Coord\", (double (gp_Vec::*)(int) const) &gp_Vec::Coord, py::arg(\"i\"));"));
        assert!(glue.contains("(gp_Vec (gp_Vec::*)(const gp_Vec&) const) &gp_Vec::operator+, py::is_operator()"));
        assert!(glue.contains("cls.def_static(\"Zero\", &gp_Vec::Zero);"));
        assert!(glue.contains("cls.def_readwrite(\"X\", &gp_Vec::X);"));
        assert_eq!(glue.matches("py::init<>()").count(), 1);
    }

    #[test]
    fn transient_classes_use_handles_and_bound_bases() {
        let m = model(&[
            ("Standard_Transient.hxx", "class Standard_Transient { public: Standard_Transient(); };"),
            ("Geom_Curve.hxx", "class Geom_Curve : public Standard_Transient { public: virtual void Reverse() = 0; };"),
        ]);
        let glue = glue_of(&m, "Geom_Curve");
        assert!(glue.starts_with(
            "    py::class_<Geom_Curve, opencascade::handle<Geom_Curve>, Standard_Transient> cls(mod, \"Geom_Curve\");"
        ));
        assert!(!glue.contains("py::init"));
        assert!(glue.contains("cls.def(\"Reverse\", &Geom_Curve::Reverse);"));
    }

    #[test]
    fn hidden_destructors_get_custom_holders() {
        let m = model(&[
            ("gp_Base.hxx", "class gp_Base { public: gp_Base(); protected: ~gp_Base(); };"),
            ("gp_Derived.hxx", "class gp_Derived : public gp_Base { public: gp_Derived(); ~gp_Derived(); };"),
            ("gp_Plain.hxx", "class gp_Plain { public: gp_Plain(); ~gp_Plain(); };"),
        ]);
        assert!(glue_of(&m, "gp_Base")
            .starts_with("    py::class_<gp_Base, std::unique_ptr<gp_Base, py::nodelete>> cls(mod, \"gp_Base\");"));
        assert!(glue_of(&m, "gp_Derived").starts_with(
            "    py::class_<gp_Derived, std::unique_ptr<gp_Derived, Deleter<gp_Derived>>, gp_Base> cls(mod, \"gp_Derived\");"
        ));
        assert!(glue_of(&m, "gp_Plain").starts_with("    py::class_<gp_Plain> cls(mod, \"gp_Plain\");"));
    }

    #[test]
    fn unscoped_enums_export_values() {
        let m = model(&[("TopAbs_Orientation.hxx", "enum TopAbs_Orientation { TopAbs_FORWARD, TopAbs_REVERSED };")]);
        assert_eq!(
            glue_of(&m, "TopAbs_Orientation"),
            "    py::enum_<TopAbs_Orientation>(mod, \"TopAbs_Orientation\")\n\
             \x20       .value(\"TopAbs_FORWARD\", TopAbs_Orientation::TopAbs_FORWARD)\n\
             \x20       .value(\"TopAbs_REVERSED\", TopAbs_Orientation::TopAbs_REVERSED)\n\
             \x20       .export_values();\n"
        );
    }

    #[test]
    fn free_function_overloads_are_cast() {
        let m = model(&[("gp_Func.hxx", "double gp_Dist(int a);\ndouble gp_Dist(double a, double b);")]);
        let glue = glue_of(&m, "gp_Dist");
        assert_eq!(
            glue,
            "    mod.def(\"gp_Dist\", (double (*)(int)) &gp_Dist, py::arg(\"a\"));\n\
             \x20   mod.def(\"gp_Dist\", (double (*)(double, double)) &gp_Dist, py::arg(\"a\"), py::arg(\"b\"));\n"
        );
    }

    #[test]
    fn typedef_aliases_bound_target() {
        let m = model(&[
            ("gp_Pnt.hxx", "class gp_Pnt { public: double X() const; };"),
            ("Geom_Pnt.hxx", "typedef gp_Pnt Geom_Pnt;"),
        ]);
        let glue = glue_of(&m, "Geom_Pnt");
        assert_eq!(
            glue,
            "    if (py::hasattr(py::module_::import(\"OCCT.gp\"), \"gp_Pnt\")) {\n\
             \x20       mod.attr(\"Geom_Pnt\") = py::module_::import(\"OCCT.gp\").attr(\"gp_Pnt\");\n\
             \x20   }\n"
        );
    }

    #[test]
    fn instantiations_substitute_template_parameters() {
        let m = model(&[
            ("gp_Pnt.hxx", "class gp_Pnt { public: double X() const; };"),
            (
                "NCollection_Array1.hxx",
                "template <class T> class NCollection_Array1 { public: NCollection_Array1(int lower, int upper); const T& Value(int i) const; };",
            ),
        ]);
        let inst = Instantiation::new(
            "NCollection_Array1".into(),
            vec!["gp_Pnt".into()],
            "TColgp_Array1OfPnt".into(),
            None,
        );
        let binder = Binder::for_instantiation(inst, ModuleRef::new("OCCT", "NCollection"), "NCollection_Array1.hxx", vec![]);
        let glue = render_glue(&binder, &m);
        assert!(glue.contains("py::class_<NCollection_Array1<gp_Pnt>> cls(mod, \"TColgp_Array1OfPnt\");"));
        assert!(glue.contains("cls.def(py::init<int, int>(), py::arg(\"lower\"), py::arg(\"upper\"));"));
        assert!(glue.contains("cls.def(\"Value\", &NCollection_Array1<gp_Pnt>::Value, py::arg(\"i\"));"));
        assert_eq!(bind_function(&binder), "bind_TColgp_Array1OfPnt");
    }

    #[test]
    fn deferred_types_are_forward_declared() {
        let m = model(&[
            ("Geom_Curve.hxx", "class Geom_Curve { public: void Reverse(); };"),
            ("gp_Trsf.hxx", "class gp_Trsf { public: void Apply(const Geom_Curve* c) const; };"),
        ]);
        let mut binder = Binder::new("gp_Trsf", ModuleRef::new("OCCT", "gp"), "gp_Trsf.hxx", vec![]);
        let geom = ModuleRef::new("OCCT", "Geom");
        binder.add_import(geom.clone(), "Geom_Curve", true);
        assert!(forward_declarations(&binder, &m).is_empty());
        binder.defer_import(&geom);
        assert_eq!(forward_declarations(&binder, &m), vec!["class Geom_Curve;"]);
    }
}
