//! Configuration directives.
//!
//! - [`Directive::Bind`]: `+bind classes`, `-bind typedefs`
//! - [`Directive::Module`]: `+module SMDS`, `-module Interface`
//! - [`Directive::Header`]: `-header OSD_Parallel.hxx`
//! - [`Directive::Exclude`]: `-class SMESH_Gen::TAlgoStateError`
//! - [`Directive::Template`]: `+template Tmpl<Args> as Alias in Module`

use crate::{error::ParserError, Lexeme, Result, Rule};
use pest::iterators::Pair;
use std::fmt;
use std::str::FromStr;

/// Declaration kinds that can be toggled or excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BindKind {
    Enums,
    Functions,
    Classes,
    Typedefs,
    Templates,
}

impl BindKind {
    pub const ALL: [BindKind; 5] = [
        Self::Enums,
        Self::Functions,
        Self::Classes,
        Self::Typedefs,
        Self::Templates,
    ];

    /// Kind named by a singular exclusion keyword (`-class`, `-enum`, ...).
    fn from_exclude_keyword(s: &str) -> Result<Self> {
        match s {
            "class" => Ok(Self::Classes),
            "enum" => Ok(Self::Enums),
            "function" => Ok(Self::Functions),
            "typedef" => Ok(Self::Typedefs),
            other => Err(ParserError::UnknownKind(other.to_string())),
        }
    }
}

impl FromStr for BindKind {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "enums" => Ok(Self::Enums),
            "functions" => Ok(Self::Functions),
            "classes" => Ok(Self::Classes),
            "typedefs" => Ok(Self::Typedefs),
            "templates" => Ok(Self::Templates),
            other => Err(ParserError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for BindKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Enums => "enums",
            Self::Functions => "functions",
            Self::Classes => "classes",
            Self::Typedefs => "typedefs",
            Self::Templates => "templates",
        };
        write!(f, "{s}")
    }
}

/// `+template Tmpl<Args...> as Alias [in Module]`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instantiation {
    template: String,
    args: Vec<String>,
    alias: String,
    module: Option<String>,
}

impl Instantiation {
    #[must_use]
    pub fn new(template: String, args: Vec<String>, alias: String, module: Option<String>) -> Self {
        Self {
            template,
            args,
            alias,
            module,
        }
    }

    /// Qualified name of the class template.
    #[must_use]
    #[inline]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Type arguments, whitespace-normalized.
    #[must_use]
    #[inline]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Python-visible name of the instantiated class.
    #[must_use]
    #[inline]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Module the instantiation is emitted into; `None` uses the template's module.
    #[must_use]
    #[inline]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// C++ spelling of the instantiated type, e.g. `NCollection_Array1<gp_Pnt>`.
    #[must_use]
    pub fn spelling(&self) -> String {
        format!("{}<{}>", self.template, self.args.join(", "))
    }
}

impl fmt::Display for Instantiation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.spelling(), self.alias)?;
        if let Some(module) = &self.module {
            write!(f, " in {module}")?;
        }
        Ok(())
    }
}

impl Lexeme for Instantiation {
    /// Parse `"+" "template" qualified_name "<" type_args ">" "as" alias ("in" module)?`.
    fn from_parsed_rule(parsed_rule: Pair<Rule>) -> Result<Self> {
        let mut template = None;
        let mut args = Vec::new();
        let mut alias = None;
        let mut module = None;

        for pair in parsed_rule.into_inner() {
            match pair.as_rule() {
                Rule::qualified_name => template = Some(pair.as_str().to_string()),
                Rule::type_args => {
                    args = pair
                        .into_inner()
                        .map(|arg| normalize_type(arg.as_str()))
                        .collect();
                }
                Rule::template_alias => alias = Some(pair.as_str().to_string()),
                Rule::template_module => module = Some(pair.as_str().to_string()),
                other => {
                    return Err(ParserError::UnexpectedRule(
                        "template directive".to_string(),
                        format!("{other:?}"),
                    ))
                }
            }
        }

        let template = template.ok_or_else(|| {
            ParserError::IncompleteDirective("template name".to_string(), "template".to_string())
        })?;
        let alias = alias.ok_or_else(|| {
            ParserError::IncompleteDirective("alias".to_string(), "template".to_string())
        })?;
        Ok(Self::new(template, args, alias, module))
    }
}

/// Collapse whitespace runs and drop spaces next to `<`, `>`, `,`, `*`, `&`.
fn normalize_type(raw: &str) -> String {
    let words: Vec<&str> = raw.split_whitespace().collect();
    let mut out = String::with_capacity(raw.len());
    for word in words {
        let glue = out.ends_with(['<', '>', ',', '*', '&'])
            || word.starts_with(['<', '>', ',', '*', '&']);
        if !out.is_empty() && !glue {
            out.push(' ');
        }
        out.push_str(word);
    }
    out.replace(',', ", ")
}

/// One configuration line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `+bind kind` enables, `-bind kind` disables.
    Bind { enable: bool, kind: BindKind },
    /// `+module` whitelists, `-module` excludes.
    Module { include: bool, name: String },
    /// Header skipped by every source.
    Header(String),
    /// Declaration of one kind excluded by qualified name.
    Exclude { kind: BindKind, name: String },
    Template(Instantiation),
}

impl Lexeme for Directive {
    fn from_parsed_rule(parsed_rule: Pair<Rule>) -> Result<Self> {
        let rule = parsed_rule.as_rule();
        let context = format!("{rule:?}");
        match rule {
            Rule::template_directive => {
                Ok(Self::Template(Instantiation::from_parsed_rule(parsed_rule)?))
            }
            Rule::bind_directive | Rule::module_directive => {
                let mut inner = parsed_rule.into_inner();
                let sign = next_str(&mut inner, "sign", &context)?;
                let value = next_str(&mut inner, "name", &context)?;
                let positive = sign == "+";
                if rule == Rule::bind_directive {
                    Ok(Self::Bind {
                        enable: positive,
                        kind: value.parse()?,
                    })
                } else {
                    Ok(Self::Module {
                        include: positive,
                        name: value,
                    })
                }
            }
            Rule::header_directive => {
                let mut inner = parsed_rule.into_inner();
                Ok(Self::Header(next_str(&mut inner, "header", &context)?))
            }
            Rule::exclude_directive => {
                let mut inner = parsed_rule.into_inner();
                let kind = next_str(&mut inner, "kind", &context)?;
                let name = next_str(&mut inner, "qualified name", &context)?;
                Ok(Self::Exclude {
                    kind: BindKind::from_exclude_keyword(&kind)?,
                    name: name.trim_start_matches("::").to_string(),
                })
            }
            other => Err(ParserError::UnexpectedRule(
                "configuration".to_string(),
                format!("{other:?}"),
            )),
        }
    }
}

fn next_str(
    inner: &mut pest::iterators::Pairs<Rule>,
    what: &str,
    context: &str,
) -> Result<String> {
    inner
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ParserError::IncompleteDirective(what.to_string(), context.to_string()))
}
