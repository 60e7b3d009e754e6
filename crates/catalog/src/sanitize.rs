//! Macro cleanup applied to header text before parsing.
//!
//! The target libraries decorate declarations with export, RTTI and handle
//! macros that a plain C++ grammar cannot see through. They are removed or
//! rewritten token-wise; line breaks are preserved so reported line numbers
//! still match the header.

/// Identifiers removed together with their parenthesized argument list, if any.
const REMOVED_WITH_ARGS: &[&str] = &["Standard_DEPRECATED", "Standard_ATOMIC"];

/// Identifiers removed on their own.
const REMOVED: &[&str] = &["Standard_NODISCARD", "Standard_EXPORTEXTERN", "Standard_UNUSED"];

/// Rewrite header text into something the C++ grammar parses cleanly.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if !(c.is_ascii_alphabetic() || c == b'_') {
            // Copy the whole UTF-8 character.
            let len = utf8_len(c);
            out.push_str(&text[i..i + len]);
            i += len;
            continue;
        }

        let start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        let ident = &text[start..i];

        if ident.starts_with("DEFINE_STANDARD_") || REMOVED_WITH_ARGS.contains(&ident) {
            i = skip_args(text, i, &mut out);
        } else if ident == "Handle" {
            match paren_group(text, i) {
                Some((inner, end)) => {
                    out.push_str("opencascade::handle<");
                    out.push_str(inner.trim());
                    out.push('>');
                    i = end;
                }
                None => out.push_str(ident),
            }
        } else if ident == "Standard_OVERRIDE" {
            out.push_str("override");
        } else if ident.ends_with("_EXPORT") || REMOVED.contains(&ident) {
            // dropped
        } else {
            out.push_str(ident);
        }
    }
    out
}

fn utf8_len(first: u8) -> usize {
    match first {
        0xF0..=0xFF => 4,
        0xE0..=0xEF => 3,
        0xC0..=0xDF => 2,
        _ => 1,
    }
}

/// Find `( ... )` starting at `from` after optional blanks. Returns the inner
/// text and the index just past the closing parenthesis.
fn paren_group(text: &str, from: usize) -> Option<(&str, usize)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'(') {
        return None;
    }
    let open = i;
    let mut depth = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[open + 1..i], i + 1));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Skip an optional argument list after a removed macro, keeping its newlines.
fn skip_args(text: &str, from: usize, out: &mut String) -> usize {
    match paren_group(text, from) {
        Some((inner, end)) => {
            out.extend(inner.chars().filter(|c| *c == '\n'));
            end
        }
        None => from,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_macros_are_removed() {
        assert_eq!(
            sanitize("class Standard_EXPORT gp_Pnt {};"),
            "class  gp_Pnt {};"
        );
        assert_eq!(
            sanitize("SMESH_EXPORT int f();"),
            " int f();"
        );
    }

    #[test]
    fn handle_macro_becomes_template() {
        assert_eq!(
            sanitize("Handle(Geom_Curve) C;"),
            "opencascade::handle<Geom_Curve> C;"
        );
        assert_eq!(
            sanitize("const Handle( Geom_Surface )& S"),
            "const opencascade::handle<Geom_Surface>& S"
        );
        assert_eq!(sanitize("Handle_Geom_Curve x;"), "Handle_Geom_Curve x;");
    }

    #[test]
    fn rtti_macros_keep_line_count() {
        let text = "class A {\n  DEFINE_STANDARD_RTTIEXT(A,\n    Standard_Transient)\n};\n";
        let out = sanitize(text);
        assert_eq!(out.lines().count(), text.lines().count());
        assert!(!out.contains("DEFINE_STANDARD"));
        assert!(!out.contains("Standard_Transient"));
    }

    #[test]
    fn override_and_nodiscard() {
        assert_eq!(
            sanitize("Standard_NODISCARD gp_Pnt Mirrored() const Standard_OVERRIDE;"),
            " gp_Pnt Mirrored() const override;"
        );
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        assert_eq!(sanitize("// é Handle x"), "// é Handle x");
    }
}
