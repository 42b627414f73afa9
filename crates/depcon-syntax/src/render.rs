//! Renders tree nodes back to source text.
//!
//! Rendering is only used for nodes that have no source text yet (a freshly
//! synthesized constructor, a converted method header). Existing text is
//! always preserved by splicing instead.

use std::fmt::Write as _;

use crate::ast::{Body, ClassNode, ConstructorMember, FieldMember, Member, MethodMember, Parameter};

/// Formatting conventions inferred from the surrounding source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStyle {
    /// Indentation of a member line.
    pub indent: String,
    /// One level of indentation (statements are `indent + indent_unit`).
    pub indent_unit: String,
    pub newline: String,
    /// `true` for Allman braces (`{` on its own line).
    pub brace_on_new_line: bool,
}

impl Default for MemberStyle {
    fn default() -> Self {
        Self {
            indent: "    ".to_string(),
            indent_unit: "    ".to_string(),
            newline: "\n".to_string(),
            brace_on_new_line: true,
        }
    }
}

impl MemberStyle {
    /// Infers the style from a class's source text: member indentation from the
    /// first member line, line endings, and brace placement from the class body.
    pub fn infer(text: &str, class_indent: &str, body_open_on_own_line: bool) -> Self {
        let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
        let indent_unit = if class_indent.contains('\t') || text.lines().any(|l| l.starts_with('\t')) {
            "\t".to_string()
        } else {
            smallest_indent(text).unwrap_or_else(|| "    ".to_string())
        };
        Self {
            indent: format!("{class_indent}{indent_unit}"),
            indent_unit,
            newline: newline.to_string(),
            brace_on_new_line: body_open_on_own_line,
        }
    }

    pub fn nested(&self) -> String {
        format!("{}{}", self.indent, self.indent_unit)
    }
}

fn smallest_indent(text: &str) -> Option<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .filter(|&width| width > 0)
        .min()
        .map(|width| " ".repeat(width))
}

pub fn render_parameters(parameters: &[Parameter]) -> String {
    parameters
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Modifiers joined by spaces, with a trailing space when non-empty.
pub fn render_modifiers(modifiers: &[String]) -> String {
    let mut out = String::new();
    for modifier in modifiers {
        out.push_str(modifier);
        out.push(' ');
    }
    out
}

/// The text between a method's attributes and its name: modifiers and return type.
pub fn render_method_prefix(method: &MethodMember) -> String {
    format!("{}{} ", render_modifiers(&method.modifiers), method.return_type)
}

fn open_brace(out: &mut String, style: &MemberStyle) {
    if style.brace_on_new_line {
        out.push_str(&style.newline);
        out.push_str(&style.indent);
        out.push('{');
    } else {
        out.push_str(" {");
    }
}

fn render_body(out: &mut String, body: &Body, style: &MemberStyle) {
    match body {
        Body::Block(statements) => {
            open_brace(out, style);
            let nested = style.nested();
            for statement in statements {
                out.push_str(&style.newline);
                out.push_str(&nested);
                let _ = write!(out, "{statement}");
            }
            out.push_str(&style.newline);
            out.push_str(&style.indent);
            out.push('}');
        }
        Body::Expression(expr) => {
            let _ = write!(out, " => {expr};");
        }
        Body::Absent => out.push(';'),
    }
}

pub fn render_constructor(ctor: &ConstructorMember, style: &MemberStyle) -> String {
    let mut out = style.indent.clone();
    let _ = write!(
        out,
        "{}{}({})",
        render_modifiers(&ctor.modifiers),
        ctor.name,
        render_parameters(&ctor.parameters)
    );
    if let Some(init) = &ctor.initializer {
        let _ = write!(out, " : {init}");
    }
    render_body(&mut out, &ctor.body, style);
    out
}

pub fn render_method(method: &MethodMember, style: &MemberStyle) -> String {
    let mut out = style.indent.clone();
    out.push_str(&render_method_prefix(method));
    out.push_str(&method.name);
    if let Some(tp) = &method.type_params {
        out.push_str(tp);
    }
    let _ = write!(out, "({})", render_parameters(&method.parameters));
    if let Some(constraints) = &method.constraints {
        let _ = write!(out, " {constraints}");
    }
    render_body(&mut out, &method.body, style);
    out
}

pub fn render_field(field: &FieldMember, style: &MemberStyle) -> String {
    let variables = field
        .variables
        .iter()
        .map(|var| match &var.initializer {
            Some(init) => format!("{} = {init}", var.name),
            None => var.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{}{}{} {variables};",
        style.indent,
        render_modifiers(&field.modifiers),
        field.ty
    )
}

pub fn render_member(member: &Member, style: &MemberStyle) -> String {
    match member {
        Member::Field(field) => render_field(field, style),
        Member::Constructor(ctor) => render_constructor(ctor, style),
        Member::Method(method) => render_method(method, style),
        Member::Other(text) => format!("{}{text}", style.indent),
    }
}

/// Renders a whole class with members separated by blank lines. `class_indent`
/// is the indentation of the `class` line itself.
pub fn render_class(class: &ClassNode, class_indent: &str, style: &MemberStyle) -> String {
    let mut out = format!(
        "{class_indent}{}class {}{}",
        render_modifiers(&class.modifiers),
        class.name,
        class.type_params.as_deref().unwrap_or("")
    );
    if let Some(bases) = &class.bases {
        let _ = write!(out, " {bases}");
    }
    if style.brace_on_new_line {
        out.push_str(&style.newline);
        out.push_str(class_indent);
        out.push('{');
    } else {
        out.push_str(" {");
    }
    for (idx, member) in class.members.iter().enumerate() {
        if idx > 0 {
            out.push_str(&style.newline);
        }
        out.push_str(&style.newline);
        out.push_str(&render_member(member, style));
    }
    out.push_str(&style.newline);
    out.push_str(class_indent);
    out.push('}');
    out
}
