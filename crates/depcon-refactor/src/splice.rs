//! Turns "old class node vs. new class node" into minimal text edits.
//!
//! The refactorings only ever append parameters, append statements, append
//! members or rewrite a method's modifiers and return type. Those changes are
//! spliced into the original text so that comments, blank lines and the
//! formatting of untouched code survive byte for byte. Any other difference
//! falls back to re-rendering the affected member (or the whole class).

use depcon_syntax::render::{render_class, render_member, render_method_prefix};
use depcon_syntax::{
    line_indent, line_start, starts_line, BlockLayout, Body, CallableLayout, ClassNode,
    ConstructorMember, Member, MemberLayout, MemberStyle, MethodMember, Parameter, ParsedClass,
    Statement, TextRange,
};

/// A single replacement in the original source.
pub type Replacement = (TextRange, String);

/// Computes the edits that turn the source of `old` into source for `new`.
///
/// The returned replacements are sorted and do not overlap.
pub fn splice_class(source: &str, old: &ParsedClass, new: &ClassNode) -> Vec<Replacement> {
    let style = infer_style(source, old);
    let old_node = &old.node;

    let header_changed = old_node.name != new.name
        || old_node.type_params != new.type_params
        || old_node.modifiers != new.modifiers
        || old_node.bases != new.bases;
    if header_changed || new.members.len() < old_node.members.len() {
        tracing::debug!(target = "depcon.refactor", class = %old_node.name, "re-rendering whole class");
        let class_indent = line_indent(source, old.layout.range.start);
        return vec![(old.layout.range, render_class(new, class_indent, &style))];
    }

    let mut edits = Vec::new();
    for ((old_member, layout), new_member) in old_node
        .members
        .iter()
        .zip(&old.layout.members)
        .zip(&new.members)
    {
        if old_member != new_member {
            splice_member(source, old_member, layout, new_member, &style, &mut edits);
        }
    }

    let appended = &new.members[old_node.members.len()..];
    if !appended.is_empty() {
        if edits.is_empty() && body_on_one_line(source, old) {
            edits.push(expand_one_line_class(source, old, appended, &style));
        } else {
            edits.push(append_members(source, old, appended, &style));
        }
    }

    edits.sort_by_key(|(range, _)| (range.start, range.end));
    edits
}

fn infer_style(source: &str, class: &ParsedClass) -> MemberStyle {
    let layout = &class.layout;
    let class_text = &source[layout.range.start..layout.range.end];
    let class_indent = line_indent(source, layout.range.start);

    if body_on_one_line(source, class) {
        // `class P { ... }` says nothing about brace placement or line endings.
        let mut style = MemberStyle::infer(class_text, class_indent, true);
        if source.contains("\r\n") {
            style.newline = "\r\n".to_string();
        }
        return style;
    }

    // Brace placement of existing bodies wins over the class's own brace.
    let brace_on_new_line = layout
        .members
        .iter()
        .filter_map(|member| member.callable.as_ref()?.body.as_ref())
        .map(|body| starts_line(source, body.open))
        .next()
        .unwrap_or_else(|| starts_line(source, layout.body_open));

    let mut style = MemberStyle::infer(class_text, class_indent, brace_on_new_line);
    if let Some(first) = layout
        .members
        .iter()
        .find(|member| starts_line(source, member.range.start))
    {
        let indent = line_indent(source, first.range.start);
        if let Some(unit) = indent.strip_prefix(class_indent).filter(|unit| !unit.is_empty()) {
            style.indent_unit = unit.to_string();
        }
        style.indent = indent.to_string();
    }
    style
}

fn splice_member(
    source: &str,
    old: &Member,
    layout: &MemberLayout,
    new: &Member,
    style: &MemberStyle,
    edits: &mut Vec<Replacement>,
) {
    let spliced = match (old, new, layout.callable.as_ref()) {
        (Member::Constructor(old), Member::Constructor(new), Some(callable)) => {
            splice_constructor(source, old, callable, new, style, edits)
        }
        (Member::Method(old), Member::Method(new), Some(callable)) => {
            splice_method(old, callable, new, edits)
        }
        _ => false,
    };
    if !spliced {
        let text = render_member(new, &member_style(source, layout, style));
        edits.push((layout.range, text.trim_start().to_string()));
    }
}

/// The style of an existing member, keeping its own indentation.
fn member_style(source: &str, layout: &MemberLayout, style: &MemberStyle) -> MemberStyle {
    let mut member_style = style.clone();
    if starts_line(source, layout.range.start) {
        member_style.indent = line_indent(source, layout.range.start).to_string();
    }
    member_style
}

fn splice_constructor(
    source: &str,
    old: &ConstructorMember,
    callable: &CallableLayout,
    new: &ConstructorMember,
    style: &MemberStyle,
    edits: &mut Vec<Replacement>,
) -> bool {
    let (Some(added_params), Some(added_statements)) = (
        appended_tail(&old.parameters, &new.parameters),
        appended_tail(old.body.statements(), new.body.statements()),
    ) else {
        return false;
    };
    if old.name != new.name || old.modifiers != new.modifiers || old.initializer != new.initializer
    {
        return false;
    }
    if !added_statements.is_empty() && !matches!(old.body, Body::Block(_)) {
        return false;
    }
    let body = callable.body.as_ref();
    if !added_statements.is_empty() && body.is_none() {
        return false;
    }

    if !added_params.is_empty() {
        let texts = render_parameter_texts(added_params);
        edits.push(append_parameters(source, callable, &texts, style));
    }
    if let Some(body) = body.filter(|_| !added_statements.is_empty()) {
        edits.push(append_statements(source, body, added_statements, style));
    }
    true
}

fn render_parameter_texts(params: &[Parameter]) -> Vec<String> {
    params.iter().map(ToString::to_string).collect()
}

fn splice_method(
    old: &MethodMember,
    callable: &CallableLayout,
    new: &MethodMember,
    edits: &mut Vec<Replacement>,
) -> bool {
    let signature_only = old.name == new.name
        && old.type_params == new.type_params
        && old.parameters == new.parameters
        && old.constraints == new.constraints
        && old.body == new.body;
    if !signature_only {
        return false;
    }
    edits.push((callable.prefix, render_method_prefix(new)));
    true
}

/// `Some(tail)` when `new` is `old` followed by `tail`.
fn appended_tail<'a, T: PartialEq>(old: &[T], new: &'a [T]) -> Option<&'a [T]> {
    if new.len() >= old.len() && new[..old.len()] == *old {
        Some(&new[old.len()..])
    } else {
        None
    }
}

fn append_parameters(
    source: &str,
    callable: &CallableLayout,
    added: &[String],
    style: &MemberStyle,
) -> Replacement {
    let Some(last) = callable.params.last() else {
        return (TextRange::empty(callable.params_close), added.join(", "));
    };

    let separator = match callable.params.len() {
        1 => {
            let before = &source[callable.params_open + 1..last.start];
            if before.contains('\n') {
                format!(",{}{}", style.newline, line_indent(source, last.start))
            } else {
                ", ".to_string()
            }
        }
        n => {
            let between = &source[callable.params[n - 2].end..callable.params[n - 1].start];
            if between.trim() == "," {
                between.to_string()
            } else {
                ", ".to_string()
            }
        }
    };

    let mut text = String::new();
    for param in added {
        text.push_str(&separator);
        text.push_str(param);
    }
    (TextRange::empty(last.end), text)
}

fn append_statements(
    source: &str,
    body: &BlockLayout,
    added: &[Statement],
    style: &MemberStyle,
) -> Replacement {
    let member_indent = line_indent(source, body.open);
    let statement_indent = body
        .statements
        .iter()
        .rev()
        .find(|range| starts_line(source, range.start))
        .map(|range| line_indent(source, range.start).to_string())
        .unwrap_or_else(|| format!("{member_indent}{}", style.indent_unit));

    if starts_line(source, body.close) {
        let mut text = String::new();
        for statement in added {
            text.push_str(&statement_indent);
            text.push_str(&statement.to_string());
            text.push_str(&style.newline);
        }
        return (TextRange::empty(line_start(source, body.close)), text);
    }

    // `{ }`, `{ a(); }`: move the closing brace onto its own line.
    let mut text = String::new();
    for statement in added {
        text.push_str(&style.newline);
        text.push_str(&statement_indent);
        text.push_str(&statement.to_string());
    }
    text.push_str(&style.newline);
    text.push_str(member_indent);

    let gap_start = body.statements.last().map_or(body.open + 1, |range| range.end);
    if source[gap_start..body.close].trim().is_empty() {
        (TextRange::new(gap_start, body.close), text)
    } else {
        (TextRange::empty(body.close), text)
    }
}

fn append_members(
    source: &str,
    class: &ParsedClass,
    appended: &[Member],
    style: &MemberStyle,
) -> Replacement {
    let layout = &class.layout;
    let close = layout.body_close;
    let rendered: Vec<String> = appended
        .iter()
        .map(|member| render_member(member, style))
        .collect();

    if starts_line(source, close) && line_start(source, close) > layout.body_open {
        let mut text = String::new();
        for (idx, member) in rendered.iter().enumerate() {
            if idx > 0 || !layout.members.is_empty() {
                text.push_str(&style.newline);
            }
            text.push_str(member);
            text.push_str(&style.newline);
        }
        return (TextRange::empty(line_start(source, close)), text);
    }

    let class_indent = line_indent(source, layout.range.start);
    let mut text = String::new();
    for member in &rendered {
        text.push_str(&style.newline);
        text.push_str(member);
    }
    text.push_str(&style.newline);
    text.push_str(class_indent);

    let gap_start = layout.members.last().map_or(layout.body_open + 1, |m| m.range.end);
    if source[gap_start..close].trim().is_empty() {
        (TextRange::new(gap_start, close), text)
    } else {
        (TextRange::empty(close), text)
    }
}

fn body_on_one_line(source: &str, class: &ParsedClass) -> bool {
    !source[class.layout.body_open..class.layout.body_close].contains('\n')
}

/// Lays out a class written on one line (`class P { A _a; }`) as a multi-line
/// class before appending members. Existing member text, including any
/// comments in front of it, is kept verbatim on its own line.
fn expand_one_line_class(
    source: &str,
    class: &ParsedClass,
    appended: &[Member],
    style: &MemberStyle,
) -> Replacement {
    let layout = &class.layout;
    let class_indent = line_indent(source, layout.range.start);

    let header_end = layout.header.start
        + source[layout.header.start..layout.body_open].trim_end().len();
    let mut text = String::new();
    if style.brace_on_new_line {
        text.push_str(&style.newline);
        text.push_str(class_indent);
    } else {
        text.push(' ');
    }
    text.push('{');
    text.push_str(&style.newline);

    let mut prev_end = layout.body_open + 1;
    for member in &layout.members {
        text.push_str(&style.indent);
        text.push_str(source[prev_end..member.range.end].trim());
        text.push_str(&style.newline);
        prev_end = member.range.end;
    }
    let trailing = source[prev_end..layout.body_close].trim();
    if !trailing.is_empty() {
        text.push_str(&style.indent);
        text.push_str(trailing);
        text.push_str(&style.newline);
    }

    for (idx, member) in appended.iter().enumerate() {
        if idx > 0 || prev_end > layout.body_open + 1 || !trailing.is_empty() {
            text.push_str(&style.newline);
        }
        text.push_str(&render_member(member, style));
        text.push_str(&style.newline);
    }
    text.push_str(class_indent);
    text.push('}');

    (TextRange::new(header_end, layout.body_close + 1), text)
}
