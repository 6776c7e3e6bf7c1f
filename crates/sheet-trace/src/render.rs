//! Tree output: indented text, a standalone HTML page, and JSON

use std::fmt::Write;

use crate::builder::{DependencyNode, Edge, Terminal};
use crate::error::TraceResult;
use crate::resolver::ColumnContent;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// One-line description of a node, e.g. `[Sheet1] Total (D) = Qty*Price`
pub fn node_label(node: &DependencyNode) -> String {
    let mut label = format!("[{}] {} ({})", node.sheet, node.header(), node.column);

    match &node.info.content {
        ColumnContent::Formula(formula) => {
            let shown = node.readable_formula.as_deref().unwrap_or(formula);
            let _ = write!(label, " {}", shown);
        }
        ColumnContent::StaticValue(value) => {
            let _ = write!(label, " = {}", value);
        }
        ColumnContent::Empty if node.terminal != Terminal::MissingSheet => {
            label.push_str(" (empty)");
        }
        ColumnContent::Empty => {}
    }

    for tag in tags(node) {
        label.push(' ');
        label.push_str(tag);
    }
    label
}

fn tags(node: &DependencyNode) -> Vec<&'static str> {
    let mut tags = Vec::new();
    match node.edge {
        Some(Edge::LookupValue) => tags.push("<lookup value>"),
        Some(Edge::LookupTable) => tags.push("<lookup table>"),
        Some(Edge::LookupResult) => tags.push("<lookup result>"),
        Some(Edge::Direct) | None => {}
    }
    match node.terminal {
        Terminal::Cyclic => tags.push("[cycle]"),
        Terminal::DepthLimited => tags.push("[depth limit]"),
        Terminal::MissingSheet => tags.push("[missing sheet]"),
        Terminal::Normal => {}
    }
    tags
}

/// Render the tree with box-drawing connectors, one node per line
pub fn render_text(root: &DependencyNode) -> String {
    let mut out = node_label(root);
    out.push('\n');
    write_children(&mut out, root, "");
    out
}

fn write_children(out: &mut String, node: &DependencyNode, prefix: &str) {
    let count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if last { LAST_BRANCH } else { BRANCH });
        out.push_str(&node_label(child));
        out.push('\n');

        let nested = format!("{}{}", prefix, if last { SPACE } else { PIPE });
        write_children(out, child, &nested);
    }
}

/// Render a self-contained HTML page with collapsible `<details>` nodes
pub fn render_html(root: &DependencyNode, title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(title));
    out.push_str(STYLE);
    out.push_str("</head>\n<body>\n");
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(title));
    write_html_node(&mut out, root);
    out.push_str("</body>\n</html>\n");
    out
}

const STYLE: &str = "<style>
body { font-family: monospace; }
details { margin-left: 1.5em; }
.leaf { margin-left: 2.6em; }
.cycle { color: #b00; }
.depth-limit { color: #a60; }
.missing { color: #777; font-style: italic; }
</style>
";

fn html_class(node: &DependencyNode) -> &'static str {
    match node.terminal {
        Terminal::Normal => "node",
        Terminal::Cyclic => "node cycle",
        Terminal::DepthLimited => "node depth-limit",
        Terminal::MissingSheet => "node missing",
    }
}

fn write_html_node(out: &mut String, node: &DependencyNode) {
    let label = escape_html(&node_label(node));
    let class = html_class(node);

    if node.is_leaf() {
        let _ = writeln!(out, "<div class=\"leaf {}\">{}</div>", class, label);
        return;
    }

    let _ = writeln!(out, "<details open class=\"{}\">", class);
    let _ = writeln!(out, "<summary>{}</summary>", label);
    for child in &node.children {
        write_html_node(out, child);
    }
    out.push_str("</details>\n");
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Serialize the tree as pretty-printed JSON
pub fn render_json(root: &DependencyNode) -> TraceResult<String> {
    Ok(serde_json::to_string_pretty(root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ColumnInfo;
    use pretty_assertions::assert_eq;
    use sheet_trace_core::{ColumnId, Scalar};

    fn node(column: &str, content: ColumnContent, children: Vec<DependencyNode>) -> DependencyNode {
        let column = ColumnId::parse(column).unwrap();
        let readable = match &content {
            ColumnContent::Formula(f) => Some(f.replace("A2", "Qty")),
            _ => None,
        };
        DependencyNode {
            sheet: "Sheet1".into(),
            column,
            info: ColumnInfo {
                header: format!("H{}", column),
                labelled: true,
                content,
            },
            edge: Some(Edge::Direct),
            readable_formula: readable,
            terminal: Terminal::Normal,
            children,
        }
    }

    fn sample() -> DependencyNode {
        let qty = node("A", ColumnContent::StaticValue(Scalar::Number(3.0)), vec![]);
        let mut cyc = node("C", ColumnContent::Formula("=B2".into()), vec![]);
        cyc.terminal = Terminal::Cyclic;
        let b = node("B", ColumnContent::Formula("=A2+C2".into()), vec![qty, cyc]);
        let empty = node("E", ColumnContent::Empty, vec![]);
        let mut root = node("C", ColumnContent::Formula("=B2&E2".into()), vec![b, empty]);
        root.edge = None;
        root
    }

    #[test]
    fn test_node_label() {
        let root = sample();
        assert_eq!(node_label(&root), "[Sheet1] HC (C) =B2&E2");
        assert_eq!(node_label(&root.children[1]), "[Sheet1] HE (E) (empty)");
        assert_eq!(node_label(&root.children[0].children[0]), "[Sheet1] HA (A) = 3");
    }

    #[test]
    fn test_render_text() {
        let expected = "\
[Sheet1] HC (C) =B2&E2
├── [Sheet1] HB (B) =Qty+C2
│   ├── [Sheet1] HA (A) = 3
│   └── [Sheet1] HC (C) =B2 [cycle]
└── [Sheet1] HE (E) (empty)
";
        assert_eq!(render_text(&sample()), expected);
    }

    #[test]
    fn test_render_html_escapes() {
        let html = render_html(&sample(), "Trace <C> & co");
        assert!(html.contains("<title>Trace &lt;C&gt; &amp; co</title>"));
        assert!(html.contains("=B2&amp;E2"));
        assert!(html.contains("class=\"leaf node cycle\""));
        assert_eq!(html.matches("<details").count(), 2);
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["column"], "C");
        assert_eq!(value["terminal"], "normal");
        assert!(value.get("edge").is_none());
        assert_eq!(value["info"]["content"]["type"], "formula");
        let qty = &value["children"][0]["children"][0];
        assert_eq!(qty["info"]["content"]["value"], 3.0);
        assert_eq!(value["children"][0]["children"][1]["terminal"], "cyclic");
        assert_eq!(value["children"][0]["edge"], "direct");
    }
}
