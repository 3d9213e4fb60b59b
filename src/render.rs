//! ASCII tree rendering for package trees.

use std::collections::BTreeMap;

use crate::models::{Container, DataKind, Node, PackageNode};

const PACKAGE: char = '◎';
const GROUP: char = '○';
const TABLE: char = '●';
const FILE: char = '◇';

/// Get the symbol for a node.
fn node_symbol(node: &Node) -> char {
    match node {
        Node::Package(_) => PACKAGE,
        Node::Group(_) => GROUP,
        Node::Data(data) => match data.kind() {
            DataKind::Table { .. } => TABLE,
            DataKind::File => FILE,
        },
    }
}

/// Render a package tree as ASCII art with kind symbols.
///
/// Example output:
/// ```text
/// acme.demo
/// ├── ○ meta
/// │   └── ◇ notes
/// └── ● prices
/// ```
pub fn render_tree(package: &PackageNode) -> String {
    let mut output = String::new();
    output.push_str(&package.package().full_name());
    output.push('\n');
    render_children(&mut output, package.children(), "");
    output
}

/// Render a node reached inside a package, titled `title`.
pub fn render_node(title: &str, node: &Node) -> String {
    let mut output = String::new();
    output.push(node_symbol(node));
    output.push(' ');
    output.push_str(title);
    output.push('\n');
    if let Some(children) = node.children() {
        render_children(&mut output, children, "");
    }
    output
}

fn render_children(output: &mut String, children: &BTreeMap<String, Node>, prefix: &str) {
    for (i, (name, child)) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
        output.push(node_symbol(child));
        output.push(' ');
        output.push_str(name);
        if let Node::Data(data) = child {
            if let DataKind::Table {
                format: Some(format),
            } = data.kind()
            {
                output.push_str(&format!(" [{}]", format));
            }
        }
        output.push('\n');

        if let Some(grandchildren) = child.children() {
            let continuation = if is_last { "    " } else { "│   " };
            let child_prefix = format!("{}{}", prefix, continuation);
            render_children(output, grandchildren, &child_prefix);
        }
    }
}
