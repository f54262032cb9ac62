use crate::error::{AppError, Result};
#[cfg(feature = "serde_support")]
use serde::Serialize;
use std::path::{Component, Path};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_support", derive(Serialize))]
#[cfg_attr(feature = "serde_support", serde(rename_all = "lowercase"))]
pub enum NodeType {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde_support", derive(Serialize))]
pub struct TreeNode {
    pub name: String,
    #[cfg_attr(feature = "serde_support", serde(rename = "type"))]
    pub node_type: NodeType,
    #[cfg_attr(
        feature = "serde_support",
        serde(skip_serializing_if = "Option::is_none")
    )]
    pub children: Option<Vec<TreeNode>>,
}

/// Paths are shown relative to `base`; anything outside it climbs with `..`.
pub fn source_tree<P: AsRef<Path>>(paths: &[P], base: &Path) -> Result<String> {
    let relative: Vec<(String, bool)> = paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            let shown = pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf());
            (shown.to_string_lossy().into_owned(), false)
        })
        .collect();
    let nodes = build_tree_from_paths(&relative)?;
    Ok(render_tree(&nodes))
}

pub fn build_tree_from_paths(relative_path_types: &[(String, bool)]) -> Result<Vec<TreeNode>> {
    log::debug!(
        "Building tree structure from {} paths...",
        relative_path_types.len()
    );
    let mut root_nodes: Vec<TreeNode> = Vec::new();

    for (rel_path_str, is_dir) in relative_path_types {
        let components: Vec<String> = Path::new(rel_path_str)
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                Component::ParentDir => Some("..".to_string()),
                _ => None,
            })
            .collect();

        if !components.is_empty() {
            insert_node(&mut root_nodes, &components, *is_dir).map_err(|e| {
                log::error!(
                    "Error inserting node into tree for path \"{}\": {}",
                    rel_path_str,
                    e
                );
                e
            })?;
        }
    }

    log::debug!("Tree structure built successfully.");
    Ok(root_nodes)
}

fn insert_node(
    current_level_nodes: &mut Vec<TreeNode>,
    components: &[String],
    is_dir_at_end: bool,
) -> Result<()> {
    let Some((component_name, remaining_components)) = components.split_first() else {
        return Ok(());
    };
    let is_last_component = remaining_components.is_empty();

    let index = match current_level_nodes.binary_search_by(|node| node.name.cmp(component_name)) {
        Ok(index) => index,
        Err(insertion_point) => {
            let node_type = if is_last_component && !is_dir_at_end {
                NodeType::File
            } else {
                NodeType::Directory
            };
            current_level_nodes.insert(
                insertion_point,
                TreeNode {
                    name: component_name.clone(),
                    node_type,
                    children: (node_type == NodeType::Directory).then(Vec::new),
                },
            );
            insertion_point
        }
    };

    let node = &mut current_level_nodes[index];
    if is_last_component {
        if is_dir_at_end && node.node_type == NodeType::File {
            node.node_type = NodeType::Directory;
            node.children.get_or_insert_with(Vec::new);
        }
        return Ok(());
    }

    if node.node_type == NodeType::File {
        return Err(AppError::Tree(format!(
            "Tree conflict: Trying to create children within file component {}",
            component_name
        )));
    }
    let children = node.children.get_or_insert_with(Vec::new);
    insert_node(children, remaining_components, is_dir_at_end)
}

pub fn render_tree(nodes: &[TreeNode]) -> String {
    let mut out = String::new();
    render_level(nodes, "", &mut out);
    if out.ends_with('\n') {
        out.pop();
    }
    out
}

fn render_level(nodes: &[TreeNode], prefix: &str, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&node.name);
        if node.node_type == NodeType::Directory {
            out.push('/');
        }
        out.push('\n');
        if let Some(children) = &node.children {
            let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
            render_level(children, &child_prefix, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn renders_nested_sorted_tree() {
        let base = Path::new("/work");
        let paths = vec![
            PathBuf::from("/work/src/main.rs"),
            PathBuf::from("/work/README.md"),
            PathBuf::from("/work/src/lib/mod.rs"),
            PathBuf::from("/work/Cargo.toml"),
        ];
        let tree = source_tree(&paths, base).unwrap();
        let expected = [
            "├── Cargo.toml",
            "├── README.md",
            "└── src/",
            "    ├── lib/",
            "    │   └── mod.rs",
            "    └── main.rs",
        ]
        .join("\n");
        assert_eq!(tree, expected);
    }

    #[test]
    fn paths_outside_base_climb_with_parent_components() {
        let tree = source_tree(&["/work/a.txt", "/other/b.txt"], Path::new("/work")).unwrap();
        assert_eq!(tree, "├── ../\n│   └── other/\n│       └── b.txt\n└── a.txt");
    }

    #[test]
    fn outside_path_sharing_a_local_name_does_not_conflict() {
        let base = Path::new("/tmp/work");
        let tree = source_tree(&["/tmp/work/tmp", "/tmp/other.rs"], base).unwrap();
        assert_eq!(tree, "├── ../\n│   └── other.rs\n└── tmp");
    }

    #[test]
    fn tree_is_independent_of_input_order() {
        let base = Path::new("/w");
        let forward = source_tree(&["/w/x/1", "/w/y", "/w/x/2"], base).unwrap();
        let backward = source_tree(&["/w/x/2", "/w/y", "/w/x/1"], base).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn file_with_children_is_a_conflict() {
        let paths = vec![("a".to_string(), false), ("a/b".to_string(), false)];
        assert!(matches!(
            build_tree_from_paths(&paths),
            Err(AppError::Tree(_))
        ));
    }

    #[test]
    fn empty_input_renders_empty_tree() {
        let paths: Vec<PathBuf> = Vec::new();
        assert_eq!(source_tree(&paths, Path::new("/")).unwrap(), "");
    }
}
