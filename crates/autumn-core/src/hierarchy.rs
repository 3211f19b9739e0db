//! Treemap leaves from the context → project → subproject hierarchy.

use serde::{Deserialize, Serialize};

const MINUTES_PER_HOUR: f64 = 60.0;

/// Group used by flat project totals with no context.
pub const DEFAULT_GROUP: &str = "General";

/// A node of the hierarchy endpoint. `total_time` is in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

/// A project total tagged with its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextTotal {
    pub name: String,
    pub total_time: f64,
    #[serde(default)]
    pub context_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreemapLeaf {
    pub name: String,
    /// Ancestor names below the root, joined with `/`.
    pub path: String,
    pub hours: f64,
    /// Name of the enclosing depth-1 branch, if any.
    pub group: Option<String>,
    pub depth: usize,
}

/// Flattens the tree below `root` into leaves with time.
///
/// The root itself is not part of any path and its children sit at depth 0.
/// A branch at depth 1 names the group of every leaf under it. Leaves without
/// time are dropped.
pub fn flatten_tree(root: &TreeNode) -> Vec<TreemapLeaf> {
    let mut leaves = Vec::new();
    let mut path = Vec::new();
    for child in &root.children {
        collect_leaves(child, &mut path, 0, None, &mut leaves);
    }
    tracing::debug!(leaves = leaves.len(), "flattened hierarchy");
    leaves
}

fn collect_leaves<'a>(
    node: &'a TreeNode,
    path: &mut Vec<&'a str>,
    depth: usize,
    group: Option<&'a str>,
    leaves: &mut Vec<TreemapLeaf>,
) {
    if node.children.is_empty() {
        if node.total_time > 0.0 {
            leaves.push(TreemapLeaf {
                name: node.name.clone(),
                path: path.join("/"),
                hours: node.total_time / MINUTES_PER_HOUR,
                group: group.map(str::to_string),
                depth,
            });
        }
        return;
    }

    let group = if depth == 1 { Some(node.name.as_str()) } else { group };
    path.push(&node.name);
    for child in &node.children {
        collect_leaves(child, path, depth + 1, group, leaves);
    }
    path.pop();
}

/// Leaves for flat project totals, grouped by context.
pub fn flatten_projects(projects: &[ContextTotal]) -> Vec<TreemapLeaf> {
    projects
        .iter()
        .filter(|p| p.total_time > 0.0)
        .map(|p| {
            let group = p.context_name.as_deref().unwrap_or(DEFAULT_GROUP);
            TreemapLeaf {
                name: p.name.clone(),
                path: group.to_string(),
                hours: p.total_time / MINUTES_PER_HOUR,
                group: Some(group.to_string()),
                depth: 1,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> TreeNode {
        serde_json::from_value(json!({
            "name": "All",
            "children": [
                {"name": "Work", "children": [
                    {"name": "autumn", "total_time": 240, "children": [
                        {"name": "ui", "total_time": 120},
                        {"name": "api", "total_time": 0}
                    ]},
                    {"name": "ops", "total_time": 60}
                ]},
                {"name": "loose", "total_time": 30},
                {"name": "Empty", "children": []}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_flatten_tree_paths_and_groups() {
        let leaves = flatten_tree(&tree());

        assert_eq!(
            leaves,
            vec![
                TreemapLeaf {
                    name: "ui".to_string(),
                    path: "Work/autumn".to_string(),
                    hours: 2.0,
                    group: Some("autumn".to_string()),
                    depth: 2,
                },
                TreemapLeaf {
                    name: "ops".to_string(),
                    path: "Work".to_string(),
                    hours: 1.0,
                    group: None,
                    depth: 1,
                },
                TreemapLeaf {
                    name: "loose".to_string(),
                    path: String::new(),
                    hours: 0.5,
                    group: None,
                    depth: 0,
                },
            ]
        );
    }

    #[test]
    fn test_flatten_tree_without_children() {
        let root = TreeNode {
            name: "All".to_string(),
            total_time: 90.0,
            children: Vec::new(),
        };
        assert!(flatten_tree(&root).is_empty());
    }

    #[test]
    fn test_flatten_projects_defaults_group() {
        let projects: Vec<ContextTotal> = serde_json::from_value(json!([
            {"name": "autumn", "total_time": 90, "context_name": "Work"},
            {"name": "garden", "total_time": 30},
            {"name": "idle", "total_time": 0, "context_name": "Home"}
        ]))
        .unwrap();

        let leaves = flatten_projects(&projects);

        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].path, "Work");
        assert_eq!(leaves[0].group.as_deref(), Some("Work"));
        assert_eq!(leaves[1].path, DEFAULT_GROUP);
        assert_eq!(leaves[1].depth, 1);
        assert!((leaves[1].hours - 0.5).abs() < 1e-9);
    }
}
