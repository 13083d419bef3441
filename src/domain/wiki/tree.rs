//! Page tree flattening

use super::{PageNode, WikiPage};

/// Flattens a page tree in pre-order (a page before its sub-pages).
///
/// The synthetic root is skipped. Duplicate paths are kept as separate
/// entries.
pub fn flatten_pages(root: &PageNode) -> Vec<WikiPage> {
    let mut pages = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if !node.path.is_empty() && !node.is_root() {
            pages.push(to_page(node));
        }

        stack.extend(node.children.iter().rev());
    }

    pages
}

/// Display name for a page path: last segment, with hyphens and `%20`
/// turned into spaces.
pub fn page_name(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(|segment| segment.replace('-', " ").replace("%20", " ").trim().to_string())
        .unwrap_or_default()
}

fn to_page(node: &PageNode) -> WikiPage {
    WikiPage {
        path: node.path.clone(),
        name: page_name(&node.path),
        wiki_id: None,
        wiki_name: None,
        wiki_type: None,
        git_item_path: node.git_item_path.clone(),
        order: node.order,
        is_parent_page: node.is_parent_page,
        url: node.url.clone(),
        remote_url: node.remote_url.clone(),
    }
}
