use serde::{Deserialize, Serialize};

/// Wiki as returned by `_apis/wiki/wikis`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wiki {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub wiki_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
}

impl Wiki {
    /// Wiki type, `"unknown"` when the API omits it
    pub fn type_name(&self) -> &str {
        self.wiki_type.as_deref().unwrap_or("unknown")
    }
}

/// Node of the recursive page tree returned with `recursionLevel=full`.
///
/// The root node has path `/` and does not correspond to a real page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageNode {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub git_item_path: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub is_parent_page: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(rename = "subPages", default)]
    pub children: Vec<PageNode>,
}

impl PageNode {
    pub const ROOT_PATH: &'static str = "/";

    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: PageNode) -> Self {
        self.is_parent_page = true;
        self.children.push(child);
        self
    }

    pub fn is_root(&self) -> bool {
        self.path == Self::ROOT_PATH
    }
}

/// Flattened page metadata, without content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPage {
    pub path: String,
    /// Display name derived from the last path segment
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_type: Option<String>,
    pub git_item_path: Option<String>,
    pub order: Option<i64>,
    pub is_parent_page: bool,
    pub url: Option<String>,
    pub remote_url: Option<String>,
}

impl WikiPage {
    /// Tags the page with the wiki it belongs to
    pub fn in_wiki(mut self, wiki: &Wiki) -> Self {
        self.wiki_id = Some(wiki.id.clone());
        self.wiki_name = Some(wiki.name.clone());
        self.wiki_type = Some(wiki.type_name().to_string());
        self
    }
}

/// How a search hit matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Name or path contains the search text
    Name,
    /// Page body contains the search text
    Content,
}

/// Wiki page matched by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WikiPageHit {
    #[serde(flatten)]
    pub page: WikiPage,
    pub match_type: MatchType,
    /// Relevant sections of the page body (content matches only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl WikiPageHit {
    pub fn by_name(page: WikiPage) -> Self {
        Self {
            page,
            match_type: MatchType::Name,
            content: None,
            summary: None,
        }
    }

    pub fn by_content(page: WikiPage, content: String, summary: String) -> Self {
        Self {
            page,
            match_type: MatchType::Content,
            content: Some(content),
            summary: Some(summary),
        }
    }
}

/// Result of looking up a single section of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiSectionLookup {
    pub found: bool,
    pub content: Option<String>,
}

impl WikiSectionLookup {
    pub fn missing() -> Self {
        Self {
            found: false,
            content: None,
        }
    }

    pub fn found(content: String) -> Self {
        Self {
            found: true,
            content: Some(content),
        }
    }
}
