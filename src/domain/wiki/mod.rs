//! Wiki domain - wikis, page trees and search hits

mod entity;
mod tree;

pub use entity::{MatchType, PageNode, Wiki, WikiPage, WikiPageHit, WikiSectionLookup};
pub use tree::{flatten_pages, page_name};
