//! Content domain - markdown-aware summarizing and section lookup for wiki pages

mod processor;

pub use processor::{
    contains_search_term, extract_sections, extract_summary, find_relevant_sections, Section,
    DEFAULT_SUMMARY_LENGTH,
};
