//! Wiki service - wiki listing, page trees, two-phase search and section lookup

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::cache::CacheKey;
use crate::domain::content::{
    contains_search_term, extract_sections, extract_summary, find_relevant_sections,
};
use crate::domain::retry::{RetryConfig, RetryPolicy};
use crate::domain::wiki::{flatten_pages, PageNode, Wiki, WikiPage, WikiPageHit, WikiSectionLookup};
use crate::domain::{ApiError, DomainError};
use crate::infrastructure::cache::{InMemoryCacheConfig, TtlCache};
use crate::infrastructure::http::{decode, encode, DevOpsHttpClient, ValueList, API_VERSION};

/// Wiki service configuration
#[derive(Debug, Clone)]
pub struct WikiServiceConfig {
    pub cache: InMemoryCacheConfig,
    pub retry: RetryConfig,
    /// Summary length for content matches
    pub max_content_length: usize,
    /// Number of page contents fetched concurrently during content search
    pub batch_size: usize,
    /// Pause between content-search batches
    pub batch_delay: Duration,
}

impl Default for WikiServiceConfig {
    fn default() -> Self {
        Self {
            cache: InMemoryCacheConfig::default(),
            retry: RetryConfig::default().with_max_delay(5000),
            max_content_length: 2000,
            batch_size: 5,
            batch_delay: Duration::from_millis(100),
        }
    }
}

/// Wiki service implementation
#[derive(Debug)]
pub struct WikiService {
    client: Arc<dyn DevOpsHttpClient>,
    retry: RetryPolicy,
    wikis: TtlCache<Vec<Wiki>>,
    pages: TtlCache<Vec<WikiPage>>,
    contents: TtlCache<String>,
    config: WikiServiceConfig,
}

impl WikiService {
    pub fn new(client: Arc<dyn DevOpsHttpClient>, config: WikiServiceConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(config.retry.clone()),
            wikis: TtlCache::with_config("wikis", config.cache.clone()),
            pages: TtlCache::with_config("wiki_pages", config.cache.clone()),
            contents: TtlCache::with_config("wiki_content", config.cache.clone()),
            config,
        }
    }

    /// Replaces the retry policy, e.g. to attach an observer
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Lists the wikis of a project. Failures yield an empty list.
    #[instrument(skip(self))]
    pub async fn list_wikis(&self, project: &str) -> Vec<Wiki> {
        let key = CacheKey::new("wikis").part(project).to_string();

        if let Some(wikis) = self.wikis.get(&key) {
            debug!(project, "Wikis found in cache");
            return wikis;
        }

        let path = wikis_path(project);
        let label = format!("Getting wikis for {}", project);

        match self.fetch::<ValueList<Wiki>>(&label, &path).await {
            Ok(list) => {
                info!(project, count = list.value.len(), "Fetched wikis");
                self.wikis.set(key, list.value.clone());
                list.value
            }
            Err(e) => {
                error!(project, error = %e, "Failed to get wikis");
                Vec::new()
            }
        }
    }

    /// Lists every page of one wiki (metadata only). Failures yield an empty list.
    #[instrument(skip(self))]
    pub async fn list_pages(&self, project: &str, wiki_id: &str) -> Vec<WikiPage> {
        let key = CacheKey::new("all_wiki_pages")
            .part(project)
            .part(wiki_id)
            .to_string();

        if let Some(pages) = self.pages.get(&key) {
            debug!(project, wiki_id, "Wiki pages found in cache");
            return pages;
        }

        let path = page_tree_path(project, wiki_id);
        let label = format!("Getting all pages for {}/{}", project, wiki_id);

        match self.fetch::<PageNode>(&label, &path).await {
            Ok(root) => {
                let pages = flatten_pages(&root);
                info!(project, wiki_id, count = pages.len(), "Fetched wiki pages");
                self.pages.set(key, pages.clone());
                pages
            }
            Err(e) => {
                error!(project, wiki_id, error = %e, "Failed to get wiki pages");
                Vec::new()
            }
        }
    }

    /// Lists the pages of every wiki in the project, tagged with their wiki
    #[instrument(skip(self))]
    pub async fn list_all_pages(&self, project: &str) -> Vec<WikiPage> {
        let wikis = self.list_wikis(project).await;

        if wikis.is_empty() {
            warn!(project, "No wikis found");
            return Vec::new();
        }

        let mut all_pages = Vec::new();

        for wiki in &wikis {
            let pages = self.list_pages(project, &wiki.id).await;
            all_pages.extend(pages.into_iter().map(|page| page.in_wiki(wiki)));
        }

        info!(project, count = all_pages.len(), "Listed pages across all wikis");
        all_pages
    }

    /// Fast search on page names and paths; no content is fetched
    #[instrument(skip(self))]
    pub async fn search_pages(&self, project: &str, text: &str) -> Vec<WikiPage> {
        if project.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let matches: Vec<WikiPage> = self
            .list_all_pages(project)
            .await
            .into_iter()
            .filter(|page| {
                contains_search_term(&page.name, text) || contains_search_term(&page.path, text)
            })
            .collect();

        info!(project, text, count = matches.len(), "Name search complete");
        matches
    }

    /// Fetches the markdown content of a page
    #[instrument(skip(self))]
    pub async fn get_page_content(
        &self,
        project: &str,
        wiki_id: &str,
        page_path: &str,
    ) -> Result<String, DomainError> {
        let key = CacheKey::new("wiki_content")
            .part(project)
            .part(wiki_id)
            .part(page_path)
            .to_string();

        if let Some(content) = self.contents.get(&key) {
            debug!(page_path, "Content found in cache");
            return Ok(content);
        }

        let path = page_content_path(project, wiki_id, page_path);
        let label = format!("Getting content for {}", page_path);

        let response = self
            .retry
            .execute(&label, || self.client.get_json(&path))
            .await
            .map_err(|e| DomainError::remote(format!("get wiki content for {}", page_path), e))?;

        let content = response
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        debug!(page_path, chars = content.len(), "Fetched page content");
        self.contents.set(key, content.clone());
        Ok(content)
    }

    /// Two-phase search: name matches first, then pages whose content
    /// mentions `text`. A page appears at most once.
    #[instrument(skip(self))]
    pub async fn search_content(&self, project: &str, text: &str) -> Vec<WikiPageHit> {
        if project.is_empty() || text.is_empty() {
            return Vec::new();
        }

        let name_matches = self.search_pages(project, text).await;
        let all_pages = self.list_all_pages(project).await;
        let batch_size = self.config.batch_size.max(1);
        let batch_count = all_pages.len().div_ceil(batch_size);
        let mut content_matches = Vec::new();

        for (index, batch) in all_pages.chunks(batch_size).enumerate() {
            let results = join_all(
                batch
                    .iter()
                    .map(|page| self.match_page_content(project, page, text)),
            )
            .await;

            content_matches.extend(results.into_iter().flatten());

            if index + 1 < batch_count {
                tokio::time::sleep(self.config.batch_delay).await;
            }
        }

        let name_count = name_matches.len();
        let hits = merge_hits(name_matches, content_matches);

        info!(
            project,
            text,
            total = hits.len(),
            name_matches = name_count,
            content_matches = hits.len() - name_count,
            "Content search complete"
        );
        hits
    }

    /// Returns the first section whose title contains `section_title`
    #[instrument(skip(self))]
    pub async fn get_section(
        &self,
        project: &str,
        wiki_id: &str,
        page_path: &str,
        section_title: &str,
    ) -> Result<WikiSectionLookup, DomainError> {
        let content = self.get_page_content(project, wiki_id, page_path).await?;

        let lookup = extract_sections(&content)
            .iter()
            .find(|section| contains_search_term(&section.title, section_title))
            .map(|section| WikiSectionLookup::found(section.render()))
            .unwrap_or_else(WikiSectionLookup::missing);

        Ok(lookup)
    }

    pub fn clear_cache(&self) {
        self.wikis.clear();
        self.pages.clear();
        self.contents.clear();
        info!("Wiki cache cleared");
    }

    async fn match_page_content(
        &self,
        project: &str,
        page: &WikiPage,
        text: &str,
    ) -> Option<WikiPageHit> {
        let wiki_id = page.wiki_id.as_deref()?;

        match self.get_page_content(project, wiki_id, &page.path).await {
            Ok(content) if contains_search_term(&content, text) => Some(WikiPageHit::by_content(
                page.clone(),
                find_relevant_sections(&content, text),
                extract_summary(&content, self.config.max_content_length),
            )),
            Ok(_) => None,
            Err(e) => {
                warn!(page = %page.path, error = %e, "Skipping page in content search");
                None
            }
        }
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        label: &str,
        path: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .retry
            .execute(label, || self.client.get_json(path))
            .await?;

        decode(response)
    }
}

/// Name matches first, then content matches whose path is not already present
fn merge_hits(name_matches: Vec<WikiPage>, content_matches: Vec<WikiPageHit>) -> Vec<WikiPageHit> {
    let name_paths: HashSet<String> = name_matches.iter().map(|page| page.path.clone()).collect();

    name_matches
        .into_iter()
        .map(WikiPageHit::by_name)
        .chain(
            content_matches
                .into_iter()
                .filter(|hit| !name_paths.contains(&hit.page.path)),
        )
        .collect()
}

fn wikis_path(project: &str) -> String {
    format!(
        "/{}/_apis/wiki/wikis?api-version={}",
        encode(project),
        API_VERSION
    )
}

fn page_tree_path(project: &str, wiki_id: &str) -> String {
    format!(
        "/{}/_apis/wiki/wikis/{}/pages?path=/&recursionLevel=full&api-version={}",
        encode(project),
        encode(wiki_id),
        API_VERSION
    )
}

fn page_content_path(project: &str, wiki_id: &str, page_path: &str) -> String {
    format!(
        "/{}/_apis/wiki/wikis/{}/pages?path={}&includeContent=true&api-version={}",
        encode(project),
        encode(wiki_id),
        encode(page_path),
        API_VERSION
    )
}
