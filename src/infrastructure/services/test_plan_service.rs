//! Test plan service - plans, suites and test cases

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::cache::CacheKey;
use crate::domain::retry::{RetryConfig, RetryPolicy};
use crate::domain::test_plan::{TestCase, TestPlan, TestPlanDetails, TestSuite};
use crate::domain::{ApiError, DomainError};
use crate::infrastructure::cache::{InMemoryCacheConfig, TtlCache};
use crate::infrastructure::http::{decode, encode, DevOpsHttpClient, ValueList, API_VERSION};

#[derive(Debug, Clone)]
pub struct TestPlanServiceConfig {
    pub cache: InMemoryCacheConfig,
    pub retry: RetryConfig,
}

impl Default for TestPlanServiceConfig {
    fn default() -> Self {
        Self {
            cache: InMemoryCacheConfig::default(),
            retry: RetryConfig::default().with_max_delay(10_000),
        }
    }
}

/// Test plan service implementation
#[derive(Debug)]
pub struct TestPlanService {
    client: Arc<dyn DevOpsHttpClient>,
    retry: RetryPolicy,
    plans: TtlCache<Vec<TestPlan>>,
    details: TtlCache<TestPlanDetails>,
    test_cases: TtlCache<Vec<TestCase>>,
}

impl TestPlanService {
    pub fn new(client: Arc<dyn DevOpsHttpClient>, config: TestPlanServiceConfig) -> Self {
        Self {
            client,
            retry: RetryPolicy::new(config.retry),
            plans: TtlCache::with_config("test_plans", config.cache.clone()),
            details: TtlCache::with_config("test_plan_details", config.cache.clone()),
            test_cases: TtlCache::with_config("test_cases", config.cache),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Lists the test plans of a project. Failures yield an empty list.
    #[instrument(skip(self))]
    pub async fn list_plans(&self, project: &str) -> Vec<TestPlan> {
        let key = CacheKey::new("test_plans").part(project).to_string();

        if let Some(plans) = self.plans.get(&key) {
            debug!(project, "Test plans found in cache");
            return plans;
        }

        let label = format!("Getting test plans for {}", project);

        match self
            .fetch::<ValueList<TestPlan>>(&label, &plans_path(project))
            .await
        {
            Ok(list) => {
                info!(project, count = list.value.len(), "Fetched test plans");
                self.plans.set(key, list.value.clone());
                list.value
            }
            Err(e) => {
                if e.is_timeout() {
                    warn!(
                        project,
                        "Test plan request timed out; consider raising http.timeout_ms"
                    );
                }
                error!(project, error = %e, "Failed to get test plans");
                Vec::new()
            }
        }
    }

    /// Fetches a plan and its suites. A suites failure degrades to no suites.
    #[instrument(skip(self))]
    pub async fn get_plan_details(
        &self,
        project: &str,
        plan_id: i64,
    ) -> Result<TestPlanDetails, DomainError> {
        let key = CacheKey::new("test_plan_details")
            .part(project)
            .part(plan_id)
            .to_string();

        if let Some(details) = self.details.get(&key) {
            debug!(project, plan_id, "Test plan details found in cache");
            return Ok(details);
        }

        let plan_label = format!("Getting test plan {}", plan_id);
        let suites_label = format!("Getting suites for test plan {}", plan_id);
        let plan_path = plan_path(project, plan_id);
        let suites_path = suites_path(project, plan_id);

        let (plan, suites) = tokio::join!(
            self.fetch::<TestPlan>(&plan_label, &plan_path),
            self.fetch::<ValueList<TestSuite>>(&suites_label, &suites_path),
        );

        let plan = plan.map_err(|e| DomainError::remote("get test plan details", e))?;
        let suites = match suites {
            Ok(list) => list.value,
            Err(e) => {
                warn!(project, plan_id, error = %e, "Failed to get test suites");
                Vec::new()
            }
        };

        let details = TestPlanDetails { plan, suites };
        info!(
            project,
            plan_id,
            suites = details.suites.len(),
            "Fetched test plan details"
        );
        self.details.set(key, details.clone());
        Ok(details)
    }

    /// Plans whose name or description mentions `text`
    #[instrument(skip(self))]
    pub async fn search_plans(&self, project: &str, text: &str) -> Vec<TestPlan> {
        if text.is_empty() {
            return Vec::new();
        }

        let matches: Vec<TestPlan> = self
            .list_plans(project)
            .await
            .into_iter()
            .filter(|plan| plan.matches(text))
            .collect();

        info!(project, text, count = matches.len(), "Test plan search complete");
        matches
    }

    /// Test cases of one suite, or of every suite in the plan when `suite_id`
    /// is `None`. Failures yield an empty list.
    #[instrument(skip(self))]
    pub async fn get_test_cases(
        &self,
        project: &str,
        plan_id: i64,
        suite_id: Option<i64>,
    ) -> Vec<TestCase> {
        let key = CacheKey::new("test_cases")
            .part(project)
            .part(plan_id)
            .part_or(suite_id, "all")
            .to_string();

        if let Some(cases) = self.test_cases.get(&key) {
            debug!(project, plan_id, ?suite_id, "Test cases found in cache");
            return cases;
        }

        let cases = match suite_id {
            Some(suite_id) => match self.suite_test_cases(project, plan_id, suite_id).await {
                Ok(cases) => cases,
                Err(e) => {
                    error!(project, plan_id, suite_id, error = %e, "Failed to get test cases");
                    return Vec::new();
                }
            },
            None => match self.get_plan_details(project, plan_id).await {
                Ok(details) => self.plan_test_cases(project, plan_id, &details.suites).await,
                Err(e) => {
                    error!(project, plan_id, error = %e, "Failed to get test cases");
                    return Vec::new();
                }
            },
        };

        info!(project, plan_id, ?suite_id, count = cases.len(), "Fetched test cases");
        self.test_cases.set(key, cases.clone());
        cases
    }

    pub fn clear_cache(&self) {
        self.plans.clear();
        self.details.clear();
        self.test_cases.clear();
        info!("Test plan cache cleared");
    }

    async fn plan_test_cases(
        &self,
        project: &str,
        plan_id: i64,
        suites: &[TestSuite],
    ) -> Vec<TestCase> {
        let mut cases = Vec::new();

        for suite in suites {
            match self.suite_test_cases(project, plan_id, suite.id).await {
                Ok(suite_cases) => cases.extend(suite_cases),
                Err(e) => {
                    warn!(plan_id, suite_id = suite.id, error = %e, "Skipping suite")
                }
            }
        }

        cases
    }

    async fn suite_test_cases(
        &self,
        project: &str,
        plan_id: i64,
        suite_id: i64,
    ) -> Result<Vec<TestCase>, ApiError> {
        let key = CacheKey::new("test_cases")
            .part(project)
            .part(plan_id)
            .part(suite_id)
            .to_string();

        if let Some(cases) = self.test_cases.get(&key) {
            return Ok(cases);
        }

        let label = format!("Getting test cases for suite {}", suite_id);
        let list: ValueList<TestCase> = self
            .fetch(&label, &test_cases_path(project, plan_id, suite_id))
            .await?;

        self.test_cases.set(key, list.value.clone());
        Ok(list.value)
    }

    async fn fetch<T: DeserializeOwned>(&self, label: &str, path: &str) -> Result<T, ApiError> {
        let response = self
            .retry
            .execute(label, || self.client.get_json(path))
            .await?;

        decode(response)
    }
}

fn plans_path(project: &str) -> String {
    format!(
        "/{}/_apis/testplan/plans?api-version={}",
        encode(project),
        API_VERSION
    )
}

fn plan_path(project: &str, plan_id: i64) -> String {
    format!(
        "/{}/_apis/testplan/plans/{}?api-version={}",
        encode(project),
        plan_id,
        API_VERSION
    )
}

fn suites_path(project: &str, plan_id: i64) -> String {
    format!(
        "/{}/_apis/testplan/plans/{}/suites?api-version={}",
        encode(project),
        plan_id,
        API_VERSION
    )
}

fn test_cases_path(project: &str, plan_id: i64, suite_id: i64) -> String {
    format!(
        "/{}/_apis/testplan/Plans/{}/Suites/{}/TestCase?api-version={}",
        encode(project),
        plan_id,
        suite_id,
        API_VERSION
    )
}
