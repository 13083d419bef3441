//! Runs one gateway query and prints the result

use serde::Serialize;
use serde_json::json;
use tracing::debug;

use super::{Cli, Command};
use crate::config::AppConfig;
use crate::domain::DomainError;
use crate::infrastructure::logging;
use crate::infrastructure::DevOpsClient;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    let client = DevOpsClient::from_config(&config)?;
    let project = || resolve_project(cli.project.as_deref(), &config);

    debug!(command = ?cli.command, "Running command");

    match &cli.command {
        Command::Projects => print(&client.list_projects().await?),
        Command::Wikis => print(&client.list_wikis(&project()?).await),
        Command::WikiPages { wiki_id } => {
            print(&client.list_wiki_pages(&project()?, wiki_id.as_deref()).await)
        }
        Command::WikiSearch { text } => print(&client.search_wiki_pages(&project()?, text).await),
        Command::WikiContentSearch { text } => {
            print(&client.search_wiki_content(&project()?, text).await)
        }
        Command::WikiPage { wiki_id, path } => {
            let content = client
                .get_wiki_page_content(&project()?, wiki_id, path)
                .await?;
            print(&json!({ "path": path, "content": content }))
        }
        Command::WikiSection {
            wiki_id,
            path,
            title,
        } => print(
            &client
                .get_wiki_section(&project()?, wiki_id, path, title)
                .await?,
        ),
        Command::TestPlans => print(&client.list_test_plans(&project()?).await),
        Command::TestPlan { plan_id } => print(
            &client
                .get_test_plan_details(&project()?, *plan_id)
                .await?,
        ),
        Command::TestPlanSearch { text } => {
            print(&client.search_test_plans(&project()?, text).await)
        }
        Command::TestCases { plan_id, suite_id } => print(
            &client
                .get_test_cases(&project()?, *plan_id, *suite_id)
                .await,
        ),
        Command::WorkItems { wiql } => {
            print(&client.query_work_items(&project()?, wiql.as_deref()).await)
        }
        Command::WorkItem { id } => print(&client.get_work_item(&project()?, *id).await?),
        Command::WorkItemSearch { text } => {
            print(&client.search_work_items(&project()?, text).await)
        }
        Command::Related { text } => print(&client.find_related_items(&project()?, text).await),
    }
}

/// Explicit `--project` wins over the configured default
fn resolve_project(explicit: Option<&str>, config: &AppConfig) -> Result<String, DomainError> {
    explicit
        .or(config.devops.default_project.as_deref())
        .filter(|project| !project.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            DomainError::validation(
                "No project given; pass --project or set AZDO_DEFAULT_PROJECT",
            )
        })
}

fn print<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
