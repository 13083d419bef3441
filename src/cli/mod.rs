//! CLI module for the Azure DevOps knowledge gateway
//!
//! Every subcommand maps onto one gateway operation and prints JSON to stdout.

pub mod query;

use clap::{Parser, Subcommand};

/// Knowledge Gateway - cached, retrying queries over Azure DevOps
#[derive(Debug, Parser)]
#[command(name = "azdo-knowledge-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Team project (defaults to devops.default_project / AZDO_DEFAULT_PROJECT)
    #[arg(long, short, global = true)]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the projects of the organization
    Projects,

    /// List the wikis of a project
    Wikis,

    /// List wiki pages, of one wiki or of all wikis
    WikiPages {
        #[arg(long)]
        wiki_id: Option<String>,
    },

    /// Search wiki pages by name or path
    WikiSearch { text: String },

    /// Search wiki pages by name, then by content
    WikiContentSearch { text: String },

    /// Print the content of a wiki page
    WikiPage {
        #[arg(long)]
        wiki_id: String,
        #[arg(long)]
        path: String,
    },

    /// Print one section of a wiki page
    WikiSection {
        #[arg(long)]
        wiki_id: String,
        #[arg(long)]
        path: String,
        #[arg(long)]
        title: String,
    },

    /// List test plans
    TestPlans,

    /// Show a test plan with its suites
    TestPlan { plan_id: i64 },

    /// Search test plans by name or description
    TestPlanSearch { text: String },

    /// List test cases of a plan, or of one suite
    TestCases {
        plan_id: i64,
        #[arg(long)]
        suite_id: Option<i64>,
    },

    /// Run a WIQL query (open items of the project by default)
    WorkItems {
        #[arg(long)]
        wiql: Option<String>,
    },

    /// Show a single work item
    WorkItem { id: i64 },

    /// Search work items by title or description
    WorkItemSearch { text: String },

    /// Find wiki pages, test plans and work items related to a text
    Related { text: String },
}
