//! WIQL query construction

/// Largest number of ids fetched in one `workitems?ids=` request
pub const MAX_BATCH_IDS: usize = 100;

const SELECT_FIELDS: &str = "SELECT [System.Id], [System.Title], [System.WorkItemType], [System.State], [System.AssignedTo] FROM WorkItems";

/// Escapes a value for use inside a single-quoted WIQL literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Open work items of a project, most recently changed first
pub fn default_query(project: &str) -> String {
    format!(
        "{} WHERE [System.TeamProject] = '{}' AND [System.State] <> 'Closed' ORDER BY [System.ChangedDate] DESC",
        SELECT_FIELDS,
        escape_literal(project)
    )
}

/// Work items whose title or description contains `text`
pub fn search_query(project: &str, text: &str) -> String {
    let text = escape_literal(text);

    format!(
        "{} WHERE [System.TeamProject] = '{}' AND ([System.Title] CONTAINS '{}' OR [System.Description] CONTAINS '{}') ORDER BY [System.ChangedDate] DESC",
        SELECT_FIELDS,
        escape_literal(project),
        text,
        text
    )
}
