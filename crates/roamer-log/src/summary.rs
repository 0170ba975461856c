use serde::{Deserialize, Serialize};

/// Statistics appended to the action log when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Display name of the strategy that ran.
    pub strategy: String,
    pub pages_visited: u64,
    pub links_clicked: u64,
    pub links_found: u64,
    /// `links_clicked / links_found`, 0.0 when nothing was found.
    pub coverage: f64,
}

impl RunSummary {
    pub fn render(&self) -> Vec<String> {
        vec![
            "--SUMMARY STATISTICS--".to_string(),
            String::new(),
            format!("The {} has been terminated", self.strategy),
            "The tester:".to_string(),
            String::new(),
            format!("\tVisited {} unique pages", self.pages_visited),
            format!("\tClicked {} unique components", self.links_clicked),
            format!("\tFound {} unique components", self.links_found),
            format!(
                "\tYielded an overall component coverage of {:.3}",
                self.coverage
            ),
            "-- --".to_string(),
        ]
    }
}
