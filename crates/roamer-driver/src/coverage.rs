//! Link and page counters kept by a driver facade for the whole session.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::target::{PageSignature, Target};

/// Point-in-time coverage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coverage {
    pub pages_visited: u64,
    pub links_clicked: u64,
    pub links_found: u64,
}

impl Coverage {
    /// `links_clicked / links_found`, in `[0, 1]`; 0.0 before any link is found.
    pub fn ratio(&self) -> f64 {
        if self.links_found == 0 {
            return 0.0;
        }
        (self.links_clicked as f64 / self.links_found as f64).min(1.0)
    }
}

/// Distinct hrefs found and clicked, plus distinct pages seen.
#[derive(Debug, Clone, Default)]
pub struct CoverageCounters {
    found: HashSet<String>,
    clicked: HashSet<String>,
    pages: HashSet<PageSignature>,
}

impl CoverageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every link in an enumeration as found.
    pub fn record_enumeration(&mut self, targets: &[Target]) {
        for target in targets.iter().filter(|t| t.is_link()) {
            if !self.found.contains(&target.href) {
                self.found.insert(target.href.clone());
            }
        }
    }

    pub fn record_page(&mut self, signature: PageSignature) {
        self.pages.insert(signature);
    }

    /// Record a link as clicked. A link clicked without having been found
    /// counts as found too, so clicked never exceeds found.
    pub fn record_click(&mut self, href: &str) {
        if !self.found.contains(href) {
            self.found.insert(href.to_string());
        }
        if !self.clicked.contains(href) {
            self.clicked.insert(href.to_string());
        }
    }

    pub fn snapshot(&self) -> Coverage {
        Coverage {
            pages_visited: self.pages.len() as u64,
            links_clicked: self.clicked.len() as u64,
            links_found: self.found.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_is_zero_before_anything_found() {
        assert_eq!(Coverage::default().ratio(), 0.0);
    }

    #[test]
    fn test_counts_distinct_links_only() {
        let mut counters = CoverageCounters::new();
        let page = vec![
            Target::link("file:///a.html", "A"),
            Target::link("file:///b.html", "B"),
            Target::link("file:///a.html", "A again"),
            Target::input("Search"),
        ];
        counters.record_enumeration(&page);
        counters.record_enumeration(&page);
        counters.record_click("file:///a.html");
        counters.record_click("file:///a.html");

        let coverage = counters.snapshot();
        assert_eq!(coverage.links_found, 2);
        assert_eq!(coverage.links_clicked, 1);
        assert_eq!(coverage.ratio(), 0.5);
    }

    #[test]
    fn test_ratio_monotonic_in_clicks() {
        let mut counters = CoverageCounters::new();
        let hrefs: Vec<String> = (0..4).map(|i| format!("file:///{i}.html")).collect();
        let page: Vec<Target> = hrefs.iter().map(|h| Target::link(h.as_str(), "")).collect();
        counters.record_enumeration(&page);

        let mut last = counters.snapshot().ratio();
        for href in &hrefs {
            counters.record_click(href);
            let now = counters.snapshot().ratio();
            assert!(now >= last);
            assert!((0.0..=1.0).contains(&now));
            last = now;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_unseen_click_counts_as_found() {
        let mut counters = CoverageCounters::new();
        counters.record_click("tel:5550100");
        let coverage = counters.snapshot();
        assert_eq!(coverage.links_found, 1);
        assert_eq!(coverage.ratio(), 1.0);
    }

    #[test]
    fn test_pages_visited_counts_signatures() {
        let mut counters = CoverageCounters::new();
        counters.record_page(PageSignature(1));
        counters.record_page(PageSignature(2));
        counters.record_page(PageSignature(1));
        assert_eq!(counters.snapshot().pages_visited, 2);
    }
}
