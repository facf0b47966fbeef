use std::fmt;
use std::time::Duration;

use clap::ValueEnum;

use super::ProfilerResults;

/// Available renderings of accumulated profiler results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ProfilerView {
    /// Plain-text totals with an application/database time split
    Summary,
    /// HTML fragment listing every query grouped by kind
    Table,
}

impl ProfilerView {
    #[must_use]
    pub fn render(self, results: &ProfilerResults) -> String {
        match self {
            ProfilerView::Summary => SummaryView::new(results).to_string(),
            ProfilerView::Table => TableView::new(results).to_string(),
        }
    }
}

fn percent_of(part: Duration, whole: Duration) -> String {
    if whole.is_zero() {
        "--".to_string()
    } else {
        format!("{:.0}", part.as_secs_f64() / whole.as_secs_f64() * 100.0)
    }
}

/// Totals plus how much of a page (or request) was spent in the database.
#[derive(Debug, Clone, Copy)]
pub struct SummaryView<'a> {
    results: &'a ProfilerResults,
    page_generation_time: Duration,
}

impl<'a> SummaryView<'a> {
    #[must_use]
    pub fn new(results: &'a ProfilerResults) -> Self {
        Self {
            results,
            page_generation_time: Duration::ZERO,
        }
    }

    /// Wall time of the surrounding unit of work; database time is reported against it.
    #[must_use]
    pub fn with_page_generation_time(mut self, elapsed: Duration) -> Self {
        self.page_generation_time = elapsed;
        self
    }
}

impl fmt::Display for SummaryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = self.page_generation_time;
        let query = self.results.total_execution_time();
        let app = page.saturating_sub(query);

        let counts: Vec<usize> = self
            .results
            .breakdown()
            .iter()
            .map(|(_, profile)| profile.queries.len())
            .collect();

        writeln!(f, "(--%) {:.4} Secs Page Generation", page.as_secs_f64())?;
        writeln!(
            f,
            "({}%) {:.4} Secs Application",
            percent_of(app, page),
            app.as_secs_f64()
        )?;
        writeln!(
            f,
            "({}%) {:.4} Secs Database - {} Queries, {} Affected Rows",
            percent_of(query, page),
            query.as_secs_f64(),
            self.results.total_queries(),
            self.results.total_affected_rows()
        )?;
        write!(
            f,
            "{} Reads, {} Updates, {} Inserts, {} Deletes, {} Other",
            counts[0], counts[1], counts[2], counts[3], counts[4]
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Every profiled query, grouped by kind, as an HTML fragment.
#[derive(Debug, Clone, Copy)]
pub struct TableView<'a> {
    results: &'a ProfilerResults,
}

impl<'a> TableView<'a> {
    #[must_use]
    pub fn new(results: &'a ProfilerResults) -> Self {
        Self { results }
    }
}

impl fmt::Display for TableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (kind, profile) in self.results.breakdown() {
            write!(
                f,
                "<p style='font-weight:bold;'>{}S ({}) - {:.6}</p><ul>",
                kind.as_str().to_ascii_uppercase(),
                profile.queries.len(),
                profile.total_execution_time.as_secs_f64()
            )?;
            for query in &profile.queries {
                write!(
                    f,
                    "<li>{:.6} ({}) - {}</li>",
                    query.duration.as_secs_f64(),
                    query.affected_rows,
                    escape_html(&query.query)
                )?;
            }
            f.write_str("</ul>")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::ProfilerSink;

    fn sample() -> ProfilerResults {
        let mut results = ProfilerResults::new();
        results.add_query("SELECT * FROM t WHERE a < 'x'", Duration::from_millis(250), 3);
        results.add_query("INSERT INTO t VALUES (1)", Duration::from_millis(250), 1);
        results
    }

    #[test]
    fn summary_with_page_time() {
        let results = sample();
        let out = SummaryView::new(&results)
            .with_page_generation_time(Duration::from_secs(2))
            .to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "(--%) 2.0000 Secs Page Generation");
        assert_eq!(lines[1], "(75%) 1.5000 Secs Application");
        assert_eq!(lines[2], "(25%) 0.5000 Secs Database - 2 Queries, 4 Affected Rows");
        assert_eq!(lines[3], "1 Reads, 0 Updates, 1 Inserts, 0 Deletes, 0 Other");
    }

    #[test]
    fn summary_without_page_time() {
        let results = sample();
        let out = ProfilerView::Summary.render(&results);
        assert!(out.contains("(--%) 0.0000 Secs Application"));
        assert!(out.contains("(--%) 0.5000 Secs Database"));
    }

    #[test]
    fn table_escapes_queries() {
        let results = sample();
        let out = ProfilerView::Table.render(&results);
        assert!(out.starts_with("<p style='font-weight:bold;'>SELECTS (1) - 0.250000</p><ul>"));
        assert!(out.contains("<li>0.250000 (3) - SELECT * FROM t WHERE a &lt; &#039;x&#039;</li>"));
        assert!(out.contains("DELETES (0) - 0.000000</p><ul></ul>"));
    }

    #[test]
    fn view_parses_from_cli_value() {
        assert_eq!(
            ProfilerView::from_str("table", true).ok(),
            Some(ProfilerView::Table)
        );
    }
}
