use tabled::{settings::Style, Table, Tabled};

use crate::cache::SetReport;
use crate::Symbol;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct DependentRow {
    #[tabled(rename = "Dependent")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Abstract")]
    is_abstract: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of a `set` run
pub fn report_table(report: &SetReport) -> String {
    let mut builder = TableBuilder::new();
    builder.add_row("Artifacts written", &report.written.len().to_string());
    builder.add_row("Symbols skipped", &report.skipped.len().to_string());
    builder.build()
}

/// One row per dependent symbol; empty when there are none
pub fn dependents_table(dependents: &[Symbol]) -> String {
    if dependents.is_empty() {
        return String::new();
    }

    let rows: Vec<DependentRow> = dependents
        .iter()
        .map(|symbol| DependentRow {
            name: symbol.name().to_string(),
            kind: symbol.kind().to_string(),
            is_abstract: if symbol.is_abstract() { "yes" } else { "" }.to_string(),
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SkippedSymbol;

    #[test]
    fn test_empty_builder() {
        assert!(TableBuilder::new().build().is_empty());
        assert!(dependents_table(&[]).is_empty());
    }

    #[test]
    fn test_report_table() {
        let report = SetReport {
            written: vec!["A\\B".to_string()],
            skipped: vec![SkippedSymbol {
                name: "%\\I".to_string(),
                reason: "unresolvable".to_string(),
            }],
        };
        let table = report_table(&report);
        assert!(table.contains("Artifacts written"));
        assert!(table.contains("Symbols skipped"));
    }

    #[test]
    fn test_dependents_table() {
        let symbol = Symbol::class("App\\Service").unwrap().with_abstract(true);
        let table = dependents_table(&[symbol]);
        assert!(table.contains("App\\Service"));
        assert!(table.contains("class"));
        assert!(table.contains("yes"));
    }
}
