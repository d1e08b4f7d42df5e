use statrs::statistics::Statistics;

use crate::model::{AnalyzedProduct, Cluster};

pub const EXPORT_FILE: &str = "inventory_analytics.csv";

const EXPORT_HEADER: [&str; 7] = [
    "Product ID",
    "Name",
    "Category",
    "Cluster",
    "Management Tip",
    "Smart Suggestions",
    "Predicted Safe Discount",
];

/// Per-cluster headcounts for the summary cards and distribution chart.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClusterSummary {
    pub total: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl ClusterSummary {
    pub fn count(&self, cluster: Cluster) -> usize {
        match cluster {
            Cluster::High => self.high,
            Cluster::Moderate => self.moderate,
            Cluster::Low => self.low,
        }
    }
}

pub fn summarize(rows: &[AnalyzedProduct]) -> ClusterSummary {
    let mut summary = ClusterSummary {
        total: rows.len(),
        ..ClusterSummary::default()
    };
    for p in rows {
        match p.cluster {
            Cluster::High => summary.high += 1,
            Cluster::Moderate => summary.moderate += 1,
            Cluster::Low => summary.low += 1,
        }
    }
    summary
}

/// Aggregate metrics across the filtered set.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryStats {
    pub mean_conversion: f64,
    pub mean_profit: f64,
    pub near_expiry: usize,
}

pub fn summary_stats(rows: &[AnalyzedProduct]) -> SummaryStats {
    if rows.is_empty() {
        return SummaryStats::default();
    }

    let conversions: Vec<f64> = rows.iter().map(|p| p.conversion_rate).collect();
    let profits: Vec<f64> = rows.iter().map(|p| p.profit).collect();

    SummaryStats {
        mean_conversion: conversions.mean(),
        mean_profit: profits.mean(),
        near_expiry: rows.iter().filter(|p| p.close_to_expiry).count(),
    }
}

/// First `n` rows in their current display order. This is a positional
/// slice, not a sort by profit: the dashboard's "top by profit" chart has
/// always been fed whatever came first.
pub fn top_by_profit(rows: &[AnalyzedProduct], n: usize) -> &[AnalyzedProduct] {
    &rows[..rows.len().min(n)]
}

fn export_row(p: &AnalyzedProduct) -> [String; 7] {
    [
        p.record.product_id.clone(),
        p.record.name.clone(),
        p.record.category.clone(),
        p.cluster.id().to_string(),
        p.management_tip.to_string(),
        p.smart_suggestions.clone(),
        format!("{}", p.predicted_safe_discount),
    ]
}

/// Report body: header row plus one bare-comma-joined row per product.
/// Cells are not quoted; a comma inside a name shifts columns, matching the
/// report format this replaces.
pub fn render_csv(rows: &[AnalyzedProduct]) -> String {
    let mut lines = vec![EXPORT_HEADER.join(",")];
    for p in rows {
        lines.push(export_row(p).join(","));
    }
    lines.join("\n")
}

pub fn write_csv(rows: &[AnalyzedProduct], path: &str) -> std::io::Result<()> {
    std::fs::write(path, render_csv(rows))
}
