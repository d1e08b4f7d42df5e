use serde::{Serialize, Deserialize};

/// One row of the `products` table. Numeric columns that are NULL in the
/// source default to 0; a missing category becomes "Uncategorized".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    #[serde(alias = "productid", alias = "id")]
    pub product_id: String,
    pub name: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default, alias = "stockcount")]
    pub stock_count: i64,
    #[serde(default, alias = "scannedcount")]
    pub scanned_count: i64,
    #[serde(default, alias = "cartaddcount")]
    pub cart_add_count: i64,
    #[serde(default, alias = "salecount")]
    pub sale_count: i64,
    #[serde(default, alias = "salesvelocity")]
    pub sales_velocity: f64,
    #[serde(default, alias = "expirydate")]
    pub expiry_date: Option<String>,
}

pub fn default_category() -> String {
    "Uncategorized".to_string()
}

/// Performance tier assigned from the weighted score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cluster {
    High,
    Moderate,
    Low,
}

impl Cluster {
    pub const ALL: [Cluster; 3] = [Cluster::High, Cluster::Moderate, Cluster::Low];

    /// Numeric id used in exports and the cluster filter (1 = high, 3 = low).
    pub fn id(self) -> u8 {
        match self {
            Cluster::High => 1,
            Cluster::Moderate => 2,
            Cluster::Low => 3,
        }
    }

    pub fn management_tip(self) -> &'static str {
        match self {
            Cluster::High => "🟢 High Performer – Promote and Stock More",
            Cluster::Moderate => "🟡 Moderate – Adjust Placement or Price",
            Cluster::Low => "🔴 Low Performer – Discount or Remove",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cluster::High => "High Performers",
            Cluster::Moderate => "Moderate",
            Cluster::Low => "Low Performers",
        }
    }
}

/// Derived view over one ProductRecord. Recomputed in full on every
/// analysis pass; never partially mutated.
#[derive(Debug, Clone)]
pub struct AnalyzedProduct {
    pub record: ProductRecord,

    pub conversion_rate: f64,
    pub abandon_rate: f64,
    pub profit: f64,
    pub close_to_expiry: bool,

    pub performance_score: f64,
    pub cluster: Cluster,
    pub management_tip: &'static str,
    pub smart_suggestions: String,
    pub predicted_safe_discount: f64,
}
