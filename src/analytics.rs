use chrono::{DateTime, NaiveDate};
use rayon::prelude::*;

use crate::model::{AnalyzedProduct, Cluster, ProductRecord};

/// Products expiring within this many days are flagged for clearance.
const EXPIRY_HORIZON_DAYS: i64 = 30;

/// Score one product. Pure: everything is derived from the record and the
/// supplied date, so re-running on the same inputs yields the same output.
/// Zero denominators never fault; the affected rate is 0 by rule.
pub fn analyze(record: &ProductRecord, today: NaiveDate) -> AnalyzedProduct {
    let conversion_rate = if record.scanned_count > 0 {
        record.sale_count as f64 / record.scanned_count as f64
    } else {
        0.0
    };

    // Can go negative when sales exceed cart adds; fed to the score unclamped.
    let abandon_rate = if record.cart_add_count > 0 {
        1.0 - record.sale_count as f64 / record.cart_add_count as f64
    } else {
        0.0
    };

    let profit = record.price * record.sale_count as f64;

    let close_to_expiry = record
        .expiry_date
        .as_deref()
        .and_then(parse_expiry)
        .map(|expiry| (expiry - today).num_days() <= EXPIRY_HORIZON_DAYS)
        .unwrap_or(false);

    let performance_score =
        0.4 * conversion_rate + 0.3 * (profit / 1000.0) + 0.3 * (1.0 - abandon_rate);

    let cluster = classify(performance_score);

    let smart_suggestions =
        build_suggestions(record, conversion_rate, abandon_rate, profit, close_to_expiry);
    let predicted_safe_discount = safe_discount(record, profit);

    AnalyzedProduct {
        record: record.clone(),
        conversion_rate,
        abandon_rate,
        profit,
        close_to_expiry,
        performance_score,
        cluster,
        management_tip: cluster.management_tip(),
        smart_suggestions,
        predicted_safe_discount,
    }
}

/// Score all products, preserving input order. Records are independent, so
/// the map runs per-record in parallel.
pub fn analyze_all(records: &[ProductRecord], today: NaiveDate) -> Vec<AnalyzedProduct> {
    records.par_iter().map(|r| analyze(r, today)).collect()
}

/// Tier boundaries are exclusive on the high side: exactly 0.7 is Moderate,
/// exactly 0.3 is Low.
pub fn classify(score: f64) -> Cluster {
    if score > 0.7 {
        Cluster::High
    } else if score > 0.3 {
        Cluster::Moderate
    } else {
        Cluster::Low
    }
}

/// Case-insensitive substring match on name or category, ANDed with an
/// optional exact cluster match. Empty search matches everything.
pub fn filter_products(
    rows: &[AnalyzedProduct],
    search: &str,
    cluster: Option<Cluster>,
) -> Vec<AnalyzedProduct> {
    let needle = search.to_lowercase();
    rows.iter()
        .filter(|p| {
            needle.is_empty()
                || p.record.name.to_lowercase().contains(&needle)
                || p.record.category.to_lowercase().contains(&needle)
        })
        .filter(|p| cluster.map_or(true, |c| p.cluster == c))
        .cloned()
        .collect()
}

fn build_suggestions(
    record: &ProductRecord,
    conversion_rate: f64,
    abandon_rate: f64,
    profit: f64,
    close_to_expiry: bool,
) -> String {
    let mut suggestions = Vec::new();
    if conversion_rate < 0.2 {
        suggestions.push("Improve product description and visibility");
    }
    if abandon_rate > 0.5 {
        suggestions.push("Offer incentives to reduce cart abandonment");
    }
    if record.stock_count < 10 {
        suggestions.push("Low stock: consider restocking soon");
    }
    if record.stock_count > 100 {
        suggestions.push("High stock: consider promotional campaigns");
    }
    if profit < 50.0 {
        suggestions.push("Low profit: review pricing or supplier costs");
    }
    if close_to_expiry {
        suggestions.push("Close to expiry: increase discount to clear stock");
    }

    if suggestions.is_empty() {
        "No immediate action needed".to_string()
    } else {
        suggestions.join(" | ")
    }
}

/// Bounded discount recommendation. Any indeterminate arithmetic (zero
/// revenue, non-finite intermediate) yields exactly 0.
fn safe_discount(record: &ProductRecord, profit: f64) -> f64 {
    let revenue = record.price * record.sale_count as f64;
    if revenue <= 0.0 {
        return 0.0;
    }
    let profit_margin = profit / revenue;
    let suggested = (record.discount + 0.1).min(profit_margin * 0.8);
    if suggested.is_finite() {
        suggested
    } else {
        0.0
    }
}

/// Plain ISO dates first, then full RFC 3339 timestamps. Anything else is
/// treated as "not near expiry" rather than an error.
fn parse_expiry(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn record(
        price: f64,
        sale_count: i64,
        scanned_count: i64,
        cart_add_count: i64,
        stock_count: i64,
        discount: f64,
    ) -> ProductRecord {
        ProductRecord {
            product_id: "P1".to_string(),
            name: "Basmati Rice".to_string(),
            category: "Grocery".to_string(),
            price,
            discount,
            stock_count,
            scanned_count,
            cart_add_count,
            sale_count,
            sales_velocity: 0.0,
            expiry_date: None,
        }
    }

    #[test]
    fn moderate_performer_with_low_stock_and_near_expiry() {
        let mut r = record(100.0, 5, 10, 8, 5, 0.1);
        r.expiry_date = Some((today() + Duration::days(20)).format("%Y-%m-%d").to_string());

        let a = analyze(&r, today());
        assert_eq!(a.conversion_rate, 0.5);
        assert_eq!(a.abandon_rate, 0.375);
        assert_eq!(a.profit, 500.0);
        assert!(a.close_to_expiry);
        assert!((a.performance_score - 0.5375).abs() < 1e-9);
        assert_eq!(a.cluster, Cluster::Moderate);
        assert_eq!(
            a.smart_suggestions,
            "Low stock: consider restocking soon | Close to expiry: increase discount to clear stock"
        );
        assert!((a.predicted_safe_discount - 0.2).abs() < 1e-9);
    }

    #[test]
    fn dead_stock_with_no_activity() {
        let a = analyze(&record(0.0, 0, 0, 0, 50, 0.0), today());
        assert_eq!(a.conversion_rate, 0.0);
        assert_eq!(a.abandon_rate, 0.0);
        assert_eq!(a.profit, 0.0);
        assert!(!a.close_to_expiry);
        assert!((a.performance_score - 0.3).abs() < 1e-12);
        assert_eq!(a.cluster, Cluster::Low);
        assert_eq!(
            a.smart_suggestions,
            "Improve product description and visibility | Low profit: review pricing or supplier costs"
        );
        assert_eq!(a.predicted_safe_discount, 0.0);
    }

    #[test]
    fn zero_denominators_normalize_to_zero() {
        let a = analyze(&record(10.0, 3, 0, 0, 20, 0.0), today());
        assert_eq!(a.conversion_rate, 0.0);
        assert_eq!(a.abandon_rate, 0.0);
    }

    #[test]
    fn abandon_rate_can_go_negative() {
        let a = analyze(&record(10.0, 10, 20, 5, 20, 0.0), today());
        assert_eq!(a.abandon_rate, -1.0);
    }

    #[test]
    fn profit_is_exactly_price_times_sales() {
        let a = analyze(&record(19.5, 7, 100, 10, 20, 0.0), today());
        assert_eq!(a.profit, 19.5 * 7.0);
    }

    #[test]
    fn analyze_is_idempotent() {
        let r = record(42.0, 3, 9, 4, 12, 0.05);
        let a = analyze(&r, today());
        let b = analyze(&r, today());
        assert_eq!(a.performance_score, b.performance_score);
        assert_eq!(a.cluster, b.cluster);
        assert_eq!(a.smart_suggestions, b.smart_suggestions);
        assert_eq!(a.predicted_safe_discount, b.predicted_safe_discount);
    }

    #[test]
    fn tier_boundaries_are_exclusive_on_the_high_side() {
        assert_eq!(classify(0.71), Cluster::High);
        assert_eq!(classify(0.7), Cluster::Moderate);
        assert_eq!(classify(0.31), Cluster::Moderate);
        assert_eq!(classify(0.3), Cluster::Low);
        assert_eq!(classify(0.0), Cluster::Low);
        assert_eq!(classify(-5.0), Cluster::Low);
        assert_eq!(classify(1e6), Cluster::High);
    }

    #[test]
    fn quiet_product_needs_no_action() {
        // High conversion, low abandonment, healthy stock and profit.
        let a = analyze(&record(100.0, 8, 10, 9, 40, 0.0), today());
        assert_eq!(a.smart_suggestions, "No immediate action needed");
    }

    #[test]
    fn safe_discount_is_capped_at_eighty_percent() {
        let a = analyze(&record(100.0, 5, 10, 8, 40, 0.75), today());
        assert!((a.predicted_safe_discount - 0.8).abs() < 1e-9);
    }

    #[test]
    fn safe_discount_falls_back_to_zero_without_revenue() {
        assert_eq!(analyze(&record(0.0, 5, 10, 8, 40, 0.3), today()).predicted_safe_discount, 0.0);
        assert_eq!(analyze(&record(9.0, 0, 10, 8, 40, 0.3), today()).predicted_safe_discount, 0.0);
    }

    #[test]
    fn expiry_horizon_is_thirty_days_inclusive() {
        let mut r = record(10.0, 1, 10, 2, 20, 0.0);

        r.expiry_date = Some((today() + Duration::days(30)).format("%Y-%m-%d").to_string());
        assert!(analyze(&r, today()).close_to_expiry);

        r.expiry_date = Some((today() + Duration::days(31)).format("%Y-%m-%d").to_string());
        assert!(!analyze(&r, today()).close_to_expiry);

        // Already past its date still counts as near expiry.
        r.expiry_date = Some((today() - Duration::days(3)).format("%Y-%m-%d").to_string());
        assert!(analyze(&r, today()).close_to_expiry);
    }

    #[test]
    fn unparsable_expiry_is_not_near_expiry() {
        let mut r = record(10.0, 1, 10, 2, 20, 0.0);
        r.expiry_date = Some("next tuesday".to_string());
        assert!(!analyze(&r, today()).close_to_expiry);
    }

    #[test]
    fn analyze_all_preserves_input_order() {
        let records = vec![
            record(1.0, 1, 1, 1, 1, 0.0),
            record(2.0, 2, 2, 2, 2, 0.0),
            record(3.0, 3, 3, 3, 3, 0.0),
        ];
        let analyzed = analyze_all(&records, today());
        assert_eq!(analyzed.len(), 3);
        for (a, r) in analyzed.iter().zip(&records) {
            assert_eq!(a.record.price, r.price);
        }
    }

    #[test]
    fn filter_matches_name_and_category_case_insensitively() {
        let mut veg = record(5.0, 1, 10, 2, 20, 0.0);
        veg.name = "Tomato".to_string();
        veg.category = "Vegetables".to_string();
        let rows = analyze_all(&[record(5.0, 1, 10, 2, 20, 0.0), veg], today());

        assert_eq!(filter_products(&rows, "", None).len(), 2);
        assert_eq!(filter_products(&rows, "TOMATO", None).len(), 1);
        assert_eq!(filter_products(&rows, "vegetab", None).len(), 1);
        assert_eq!(filter_products(&rows, "grocery", None).len(), 1);
        assert!(filter_products(&rows, "no such thing", None).is_empty());
    }

    #[test]
    fn filter_predicates_commute() {
        let mut records = Vec::new();
        for i in 0..12 {
            let mut r = record(i as f64 * 30.0, i, 10, 5, 20, 0.0);
            r.name = if i % 2 == 0 {
                format!("Rice {i}")
            } else {
                format!("Lentils {i}")
            };
            records.push(r);
        }
        let rows = analyze_all(&records, today());

        let search_then_cluster = filter_products(
            &filter_products(&rows, "rice", None),
            "",
            Some(Cluster::Low),
        );
        let cluster_then_search = filter_products(
            &filter_products(&rows, "", Some(Cluster::Low)),
            "rice",
            None,
        );

        let ids = |v: &[AnalyzedProduct]| {
            v.iter().map(|p| p.record.name.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&search_then_cluster), ids(&cluster_then_search));
    }
}
