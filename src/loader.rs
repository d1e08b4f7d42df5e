use rusqlite::{Connection, Result};
use crate::model::{default_category, ProductRecord};

/// Full-table read of `products`. No pagination; the whole table is the
/// working set for one analysis pass.
pub fn load_products(db_path: &str) -> Result<Vec<ProductRecord>> {
    let conn = Connection::open(db_path)?;

    let mut stmt = conn.prepare(
        "SELECT productid, name, category, price, discount,
                stockcount, scannedcount, cartaddcount, salecount,
                salesvelocity, expirydate
         FROM products",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(ProductRecord {
            product_id: row.get(0)?,
            name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            category: row
                .get::<_, Option<String>>(2)?
                .unwrap_or_else(default_category),
            price: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            discount: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
            stock_count: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            scanned_count: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
            cart_add_count: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
            sale_count: row.get::<_, Option<i64>>(8)?.unwrap_or(0),
            sales_velocity: row.get::<_, Option<f64>>(9)?.unwrap_or(0.0),
            expiry_date: row.get(10)?,
        })
    })?;

    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// Bulk import from a JSON array of product records. Missing fields fall
/// back to the same defaults as the table read.
pub fn load_products_json(path: &str) -> std::io::Result<Vec<ProductRecord>> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_import_applies_defaults_and_aliases() {
        let dir = std::env::temp_dir().join("inventory_analyzer_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("products.json");
        std::fs::write(
            &path,
            r#"[{"productid":"P100","name":"Olive Oil","price":12.5,"salecount":4}]"#,
        )
        .unwrap();

        let records = load_products_json(path.to_str().unwrap()).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.product_id, "P100");
        assert_eq!(r.category, "Uncategorized");
        assert_eq!(r.price, 12.5);
        assert_eq!(r.sale_count, 4);
        assert_eq!(r.scanned_count, 0);
        assert!(r.expiry_date.is_none());
    }

    #[test]
    fn json_import_rejects_malformed_input() {
        let dir = std::env::temp_dir().join("inventory_analyzer_loader_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(load_products_json(path.to_str().unwrap()).is_err());
    }
}
