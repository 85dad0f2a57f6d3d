//! SQLite schema definition.

/// Complete database schema for the medicine catalog.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Medicine Catalog
-- ============================================================================

CREATE TABLE IF NOT EXISTS medicines (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    price REAL,
    is_discontinued INTEGER NOT NULL DEFAULT 0,
    manufacturer_name TEXT,
    type TEXT,
    pack_size_label TEXT,
    short_composition1 TEXT,
    short_composition2 TEXT,
    salt_composition TEXT,
    medicine_desc TEXT,
    side_effects TEXT,
    drug_interactions TEXT,                       -- JSON value, as imported

    -- Search projections, written by the store on every insert/update
    name_lc TEXT NOT NULL,
    manufacturer_name_lc TEXT,
    type_lc TEXT,

    imported_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_medicines_name_lc ON medicines(name_lc);
CREATE INDEX IF NOT EXISTS idx_medicines_manufacturer_lc ON medicines(manufacturer_name_lc);
CREATE INDEX IF NOT EXISTS idx_medicines_type_lc ON medicines(type_lc);
CREATE INDEX IF NOT EXISTS idx_medicines_composition1 ON medicines(short_composition1);
CREATE INDEX IF NOT EXISTS idx_medicines_composition2 ON medicines(short_composition2);
CREATE INDEX IF NOT EXISTS idx_medicines_salt ON medicines(salt_composition);
CREATE INDEX IF NOT EXISTS idx_medicines_name_manufacturer ON medicines(name, manufacturer_name);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO medicines (id, name, name_lc) VALUES (1, '   ', '   ')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO medicines (id, name, name_lc) VALUES (1, 'Dolo 650', 'dolo 650')",
            [],
        );
        assert!(result.is_ok());
    }
}
