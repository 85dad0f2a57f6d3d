//! Medicine catalog database operations.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{Database, DbError, DbResult};
use crate::models::MedicineRecord;
use crate::store::{Condition, MedicineQuery, SortKey};

const COLUMNS: &str = "id, name, price, is_discontinued, manufacturer_name, type, \
    pack_size_label, short_composition1, short_composition2, salt_composition, \
    medicine_desc, side_effects, drug_interactions";

const UPSERT_SQL: &str = r#"
    INSERT INTO medicines (
        id, name, price, is_discontinued, manufacturer_name, type,
        pack_size_label, short_composition1, short_composition2, salt_composition,
        medicine_desc, side_effects, drug_interactions,
        name_lc, manufacturer_name_lc, type_lc, imported_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, datetime('now'))
    ON CONFLICT(id) DO UPDATE SET
        name = excluded.name,
        price = excluded.price,
        is_discontinued = excluded.is_discontinued,
        manufacturer_name = excluded.manufacturer_name,
        type = excluded.type,
        pack_size_label = excluded.pack_size_label,
        short_composition1 = excluded.short_composition1,
        short_composition2 = excluded.short_composition2,
        salt_composition = excluded.salt_composition,
        medicine_desc = excluded.medicine_desc,
        side_effects = excluded.side_effects,
        drug_interactions = excluded.drug_interactions,
        name_lc = excluded.name_lc,
        manufacturer_name_lc = excluded.manufacturer_name_lc,
        type_lc = excluded.type_lc,
        imported_at = datetime('now')
"#;

impl Database {
    /// Insert or update a medicine. Search projections are derived here.
    pub fn upsert_medicine(&self, record: &MedicineRecord) -> DbResult<()> {
        upsert(&self.conn, record)
    }

    /// Get a medicine by catalog id.
    pub fn get_medicine(&self, id: i64) -> DbResult<Option<MedicineRecord>> {
        let sql = format!("SELECT {} FROM medicines WHERE id = ?", COLUMNS);
        let row = self
            .conn
            .query_row(&sql, [id], MedicineRow::from_row)
            .optional()?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Run a structured query.
    pub fn query_medicines(&self, query: &MedicineQuery) -> DbResult<Vec<MedicineRecord>> {
        let (sql, values) = build_select(query);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), MedicineRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }

    /// Number of medicines in the catalog.
    pub fn count_medicines(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM medicines", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Delete everything and insert `records` in a single transaction.
    pub fn replace_catalog(&mut self, records: &[MedicineRecord]) -> DbResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM medicines", [])?;
        for record in records {
            upsert(&tx, record)?;
        }
        tx.commit()?;
        Ok(records.len())
    }
}

fn upsert(conn: &rusqlite::Connection, record: &MedicineRecord) -> DbResult<()> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(DbError::Constraint(format!(
            "medicine {} has an empty name",
            record.id
        )));
    }

    let interactions = record
        .drug_interactions
        .as_ref()
        .map(|v| serde_json::to_string(v))
        .transpose()?;

    conn.execute(
        UPSERT_SQL,
        params![
            record.id,
            name,
            record.price,
            record.is_discontinued,
            record.manufacturer_name,
            record.dosage_form,
            record.pack_size_label,
            record.short_composition1,
            record.short_composition2,
            record.salt_composition,
            record.description,
            record.side_effects,
            interactions,
            name.to_lowercase(),
            record.manufacturer_name.as_deref().map(str::to_lowercase),
            record.dosage_form.as_deref().map(str::to_lowercase),
        ],
    )?;
    Ok(())
}

/// Build the SELECT for a query along with its positional parameters.
fn build_select(query: &MedicineQuery) -> (String, Vec<Value>) {
    let mut values = Vec::new();
    let mut clauses: Vec<String> = query
        .conditions
        .iter()
        .map(|c| condition_sql(c, &mut values))
        .collect();

    if !query.any_of.is_empty() {
        let any: Vec<String> = query
            .any_of
            .iter()
            .map(|c| condition_sql(c, &mut values))
            .collect();
        clauses.push(format!("({})", any.join(" OR ")));
    }

    let mut sql = format!("SELECT {} FROM medicines", COLUMNS);
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }

    sql.push_str(match query.sort {
        SortKey::Id => " ORDER BY id",
        SortKey::Name => " ORDER BY name_lc, id",
        SortKey::PriceAsc => " ORDER BY price IS NULL, price, id",
    });

    // SQLite treats a negative LIMIT as unbounded
    let limit = query.limit.map(|l| l as i64).unwrap_or(-1);
    sql.push_str(" LIMIT ? OFFSET ?");
    values.push(Value::Integer(limit));
    values.push(Value::Integer(query.offset as i64));

    (sql, values)
}

fn condition_sql(condition: &Condition, values: &mut Vec<Value>) -> String {
    match condition {
        Condition::Matches { field, pattern } => {
            values.push(Value::Text(format!("(?i){}", pattern)));
            format!("regexp(?, {})", field.search_column())
        }
        Condition::Equals { field, value } => {
            values.push(Value::Text(value.clone()));
            format!("{} = ?", field.column())
        }
        Condition::NotEquals { field, value: Some(value) } => {
            values.push(Value::Text(value.clone()));
            format!("({col} IS NULL OR {col} != ?)", col = field.column())
        }
        Condition::NotEquals { field, value: None } => {
            format!("{} IS NOT NULL", field.column())
        }
        Condition::IdNot(id) => {
            values.push(Value::Integer(*id));
            "id != ?".to_string()
        }
        Condition::Discontinued(flag) => {
            values.push(Value::Integer(i64::from(*flag)));
            "is_discontinued = ?".to_string()
        }
    }
}

/// Intermediate row struct for database mapping.
struct MedicineRow {
    id: i64,
    name: String,
    price: Option<f64>,
    is_discontinued: bool,
    manufacturer_name: Option<String>,
    dosage_form: Option<String>,
    pack_size_label: Option<String>,
    short_composition1: Option<String>,
    short_composition2: Option<String>,
    salt_composition: Option<String>,
    description: Option<String>,
    side_effects: Option<String>,
    drug_interactions: Option<String>,
}

impl MedicineRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            price: row.get(2)?,
            is_discontinued: row.get(3)?,
            manufacturer_name: row.get(4)?,
            dosage_form: row.get(5)?,
            pack_size_label: row.get(6)?,
            short_composition1: row.get(7)?,
            short_composition2: row.get(8)?,
            salt_composition: row.get(9)?,
            description: row.get(10)?,
            side_effects: row.get(11)?,
            drug_interactions: row.get(12)?,
        })
    }
}

impl TryFrom<MedicineRow> for MedicineRecord {
    type Error = DbError;

    fn try_from(row: MedicineRow) -> Result<Self, Self::Error> {
        Ok(MedicineRecord {
            id: row.id,
            name: row.name,
            price: row.price,
            is_discontinued: row.is_discontinued,
            manufacturer_name: row.manufacturer_name,
            dosage_form: row.dosage_form,
            pack_size_label: row.pack_size_label,
            short_composition1: row.short_composition1,
            short_composition2: row.short_composition2,
            salt_composition: row.salt_composition,
            description: row.description,
            side_effects: row.side_effects,
            drug_interactions: row
                .drug_interactions
                .map(|s| serde_json::from_str(&s))
                .transpose()?,
        })
    }
}
