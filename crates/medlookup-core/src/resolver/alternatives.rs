//! Same-composition alternatives.

use crate::models::{non_blank, MedicineRecord};
use crate::store::{Condition, Field, MedicineQuery, MedicineStore, SortKey, StoreResult};

/// Medicines sharing the primary's composition, from other manufacturers.
///
/// Matches `short_composition1` against either composition column, or
/// `salt_composition` exactly. Discontinued items and the primary itself are
/// excluded. Cheapest first, records without a price last.
pub async fn find_alternatives(
    store: &dyn MedicineStore,
    primary: &MedicineRecord,
    limit: usize,
) -> StoreResult<Vec<MedicineRecord>> {
    let mut query = MedicineQuery::new();

    if let Some(composition) = non_blank(&primary.short_composition1) {
        query = query
            .or(Condition::equals(Field::ShortComposition1, composition))
            .or(Condition::equals(Field::ShortComposition2, composition));
    }
    if let Some(salt) = non_blank(&primary.salt_composition) {
        query = query.or(Condition::equals(Field::SaltComposition, salt));
    }
    if query.any_of.is_empty() {
        return Ok(Vec::new());
    }

    let query = query
        .and(Condition::NotEquals {
            field: Field::Manufacturer,
            value: primary.manufacturer_name.clone(),
        })
        .and(Condition::Discontinued(false))
        .and(Condition::IdNot(primary.id))
        .sort_by(SortKey::PriceAsc)
        .limit(limit);

    let mut alternatives = store.find(&query).await?;
    alternatives.retain(|m| m.id != primary.id);
    Ok(alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteMedicineStore;

    fn medicine(
        id: i64,
        name: &str,
        manufacturer: &str,
        composition: &str,
        price: Option<f64>,
    ) -> MedicineRecord {
        let mut r = MedicineRecord::new(id, name);
        r.manufacturer_name = Some(manufacturer.into());
        r.short_composition1 = Some(composition.into());
        r.price = price;
        r
    }

    async fn store_with(records: Vec<MedicineRecord>) -> SqliteMedicineStore {
        let store = SqliteMedicineStore::open_in_memory().unwrap();
        store.replace_catalog(records).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_exclusions_and_order() {
        let primary = medicine(1, "Azithral 500", "Alembic", "Azithromycin (500mg)", Some(120.0));

        let mut discontinued = medicine(4, "Azee 500", "Cipla", "Azithromycin (500mg)", Some(5.0));
        discontinued.is_discontinued = true;

        let store = store_with(vec![
            primary.clone(),
            medicine(2, "Azithral XL", "Alembic", "Azithromycin (500mg)", Some(90.0)),
            medicine(3, "Zithrox 500", "Macleods", "Azithromycin (500mg)", Some(80.0)),
            discontinued,
            medicine(5, "Aziwok 500", "Wockhardt", "Azithromycin (500mg)", None),
            medicine(6, "Azibact 500", "Ipca", "Azithromycin (500mg)", Some(60.0)),
            medicine(7, "Dolo 650", "Micro Labs", "Paracetamol (650mg)", Some(30.0)),
        ])
        .await;

        let alternatives = find_alternatives(&store, &primary, 5).await.unwrap();
        let ids: Vec<i64> = alternatives.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![6, 3, 5]);
    }

    #[tokio::test]
    async fn test_secondary_composition_and_salt() {
        let mut primary = medicine(1, "Combiflam", "Sanofi", "Ibuprofen (400mg)", Some(40.0));
        primary.salt_composition = Some("Ibuprofen + Paracetamol".into());

        let mut second = MedicineRecord::new(2, "Ibugesic Plus");
        second.manufacturer_name = Some("Cipla".into());
        second.short_composition1 = Some("Paracetamol (325mg)".into());
        second.short_composition2 = Some("Ibuprofen (400mg)".into());
        second.price = Some(25.0);

        let mut salt = MedicineRecord::new(3, "Flexon");
        salt.manufacturer_name = Some("Aristo".into());
        salt.salt_composition = Some("Ibuprofen + Paracetamol".into());
        salt.price = Some(30.0);

        let store = store_with(vec![primary.clone(), second, salt]).await;
        let ids: Vec<i64> = find_alternatives(&store, &primary, 5)
            .await
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_capped_at_limit() {
        let primary = medicine(1, "Pan 40", "Alkem", "Pantoprazole (40mg)", Some(100.0));
        let mut records = vec![primary.clone()];
        for id in 2..=10 {
            records.push(medicine(
                id,
                &format!("Panto {}", id),
                &format!("Maker {}", id),
                "Pantoprazole (40mg)",
                Some(id as f64),
            ));
        }
        let store = store_with(records).await;

        let alternatives = find_alternatives(&store, &primary, 5).await.unwrap();
        assert_eq!(alternatives.len(), 5);
        assert!(alternatives.iter().all(|m| m.id != 1));
    }

    #[tokio::test]
    async fn test_no_composition_means_no_alternatives() {
        let primary = MedicineRecord::new(1, "Mystery Tonic");
        let store = store_with(vec![primary.clone(), MedicineRecord::new(2, "Other")]).await;
        assert!(find_alternatives(&store, &primary, 5).await.unwrap().is_empty());
    }
}
