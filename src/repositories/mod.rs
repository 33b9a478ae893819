// src/repositories/mod.rs
//! SQLite access for medicines.

use sqlx::SqlitePool;
use crate::error::{ApiError, ApiResult};
use crate::models::{Medicine, NewMedicine};

pub struct MedicineRepository;

impl MedicineRepository {
    /// All medicines ordered by id, optionally narrowed to names containing `search`
    /// (case-insensitive).
    pub async fn list(pool: &SqlitePool, search: Option<&str>) -> ApiResult<Vec<Medicine>> {
        let medicines = match search {
            Some(term) => {
                sqlx::query_as::<_, Medicine>(
                    r"SELECT id, name, quantity, price FROM medicines
                      WHERE name LIKE ? ESCAPE '\' ORDER BY id",
                )
                    .bind(like_pattern(term))
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Medicine>("SELECT id, name, quantity, price FROM medicines ORDER BY id")
                    .fetch_all(pool)
                    .await?
            }
        };

        Ok(medicines)
    }

    pub async fn get_by_id(pool: &SqlitePool, id: i64) -> ApiResult<Option<Medicine>> {
        let medicine = sqlx::query_as::<_, Medicine>("SELECT id, name, quantity, price FROM medicines WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(medicine)
    }

    pub async fn create(pool: &SqlitePool, data: &NewMedicine) -> ApiResult<Medicine> {
        if Self::get_by_id(pool, data.id).await?.is_some() {
            return Err(ApiError::medicine_already_exists());
        }

        let result = sqlx::query("INSERT INTO medicines (id, name, quantity, price) VALUES (?, ?, ?, ?)")
            .bind(data.id)
            .bind(&data.name)
            .bind(data.quantity)
            .bind(data.price)
            .execute(pool)
            .await;

        match result {
            Ok(_) => Ok(Medicine::from(data.clone())),
            // lost a race with a concurrent insert of the same id
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(ApiError::medicine_already_exists())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn delete(pool: &SqlitePool, id: i64) -> ApiResult<()> {
        let result = sqlx::query("DELETE FROM medicines WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::medicine_not_found());
        }

        Ok(())
    }

    pub async fn update_quantity(pool: &SqlitePool, id: i64, quantity: i64) -> ApiResult<()> {
        let result = sqlx::query("UPDATE medicines SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::medicine_not_found());
        }

        Ok(())
    }
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::run_migrations;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn new_medicine(id: i64, name: &str, quantity: i64) -> NewMedicine {
        NewMedicine {
            id,
            name: name.to_string(),
            quantity,
            price: 10.0,
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("para"), "%para%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let pool = setup().await;
        MedicineRepository::create(&pool, &new_medicine(2, "Paracetamol", 100)).await.unwrap();
        MedicineRepository::create(&pool, &new_medicine(1, "Ibuprofen", 10)).await.unwrap();
        MedicineRepository::create(&pool, &new_medicine(3, "PARAFFIN oil", 5)).await.unwrap();

        let all = MedicineRepository::list(&pool, None).await.unwrap();
        assert_eq!(all.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let para = MedicineRepository::list(&pool, Some("para")).await.unwrap();
        assert_eq!(para.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 3]);

        let none = MedicineRepository::list(&pool, Some("100%")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_id() {
        let pool = setup().await;
        MedicineRepository::create(&pool, &new_medicine(1, "Paracetamol", 100)).await.unwrap();

        let err = MedicineRepository::create(&pool, &new_medicine(1, "Aspirin", 1)).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
        assert_eq!(err.detail(), "Medicine with this ID already exists");
    }

    #[tokio::test]
    async fn test_delete_and_update_report_missing_ids() {
        let pool = setup().await;
        MedicineRepository::create(&pool, &new_medicine(1, "Paracetamol", 100)).await.unwrap();

        MedicineRepository::update_quantity(&pool, 1, 10).await.unwrap();
        let updated = MedicineRepository::get_by_id(&pool, 1).await.unwrap().unwrap();
        assert_eq!(updated.quantity, 10);

        assert!(matches!(
            MedicineRepository::update_quantity(&pool, 99, 10).await,
            Err(ApiError::NotFound(_))
        ));

        MedicineRepository::delete(&pool, 1).await.unwrap();
        assert!(matches!(MedicineRepository::delete(&pool, 1).await, Err(ApiError::NotFound(_))));
    }
}
