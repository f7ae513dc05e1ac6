use serde_json::json;
use std::env;
use uuid::Uuid;

use lead_api::db::Database;
use lead_api::db_storage::PgLeadStore;
use lead_api::errors::AppError;
use lead_api::models::Lead;
use lead_api::store::LeadStore;

/// Integration smoke test for the Postgres lead store.
/// Marked ignored to avoid running against production by accident; set TEST_DATABASE_URL to run.
#[tokio::test]
#[ignore]
async fn pg_lead_store_smoke_test() -> anyhow::Result<()> {
    let db_url = env::var("TEST_DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("Set TEST_DATABASE_URL to run this test"))?;

    let db = Database::new(&db_url, 2).await?;
    db.migrate().await?;
    let store = PgLeadStore::new(db.pool.clone());

    // Use a unique email to avoid conflicts on repeated runs.
    let email = format!("smoke-{}@example.com", Uuid::new_v4());
    let data = json!({"name": "Smoke", "surname": "Test", "cpf": "00000000000", "email": email});
    let data = data.as_object().cloned().unwrap_or_default();

    let lead = store.create(Lead::new(data.clone())).await?;
    assert_eq!(store.count_active_by_email(&email).await?, 1);

    let duplicate = store.create(Lead::new(data.clone())).await;
    assert!(matches!(duplicate, Err(AppError::EmailAlreadyExists(_))));

    // A primary key clash is not an email conflict.
    let mut same_id = Lead::new(data);
    same_id.id = lead.id;
    same_id
        .data
        .insert("email".to_string(), json!(format!("other-{}", email)));
    let clash = store.create(same_id).await;
    assert!(matches!(clash, Err(AppError::DatabaseError(_))));

    let mut changed = store
        .find_by_id(lead.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("lead vanished"))?;
    changed.data.insert("occupation".to_string(), json!("Engineer"));
    let saved = store.save(changed).await?;
    assert_eq!(saved.data.get("occupation"), Some(&json!("Engineer")));

    let incoming = json!({"occupation": "Nurse", "monthly_income": 5000});
    let incoming = incoming.as_object().cloned().unwrap_or_default();
    let merged = store
        .merge_data(lead.id, &incoming)
        .await?
        .ok_or_else(|| anyhow::anyhow!("lead vanished"))?;
    assert_eq!(merged.data.get("occupation"), Some(&json!("Engineer")));
    assert_eq!(merged.data.get("monthly_income"), Some(&json!(5000)));

    assert!(store.soft_delete(lead.id).await?);
    assert!(store.merge_data(lead.id, &incoming).await?.is_none());
    assert!(store.find_by_id(lead.id).await?.is_none());
    assert_eq!(store.count_active_by_email(&email).await?, 0);

    Ok(())
}
