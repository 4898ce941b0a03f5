//! Integration tests for agent application persistence:
//! - Duplicate agent IDs rejected
//! - Lookup by external agent code
//! - Review decisions stamp reviewer and time

use chrono::NaiveDate;
use enroll_db::models::agent::CreateAgentApplication;
use enroll_db::repositories::AgentRepo;
use sqlx::PgPool;

fn new_agent(agent_id: &str) -> CreateAgentApplication {
    CreateAgentApplication {
        agent_id: agent_id.to_string(),
        applicant_role: "FO".to_string(),
        full_name: "Karim Ahmed".to_string(),
        email: "karim@example.com".to_string(),
        phone: "+8801712345678".to_string(),
        present_address: "House 12, Road 5, Dhaka".to_string(),
        permanent_address: "Village Rampur, Comilla".to_string(),
        dob: NaiveDate::from_ymd_opt(1992, 8, 20).unwrap(),
        nid_number: "1992123456789".to_string(),
        applicant_photo_path: "agents/photos/karim.jpg".to_string(),
        nid_document_path: "agents/nid/karim.pdf".to_string(),
        education_certificate_path: "agents/certificates/karim.pdf".to_string(),
        password_hash: "$argon2id$stub".to_string(),
        agree_terms: true,
        ..Default::default()
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_defaults_to_pending(pool: PgPool) {
    let created = AgentRepo::create(&pool, &new_agent("AG-1001")).await.unwrap();
    assert_eq!(created.status, "pending");
    assert_eq!(created.reviewed_by, "");
    assert!(created.reviewed_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_agent_id_rejected(pool: PgPool) {
    AgentRepo::create(&pool, &new_agent("AG-1001")).await.unwrap();

    let err = AgentRepo::create(&pool, &new_agent("AG-1001"))
        .await
        .unwrap_err();
    match err {
        sqlx::Error::Database(db) => {
            assert_eq!(db.constraint(), Some("uq_agent_applications_agent_id"));
        }
        other => panic!("expected database error, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lookup_by_agent_id(pool: PgPool) {
    let created = AgentRepo::create(&pool, &new_agent("AG-1001")).await.unwrap();

    let found = AgentRepo::find_by_agent_id(&pool, "AG-1001").await.unwrap();
    assert_eq!(found.map(|a| a.id), Some(created.id));

    let missing = AgentRepo::find_by_agent_id(&pool, "AG-9999").await.unwrap();
    assert!(missing.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_review_stamps_reviewer_and_time(pool: PgPool) {
    let created = AgentRepo::create(&pool, &new_agent("AG-1001")).await.unwrap();

    let reviewed = AgentRepo::review(&pool, created.id, "approved", "user:1", "ok")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reviewed.status, "approved");
    assert_eq!(reviewed.reviewed_by, "user:1");
    assert_eq!(reviewed.notes, "ok");
    assert!(reviewed.reviewed_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_filters_by_status(pool: PgPool) {
    let first = AgentRepo::create(&pool, &new_agent("AG-1001")).await.unwrap();
    let mut second = new_agent("AG-1002");
    second.email = "second@example.com".to_string();
    AgentRepo::create(&pool, &second).await.unwrap();

    AgentRepo::review(&pool, first.id, "approved", "user:1", "")
        .await
        .unwrap()
        .unwrap();

    let all = AgentRepo::list(&pool, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let pending = AgentRepo::list(&pool, Some("pending")).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].agent_id, "AG-1002");
}
