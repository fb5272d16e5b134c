//! Analysis Store — append-only persistence of completed analyses.
//! No update or delete is exposed; records are immutable once written.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{AnalysisRow, CandidateResult};

/// Everything needed to persist one completed analysis. Id and timestamp
/// are assigned by `save`.
#[derive(Debug)]
pub struct NewAnalysis {
    pub user_id: Uuid,
    pub job_description_filename: String,
    pub resume_filenames: Vec<String>,
    pub total_resumes: i32,
    pub candidates: Vec<CandidateResult>,
    pub no_match: bool,
    pub skipped_files: Vec<String>,
}

/// Persists a record, assigning a generated id and timestamp.
pub async fn save(pool: &PgPool, new: NewAnalysis) -> Result<AnalysisRow, AppError> {
    let row = sqlx::query_as::<_, AnalysisRow>(
        r#"
        INSERT INTO analyses
            (id, user_id, job_description_filename, resume_filenames,
             total_resumes, candidates, no_match, skipped_files, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.user_id)
    .bind(&new.job_description_filename)
    .bind(&new.resume_filenames)
    .bind(new.total_resumes)
    .bind(Json(&new.candidates))
    .bind(new.no_match)
    .bind(&new.skipped_files)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Returns all analyses owned by a user, newest first.
pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<AnalysisRow>, AppError> {
    let rows = sqlx::query_as::<_, AnalysisRow>(
        "SELECT * FROM analyses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init_schema};
    use chrono::Utc;

    fn sample_candidates() -> Vec<CandidateResult> {
        vec![CandidateResult {
            rank: 1,
            name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: None,
            score: 88,
            reasons: vec!["Strong Rust background".to_string()],
        }]
    }

    // Round-trip against a real database. Run with:
    //   DATABASE_URL=postgres://... cargo test -- --ignored
    #[tokio::test]
    #[ignore = "requires a live PostgreSQL via DATABASE_URL"]
    async fn test_save_then_list_round_trip() {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let pool = create_pool(&database_url).await.unwrap();
        init_schema(&pool).await.unwrap();

        let user_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO users (id, email, full_name, password_hash, is_active, created_at)
             VALUES ($1, $2, 'Store Test', 'x', TRUE, $3)",
        )
        .bind(user_id)
        .bind(format!("store-test-{user_id}@example.com"))
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        assert!(list_by_user(&pool, user_id).await.unwrap().is_empty());

        let first = save(
            &pool,
            NewAnalysis {
                user_id,
                job_description_filename: "jd.pdf".to_string(),
                resume_filenames: vec!["a.pdf".to_string()],
                total_resumes: 5,
                candidates: sample_candidates(),
                no_match: false,
                skipped_files: vec![],
            },
        )
        .await
        .unwrap();

        let second = save(
            &pool,
            NewAnalysis {
                user_id,
                job_description_filename: "jd2.pdf".to_string(),
                resume_filenames: vec!["b.pdf".to_string()],
                total_resumes: 6,
                candidates: vec![],
                no_match: true,
                skipped_files: vec!["broken.doc".to_string()],
            },
        )
        .await
        .unwrap();

        let listed = list_by_user(&pool, user_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        // Newest first
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
        // Candidate data survives the JSONB round trip intact
        assert_eq!(listed[1].candidates.0, sample_candidates());
        assert_eq!(listed[0].skipped_files, vec!["broken.doc".to_string()]);
    }
}
