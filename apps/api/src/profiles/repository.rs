use sqlx::{PgPool, Postgres, Transaction};

use crate::models::profile::{CandidateProfile, CandidateProfileRow, CandidateSkill, Education, Experience, Skill};
use crate::profiles::payload::{EducationInput, ExperienceInput, ProfilePayload, SkillInput};

const PROFILE_COLUMNS: &str = "id, user_id, phone_number, address, date_of_birth, gender, bio, \
                               linkedin_url, github_url, portfolio_url, is_complete, created_at, updated_at";

pub async fn find_row(db: &PgPool, user_id: i64) -> Result<Option<CandidateProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM candidate_profiles WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
}

/// The profile with its skills, experiences and educations, if the user has one.
pub async fn find_for_user(db: &PgPool, user_id: i64) -> Result<Option<CandidateProfile>, sqlx::Error> {
    let Some(profile) = find_row(db, user_id).await? else {
        return Ok(None);
    };

    let skills = sqlx::query_as::<_, CandidateSkill>(
        r#"
        SELECT s.id AS skill_id, s.name, s.category, cs.level
        FROM candidate_skills cs
        JOIN skills s ON s.id = cs.skill_id
        WHERE cs.candidate_profile_id = $1
        ORDER BY s.name
        "#,
    )
    .bind(profile.id)
    .fetch_all(db)
    .await?;

    let experiences = sqlx::query_as::<_, Experience>(
        r#"
        SELECT id, company_name, position, description, start_date, end_date, is_current
        FROM experiences
        WHERE candidate_profile_id = $1
        ORDER BY position_index
        "#,
    )
    .bind(profile.id)
    .fetch_all(db)
    .await?;

    let educations = sqlx::query_as::<_, Education>(
        r#"
        SELECT id, institution, degree, field_of_study, start_date, end_date, gpa, description
        FROM educations
        WHERE candidate_profile_id = $1
        ORDER BY position_index
        "#,
    )
    .bind(profile.id)
    .fetch_all(db)
    .await?;

    Ok(Some(CandidateProfile {
        profile,
        skills,
        experiences,
        educations,
    }))
}

/// Ids from `ids` with no row in the skill catalogue.
pub async fn unknown_skill_ids(db: &PgPool, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let known: Vec<i64> = sqlx::query_scalar("SELECT id FROM skills WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await?;
    Ok(ids.iter().copied().filter(|id| !known.contains(id)).collect())
}

pub async fn skills(
    db: &PgPool,
    search: Option<&str>,
    category: Option<&str>,
    limit: Option<i64>,
) -> Result<Vec<Skill>, sqlx::Error> {
    sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, name, category
        FROM skills
        WHERE ($1::TEXT IS NULL OR name ILIKE '%' || $1 || '%')
          AND ($2::TEXT IS NULL OR category = $2)
        ORDER BY name
        LIMIT $3
        "#,
    )
    .bind(search)
    .bind(category)
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Creates or overwrites the profile, replacing whichever lists the payload carries.
pub async fn save(
    db: &PgPool,
    user_id: i64,
    payload: &ProfilePayload,
    mark_complete: bool,
) -> Result<i64, sqlx::Error> {
    let mut tx = db.begin().await?;

    let profile_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO candidate_profiles
            (user_id, phone_number, address, date_of_birth, gender, bio,
             linkedin_url, github_url, portfolio_url, is_complete)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (user_id) DO UPDATE SET
            phone_number = EXCLUDED.phone_number,
            address = EXCLUDED.address,
            date_of_birth = EXCLUDED.date_of_birth,
            gender = EXCLUDED.gender,
            bio = EXCLUDED.bio,
            linkedin_url = EXCLUDED.linkedin_url,
            github_url = EXCLUDED.github_url,
            portfolio_url = EXCLUDED.portfolio_url,
            is_complete = candidate_profiles.is_complete OR EXCLUDED.is_complete,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&payload.phone_number)
    .bind(&payload.address)
    .bind(payload.date_of_birth)
    .bind(payload.gender)
    .bind(&payload.bio)
    .bind(&payload.linkedin_url)
    .bind(&payload.github_url)
    .bind(&payload.portfolio_url)
    .bind(mark_complete)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(skills) = &payload.skills {
        replace_skills(&mut tx, profile_id, skills).await?;
    }
    if let Some(experiences) = &payload.experiences {
        replace_experiences(&mut tx, profile_id, experiences).await?;
    }
    if let Some(educations) = &payload.educations {
        replace_educations(&mut tx, profile_id, educations).await?;
    }

    tx.commit().await?;
    Ok(profile_id)
}

async fn replace_skills(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: i64,
    skills: &[SkillInput],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM candidate_skills WHERE candidate_profile_id = $1")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;
    for skill in skills {
        sqlx::query(
            r#"
            INSERT INTO candidate_skills (candidate_profile_id, skill_id, level)
            VALUES ($1, $2, $3)
            ON CONFLICT (candidate_profile_id, skill_id) DO UPDATE SET level = EXCLUDED.level
            "#,
        )
        .bind(profile_id)
        .bind(skill.id)
        .bind(skill.level.unwrap_or_default())
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn replace_experiences(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: i64,
    experiences: &[ExperienceInput],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM experiences WHERE candidate_profile_id = $1")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;
    for (index, exp) in experiences.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO experiences
                (candidate_profile_id, position_index, company_name, position,
                 description, start_date, end_date, is_current)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(profile_id)
        .bind(index as i32)
        .bind(&exp.company_name)
        .bind(&exp.position)
        .bind(&exp.description)
        .bind(exp.start_date)
        .bind(exp.end_date)
        .bind(exp.is_current)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn replace_educations(
    tx: &mut Transaction<'_, Postgres>,
    profile_id: i64,
    educations: &[EducationInput],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM educations WHERE candidate_profile_id = $1")
        .bind(profile_id)
        .execute(&mut **tx)
        .await?;
    for (index, edu) in educations.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO educations
                (candidate_profile_id, position_index, institution, degree,
                 field_of_study, start_date, end_date, gpa, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(profile_id)
        .bind(index as i32)
        .bind(&edu.institution)
        .bind(&edu.degree)
        .bind(&edu.field_of_study)
        .bind(edu.start_date)
        .bind(edu.end_date)
        .bind(edu.gpa)
        .bind(&edu.description)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
