use crate::domain::models::BasicApplicantRow;
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

pub struct ApplicantData<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub date_of_birth: NaiveDate,
    pub nationality: &'a str,
    pub enc_passport_number: &'a str,
    pub phone: &'a str,
}

pub async fn upsert<'e, E>(
    exec: E,
    user_id: Uuid,
    data: ApplicantData<'_>,
) -> Result<BasicApplicantRow, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, BasicApplicantRow>(
        r#"
        INSERT INTO basic_applicant_data
            (user_id, first_name, last_name, date_of_birth, nationality, enc_passport_number, phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (user_id) DO UPDATE
        SET first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            date_of_birth = EXCLUDED.date_of_birth,
            nationality = EXCLUDED.nationality,
            enc_passport_number = EXCLUDED.enc_passport_number,
            phone = EXCLUDED.phone,
            updated_at = NOW()
        RETURNING user_id, first_name, last_name, date_of_birth, nationality,
                  enc_passport_number, phone, updated_at
        "#,
    )
    .bind(user_id)
    .bind(data.first_name)
    .bind(data.last_name)
    .bind(data.date_of_birth)
    .bind(data.nationality)
    .bind(data.enc_passport_number)
    .bind(data.phone)
    .fetch_one(exec)
    .await
}

pub async fn find<'e, E>(exec: E, user_id: Uuid) -> Result<Option<BasicApplicantRow>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, BasicApplicantRow>(
        r#"
        SELECT user_id, first_name, last_name, date_of_birth, nationality,
               enc_passport_number, phone, updated_at
        FROM basic_applicant_data
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(exec)
    .await
}
