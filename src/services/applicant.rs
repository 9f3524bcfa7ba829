use crate::db::applicants::{self, ApplicantData};
use crate::domain::account_forms::BasicApplicantForm;
use crate::domain::models::BasicApplicantRow;
use crate::domain::validation::DATE_FORMAT;
use crate::error::AppResult;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Decrypted view of the onboarding record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicApplicantData {
    pub first_name: String,
    pub last_name: String,
    /// `DD/MM/YYYY`, as entered.
    pub date_of_birth: String,
    pub nationality: String,
    pub passport_number: String,
    pub phone: String,
    pub updated_at: DateTime<Utc>,
}

impl BasicApplicantData {
    fn from_row(state: &AppState, row: BasicApplicantRow) -> AppResult<Self> {
        Ok(Self {
            passport_number: state.crypto.decrypt_str(&row.enc_passport_number)?,
            date_of_birth: row.date_of_birth.format(DATE_FORMAT).to_string(),
            first_name: row.first_name,
            last_name: row.last_name,
            nationality: row.nationality,
            phone: row.phone,
            updated_at: row.updated_at,
        })
    }
}

pub async fn save(
    state: &AppState,
    user_id: Uuid,
    form: BasicApplicantForm,
) -> AppResult<BasicApplicantData> {
    let date_of_birth = form.validate_at(Utc::now().date_naive())?;
    let enc_passport_number = state
        .crypto
        .encrypt_str(&form.passport_number.trim().to_uppercase())?;

    let row = applicants::upsert(
        state.db.pool(),
        user_id,
        ApplicantData {
            first_name: form.first_name.trim(),
            last_name: form.last_name.trim(),
            date_of_birth,
            nationality: form.nationality.trim(),
            enc_passport_number: &enc_passport_number,
            phone: form.phone.trim(),
        },
    )
    .await?;

    tracing::info!(%user_id, "Basic applicant data saved");
    BasicApplicantData::from_row(state, row)
}

pub async fn get(state: &AppState, user_id: Uuid) -> AppResult<Option<BasicApplicantData>> {
    applicants::find(state.db.pool(), user_id)
        .await?
        .map(|row| BasicApplicantData::from_row(state, row))
        .transpose()
}
