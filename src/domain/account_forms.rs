use crate::domain::validation::{
    check_date_of_birth, is_valid_email, is_valid_passport_number, is_valid_phone, Validate,
    ValidationErrors,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.trim().is_empty() {
        errors.push("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.push("email", "Invalid email address");
    }
}

fn check_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    if password.chars().count() < 8 {
        errors.push(field, "Password must be at least 8 characters");
    } else if password.chars().count() > 128 {
        errors.push(field, "Password must be at most 128 characters");
    } else if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push(field, "Password must contain an uppercase letter");
    } else if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push(field, "Password must contain a lowercase letter");
    } else if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push(field, "Password must contain a number");
    }
}

fn check_confirmation(errors: &mut ValidationErrors, password: &str, confirm: &str) {
    if password != confirm {
        errors.push("confirmPassword", PASSWORDS_DO_NOT_MATCH);
    }
}

fn check_name(errors: &mut ValidationErrors, field: &str, label: &str, value: &str) {
    let len = value.trim().chars().count();
    if len < 2 {
        errors.push(field, format!("{} must be at least 2 characters", label));
    } else if len > 100 {
        errors.push(field, format!("{} must be at most 100 characters", label));
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: String,
}

impl Validate for SignUpForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        check_password(&mut errors, "password", &self.password);
        check_confirmation(&mut errors, &self.password, &self.confirm_password);
        check_name(&mut errors, "name", "Name", &self.name);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSignUpForm {
    #[serde(flatten)]
    pub account: SignUpForm,
    pub invitation_code: String,
}

impl Validate for AdminSignUpForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.account.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if self.invitation_code.trim().is_empty() {
            errors.push("invitationCode", "Invitation code is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
}

impl Validate for SignInForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.push("password", "Password is required");
        }
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl Validate for ForgotPasswordForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordForm {
    pub token: String,
    pub password: String,
    pub confirm_password: String,
}

impl Validate for ResetPasswordForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.token.trim().is_empty() {
            errors.push("token", "Reset token is required");
        }
        check_password(&mut errors, "password", &self.password);
        check_confirmation(&mut errors, &self.password, &self.confirm_password);
        errors.into_result()
    }
}

/// Onboarding data collected once per user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicApplicantForm {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub nationality: String,
    pub passport_number: String,
    pub phone: String,
}

impl BasicApplicantForm {
    pub fn validate_at(&self, today: NaiveDate) -> Result<NaiveDate, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_name(&mut errors, "firstName", "First name", &self.first_name);
        check_name(&mut errors, "lastName", "Last name", &self.last_name);
        let dob = match check_date_of_birth(&self.date_of_birth, today) {
            Ok(dob) => Some(dob),
            Err(message) => {
                errors.push("dateOfBirth", message);
                None
            }
        };
        if self.nationality.trim().is_empty() {
            errors.push("nationality", "Nationality is required");
        }
        if !is_valid_passport_number(&self.passport_number) {
            errors.push("passportNumber", "Passport number must be 6 to 9 letters or digits");
        }
        if !is_valid_phone(&self.phone) {
            errors.push("phone", "Invalid phone number");
        }
        match (errors.into_result(), dob) {
            (Ok(()), Some(dob)) => Ok(dob),
            (Err(errors), _) => Err(errors),
            (Ok(()), None) => Err(ValidationErrors::single("dateOfBirth", "Invalid date")),
        }
    }
}

impl Validate for BasicApplicantForm {
    fn validate(&self) -> Result<(), ValidationErrors> {
        self.validate_at(Utc::now().date_naive()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_up(confirm: &str) -> SignUpForm {
        SignUpForm {
            email: "a@b.com".to_string(),
            password: "Abcdefg1".to_string(),
            confirm_password: confirm.to_string(),
            name: "Jane Doe".to_string(),
        }
    }

    #[test]
    fn sign_up_accepts_valid_payload() {
        assert!(sign_up("Abcdefg1").validate().is_ok());
    }

    #[test]
    fn sign_up_rejects_mismatched_confirmation() {
        let errors = sign_up("Abcdefg2").validate().unwrap_err();
        assert_eq!(
            errors.messages_for("confirmPassword").collect::<Vec<_>>(),
            vec![PASSWORDS_DO_NOT_MATCH]
        );
        assert_eq!(errors.first_message(), Some("Passwords do not match"));
    }

    #[test]
    fn sign_up_from_json_uses_camel_case() {
        let form: SignUpForm = serde_json::from_value(serde_json::json!({
            "email": "a@b.com",
            "password": "Abcdefg1",
            "confirmPassword": "Abcdefg1",
            "name": "Jane Doe"
        }))
        .unwrap();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn weak_passwords_are_rejected() {
        let mut form = sign_up("abcdefg1");
        form.password = "abcdefg1".to_string();
        let errors = form.validate().unwrap_err();
        assert_eq!(
            errors.first_message(),
            Some("Password must contain an uppercase letter")
        );

        form.password = "Abc1".to_string();
        form.confirm_password = "Abc1".to_string();
        assert!(form.validate().unwrap_err().has_error_for("password"));
    }

    #[test]
    fn admin_sign_up_needs_code() {
        let form = AdminSignUpForm {
            account: sign_up("Abcdefg1"),
            invitation_code: "  ".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has_error_for("invitationCode"));
    }

    #[test]
    fn reset_password_checks_confirmation() {
        let form = ResetPasswordForm {
            token: "tok".to_string(),
            password: "NewPassw0rd".to_string(),
            confirm_password: "NewPassword".to_string(),
        };
        assert!(form.validate().unwrap_err().has_error_for("confirmPassword"));
    }

    #[test]
    fn applicant_data_checks_age_and_formats() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        let mut form = BasicApplicantForm {
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            date_of_birth: "01/01/2000".to_string(),
            nationality: "Canada".to_string(),
            passport_number: "AB1234567".to_string(),
            phone: "+1 555 010 2030".to_string(),
        };
        assert_eq!(
            form.validate_at(today).unwrap(),
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );

        form.date_of_birth = "01/01/2015".to_string();
        form.passport_number = "12".to_string();
        let errors = form.validate_at(today).unwrap_err();
        assert!(errors.has_error_for("dateOfBirth"));
        assert!(errors.has_error_for("passportNumber"));
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
    }
}
