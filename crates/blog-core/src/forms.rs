//! Submitted form payloads and their field-level validation.
//!
//! Every form is deserialized from the raw request body as loosely as
//! possible (all strings, everything defaulted) and then turned into a typed
//! value by `clean`, which either succeeds or reports errors per field.
//! Checks that need the store (uniqueness, foreign keys) are added by the
//! caller through [`FormErrors::add`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::domain::{PostFields, ProfileFields};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";

/// Field name -> messages. Non-field errors go under `__all__`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_map(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }

    /// `Ok(value)` if nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();

        for (field, errors) in errors.field_errors() {
            for error in errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(field.to_string(), message);
            }
        }

        form_errors
    }
}

fn validation_errors(form: &impl Validate) -> FormErrors {
    form.validate().err().map(FormErrors::from).unwrap_or_default()
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(invalid("required", REQUIRED));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');

    if !username.chars().all(allowed) {
        return Err(invalid(
            "invalid_username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

fn optional_email(email: &str) -> Result<(), ValidationError> {
    if !email.is_empty() && !email.validate_email() {
        return Err(invalid("email", "Enter a valid email address."));
    }
    Ok(())
}

/// Optional foreign key from a `<select>`: blank means none.
fn parse_choice(raw: Option<&str>, field: &str, errors: &mut FormErrors) -> Option<i64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

/// HTML checkbox semantics: missing means unchecked.
fn parse_checkbox(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "" | "false" | "0" | "off"))
}

/// Accepts `datetime-local` values, a plain date (midnight), or RFC 3339.
pub fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn clean_image(raw: Option<&str>, errors: &mut FormErrors) -> Option<String> {
    let path = raw.map(str::trim).filter(|s| !s.is_empty())?;

    if path.starts_with('/') || path.contains('\\') || path.split('/').any(|seg| seg == "..") {
        errors.add("image", "Enter a path relative to the media directory.");
        return None;
    }
    Some(path.to_string())
}

/// Post create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 256, message = "Ensure this value has at most 256 characters.")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
    #[serde(default)]
    pub pub_date: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_published: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl PostForm {
    pub fn clean(self) -> Result<PostFields, FormErrors> {
        let mut errors = validation_errors(&self);

        let pub_date = if self.pub_date.trim().is_empty() {
            errors.add("pub_date", REQUIRED);
            None
        } else {
            let parsed = parse_pub_date(&self.pub_date);
            if parsed.is_none() {
                errors.add("pub_date", "Enter a valid date/time.");
            }
            parsed
        };

        let location_id = parse_choice(self.location.as_deref(), "location", &mut errors);
        let category_id = parse_choice(self.category.as_deref(), "category", &mut errors);
        let image = clean_image(self.image.as_deref(), &mut errors);

        let Some(pub_date) = pub_date else {
            return Err(errors);
        };

        errors.into_result(PostFields {
            title: self.title.trim().to_string(),
            text: self.text,
            pub_date,
            location_id,
            category_id,
            is_published: parse_checkbox(self.is_published.as_deref()),
            image,
        })
    }

    /// A form pre-filled from stored fields, for the edit page.
    pub fn bound(fields: &PostFields) -> Self {
        Self {
            title: fields.title.clone(),
            text: fields.text.clone(),
            pub_date: fields.pub_date.format("%Y-%m-%dT%H:%M:%S").to_string(),
            location: fields.location_id.map(|id| id.to_string()),
            category: fields.category_id.map(|id| id.to_string()),
            is_published: fields.is_published.then(|| "on".to_string()),
            image: fields.image.clone(),
        }
    }
}

/// Comment add/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "not_blank"))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(self) -> Result<String, FormErrors> {
        validation_errors(&self).into_result(self.text.trim().to_string())
    }
}

/// Profile edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "optional_email"))]
    pub email: String,
}

impl ProfileForm {
    pub fn clean(self) -> Result<ProfileFields, FormErrors> {
        validation_errors(&self).into_result(ProfileFields {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
        })
    }

    pub fn bound(fields: &ProfileFields) -> Self {
        Self {
            first_name: fields.first_name.clone(),
            last_name: fields.last_name.clone(),
            username: fields.username.clone(),
            email: fields.email.clone(),
        }
    }
}

/// A validated sign-up request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub profile: ProfileFields,
    pub password: String,
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1 to 150 characters."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "optional_email"))]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(
        min = 8,
        max = 128,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn clean(self) -> Result<Registration, FormErrors> {
        let mut errors = validation_errors(&self);

        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(Registration {
            profile: ProfileFields {
                username: self.username.trim().to_string(),
                email: self.email.trim().to_string(),
                first_name: self.first_name.trim().to_string(),
                last_name: self.last_name.trim().to_string(),
            },
            password: self.password1,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};

    use super::*;

    fn post_form() -> PostForm {
        PostForm {
            title: "Trip to Baikal".into(),
            text: "Cold water.".into(),
            pub_date: "2024-03-01T10:30".into(),
            location: Some("2".into()),
            category: Some("".into()),
            is_published: Some("on".into()),
            image: None,
        }
    }

    #[test]
    fn test_valid_post_form() {
        let fields = post_form().clean().unwrap();

        assert_eq!(fields.title, "Trip to Baikal");
        assert_eq!(fields.location_id, Some(2));
        assert_eq!(fields.category_id, None);
        assert!(fields.is_published);
        assert_eq!(fields.pub_date.hour(), 10);
    }

    #[test]
    fn test_post_form_reports_every_bad_field() {
        let form = PostForm {
            title: " ".into(),
            text: String::new(),
            pub_date: "yesterday".into(),
            location: Some("abc".into()),
            category: None,
            is_published: None,
            image: Some("../etc/passwd".into()),
        };

        let errors = form.clean().unwrap_err();

        assert_eq!(errors.get("title"), Some(&[REQUIRED.to_string()][..]));
        assert!(errors.contains("text"));
        assert!(errors.contains("pub_date"));
        assert_eq!(errors.get("location"), Some(&[INVALID_CHOICE.to_string()][..]));
        assert!(errors.contains("image"));
        assert!(!errors.contains("category"));
    }

    #[test]
    fn test_missing_checkbox_means_unpublished() {
        let mut form = post_form();
        form.is_published = None;
        assert!(!form.clean().unwrap().is_published);
    }

    #[test]
    fn test_title_length_limit() {
        let mut form = post_form();
        form.title = "x".repeat(257);
        assert!(form.clean().unwrap_err().contains("title"));
    }

    #[test]
    fn test_parse_pub_date_formats() {
        let date_only = parse_pub_date("2024-05-09").unwrap();
        assert_eq!((date_only.month(), date_only.day(), date_only.hour()), (5, 9, 0));

        assert!(parse_pub_date("2024-05-09T08:15:30").is_some());
        assert!(parse_pub_date("2024-05-09T08:15:30+03:00").is_some());
        assert!(parse_pub_date("09.05.2024").is_none());
    }

    #[test]
    fn test_bound_post_form_round_trips() {
        let fields = post_form().clean().unwrap();
        assert_eq!(PostForm::bound(&fields).clean().unwrap(), fields);
    }

    #[test]
    fn test_bound_post_form_keeps_seconds() {
        let mut form = post_form();
        form.pub_date = "2024-03-01T10:30:45".into();
        let fields = form.clean().unwrap();

        let bound = PostForm::bound(&fields);
        assert_eq!(bound.pub_date, "2024-03-01T10:30:45");
        assert_eq!(bound.clean().unwrap().pub_date.second(), 45);
    }

    #[test]
    fn test_comment_form() {
        let text = CommentForm { text: "  nice  ".into() }.clean().unwrap();
        assert_eq!(text, "nice");
        assert!(CommentForm { text: "\n".into() }.clean().is_err());
    }

    #[test]
    fn test_profile_form() {
        let form = ProfileForm {
            first_name: "Anna".into(),
            last_name: "K".into(),
            username: "anna_k".into(),
            email: String::new(),
        };
        assert!(form.clean().is_ok());

        let form = ProfileForm {
            username: "bad name!".into(),
            email: "not-an-email".into(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("email"));

        let form = ProfileForm {
            username: "анна".into(),
            ..Default::default()
        };
        assert!(form.clean().unwrap_err().contains("username"));
    }

    #[test]
    fn test_registration_passwords_must_match() {
        let form = RegistrationForm {
            username: "anna".into(),
            password1: "correct horse".into(),
            password2: "battery staple".into(),
            ..Default::default()
        };
        let errors = form.clean().unwrap_err();
        assert!(errors.contains("password2"));
        assert!(!errors.contains("password1"));
    }
}
