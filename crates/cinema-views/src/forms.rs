//! Forms posted from the movie page.
//!
//! Both forms deserialize every field as a string so that a malformed value
//! becomes a field error rather than an extractor rejection. `clean` runs
//! every check and reports all failures at once.

use cinema_core::utils::text::is_valid_email;
use cinema_core::ValidationError;
use cinema_db::NewReview;
use serde::Deserialize;

const REQUIRED: &str = "This field is required.";
const NAME_MAX: usize = 100;
const EMAIL_MAX: usize = 254;
const TEXT_MAX: usize = 5000;

/// The review form: `name`, `email`, `text` and an optional `parent` id.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub name: String,
    pub email: String,
    pub text: String,
    pub parent: String,
}

impl ReviewForm {
    /// Validates the form into a [`NewReview`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] with one entry per invalid field.
    pub fn clean(&self) -> Result<NewReview, ValidationError> {
        let mut errors = ValidationError::empty();

        let name = self.name.trim();
        required(&mut errors, "name", name);
        max_length(&mut errors, "name", name, NAME_MAX);

        let email = self.email.trim();
        if required(&mut errors, "email", email) && !is_valid_email(email) {
            errors.add_field_error(
                "email",
                ValidationError::new("Enter a valid email address.", "invalid"),
            );
        }
        max_length(&mut errors, "email", email, EMAIL_MAX);

        let text = self.text.trim();
        required(&mut errors, "text", text);
        max_length(&mut errors, "text", text, TEXT_MAX);

        let parent_id = optional_id(&mut errors, "parent", &self.parent);

        errors.into_result()?;
        Ok(NewReview {
            name: name.to_string(),
            email: email.to_string(),
            text: text.to_string(),
            parent_id,
        })
    }
}

/// The rating form: the chosen `star` and the rated `movie`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RatingForm {
    pub star: String,
    pub movie: String,
}

/// Cleaned rating input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingChoice {
    pub star_id: i64,
    pub movie_id: i64,
}

impl RatingForm {
    /// Validates both ids.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the missing or malformed ids.
    pub fn clean(&self) -> Result<RatingChoice, ValidationError> {
        let mut errors = ValidationError::empty();
        let star = required_id(&mut errors, "star", &self.star);
        let movie = required_id(&mut errors, "movie", &self.movie);
        errors.into_result()?;
        match (star, movie) {
            (Some(star_id), Some(movie_id)) => Ok(RatingChoice { star_id, movie_id }),
            _ => Err(ValidationError::new(REQUIRED, "required")),
        }
    }
}

/// Records a "required" error when `value` is blank. Returns whether it was present.
fn required(errors: &mut ValidationError, field: &str, value: &str) -> bool {
    if value.is_empty() {
        errors.add_field_error(field, ValidationError::new(REQUIRED, "required"));
        return false;
    }
    true
}

fn max_length(errors: &mut ValidationError, field: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add_field_error(
            field,
            ValidationError::new(
                format!("Ensure this value has at most {max} characters (it has {len})."),
                "max_length",
            ),
        );
    }
}

fn optional_id(errors: &mut ValidationError, field: &str, raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.add_field_error(
                field,
                ValidationError::new("Enter a whole number.", "invalid"),
            );
            None
        }
    }
}

fn required_id(errors: &mut ValidationError, field: &str, raw: &str) -> Option<i64> {
    if required(errors, field, raw.trim()) {
        optional_id(errors, field, raw)
    } else {
        None
    }
}
