//! Typed HTML form inputs and their validation rules.
//!
//! Every form deserializes leniently (missing fields become empty strings) and
//! is then checked by a pure `validate` that either yields the cleaned values or
//! the full list of field errors. Nothing here touches storage.

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// A submitted form that can be checked against its declared constraints.
pub trait Validate {
    type Output;

    fn validate(&self) -> Result<Self::Output, Vec<FieldError>>;
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn check_length(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.push(FieldError::new(
            field,
            format!("must be between {} and {} characters long", min, max),
        ));
    }
}

fn check_required(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "this field is required"));
    }
}

fn finish<T>(errors: Vec<FieldError>, output: impl FnOnce() -> T) -> Result<T, Vec<FieldError>> {
    if errors.is_empty() {
        Ok(output())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Validate for LoginForm {
    type Output = Credentials;

    fn validate(&self) -> Result<Credentials, Vec<FieldError>> {
        let username = self.username.trim();
        let mut errors = Vec::new();
        check_length(&mut errors, "username", username, 4, 25);
        check_required(&mut errors, "password", &self.password);

        finish(errors, || Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    /// Plaintext; only ever handed to the hasher
    pub password: String,
}

impl Validate for RegisterForm {
    type Output = NewAccount;

    fn validate(&self) -> Result<NewAccount, Vec<FieldError>> {
        let username = self.username.trim();
        let email = self.email.trim();
        let mut errors = Vec::new();
        check_length(&mut errors, "username", username, 4, 25);
        check_length(&mut errors, "email", email, 6, 35);
        check_required(&mut errors, "password", &self.password);
        if self.password != self.confirm {
            errors.push(FieldError::new("password", "passwords must match"));
        }

        finish(errors, || NewAccount {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddBookForm {
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub date: String,
    pub publisher: String,
    #[serde(rename = "Image_URL")]
    pub image_url: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub publication_date: Option<String>,
    pub publisher: Option<String>,
    pub image_url: Option<String>,
}

impl Validate for AddBookForm {
    type Output = NewBook;

    fn validate(&self) -> Result<NewBook, Vec<FieldError>> {
        let mut errors = Vec::new();
        check_required(&mut errors, "ISBN", &self.isbn);
        check_required(&mut errors, "title", &self.title);
        check_required(&mut errors, "author", &self.author);

        finish(errors, || NewBook {
            isbn: self.isbn.trim().to_string(),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            publication_date: non_empty(&self.date),
            publisher: non_empty(&self.publisher),
            image_url: non_empty(&self.image_url),
        })
    }
}

/// Used by the to-read, wishlist and read list forms alike.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ShelfForm {
    #[serde(rename = "ISBN")]
    pub isbn: String,
    pub title: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfRequest {
    pub isbn: String,
    pub title: String,
}

impl Validate for ShelfForm {
    type Output = ShelfRequest;

    fn validate(&self) -> Result<ShelfRequest, Vec<FieldError>> {
        let isbn = self.isbn.trim();
        let title = self.title.trim();
        let mut errors = Vec::new();
        if isbn.is_empty() && title.is_empty() {
            errors.push(FieldError::new("ISBN", "enter an ISBN or a title"));
        }

        finish(errors, || ShelfRequest {
            isbn: isbn.to_string(),
            title: title.to_string(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub rating: String,
    pub review: String,
    pub update_image: String,
    pub csrf_token: String,
}

/// Only the fields present in the submission are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub review: Option<String>,
    pub image_url: Option<String>,
}

impl Validate for ReviewForm {
    type Output = ReviewUpdate;

    fn validate(&self) -> Result<ReviewUpdate, Vec<FieldError>> {
        let mut errors = Vec::new();
        let rating = match non_empty(&self.rating) {
            None => None,
            Some(raw) => match raw.parse::<i32>() {
                Ok(value) if (0..=10).contains(&value) => Some(value),
                Ok(_) => {
                    errors.push(FieldError::new("rating", "must be between 0 and 10"));
                    None
                }
                Err(_) => {
                    errors.push(FieldError::new("rating", "not a valid integer value"));
                    None
                }
            },
        };

        finish(errors, || ReviewUpdate {
            rating,
            review: non_empty(&self.review),
            image_url: non_empty(&self.update_image),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub email: String,
    pub hobbies: String,
    pub country: String,
    pub about: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub hobbies: Option<String>,
    pub country: Option<String>,
    pub about: Option<String>,
}

impl Validate for ProfileForm {
    type Output = ProfileUpdate;

    fn validate(&self) -> Result<ProfileUpdate, Vec<FieldError>> {
        Ok(ProfileUpdate {
            email: non_empty(&self.email),
            hobbies: non_empty(&self.hobbies),
            country: non_empty(&self.country),
            about: non_empty(&self.about),
        })
    }
}
