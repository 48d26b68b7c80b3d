//! Form checks run before anything is sent to the store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.errors.iter().find(|error| error.field == field).map(|error| error.message)
    }
}

#[derive(Default)]
struct Collector(Vec<FieldError>);

impl Collector {
    fn check(&mut self, ok: bool, field: &'static str, message: &'static str) {
        if !ok && !self.0.iter().any(|error| error.field == field) {
            self.0.push(FieldError { field, message });
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors: self.0 })
        }
    }
}

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Collector::default();
        errors.check(!self.username.trim().is_empty(), "username", "Username is required");
        errors.check(
            self.username.trim().chars().count() >= MIN_USERNAME_LEN,
            "username",
            "Username must be at least 3 characters",
        );
        errors.check(!self.email.trim().is_empty(), "email", "Email is required");
        errors.check(is_valid_email(self.email.trim()), "email", "Please enter a valid email address");
        errors.check(
            self.password.chars().count() >= MIN_PASSWORD_LEN,
            "password",
            "Password must be at least 6 characters",
        );
        errors.check(
            !self.confirm_password.is_empty() && self.password == self.confirm_password,
            "confirmPassword",
            "Passwords do not match",
        );
        errors.finish()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Collector::default();
        errors.check(!self.first_name.trim().is_empty(), "firstName", "First name is required");
        errors.check(!self.last_name.trim().is_empty(), "lastName", "Last name is required");
        errors.check(!self.address.trim().is_empty(), "address", "Address is required");
        errors.check(!self.city.trim().is_empty(), "city", "City is required");
        errors.check(!self.zip_code.trim().is_empty(), "zipCode", "ZIP code is required");
        errors.finish()
    }
}
