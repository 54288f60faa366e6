use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::FieldErrors;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern"));

/// Usernames that collide with `/api/users/<name>` actions.
pub const RESERVED_USERNAMES: [&str; 4] = ["me", "set_password", "subscriptions", "subscribe"];

pub const MAX_USERNAME_LEN: usize = 254;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_NAME_LEN: usize = 150;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub password: String,
}

fn required(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.add(field, "This field may not be blank.");
    } else if value.chars().count() > max_len {
        errors.add(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        );
    }
}

impl NewUser {
    /// Shape checks that need no database access. Uniqueness is checked by
    /// the caller.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        required(&mut errors, "email", &self.email, MAX_EMAIL_LEN);
        if !errors.contains("email") && !EMAIL_RE.is_match(&self.email) {
            errors.add("email", "Enter a valid email address.");
        }

        required(&mut errors, "username", &self.username, MAX_USERNAME_LEN);
        if !errors.contains("username") {
            if !USERNAME_RE.is_match(&self.username) {
                errors.add(
                    "username",
                    "Enter a valid username. It may contain only letters, digits and @/./+/-/_ characters.",
                );
            } else if RESERVED_USERNAMES.contains(&self.username.as_str()) {
                errors.add("username", "This username is reserved.");
            }
        }

        required(&mut errors, "first_name", &self.first_name, MAX_NAME_LEN);
        required(&mut errors, "last_name", &self.last_name, MAX_NAME_LEN);

        for message in crate::auth::password_problems(&self.password) {
            errors.add("password", message);
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> NewUser {
        NewUser {
            email: "cook@example.com".into(),
            username: "cook.42".into(),
            first_name: "Ada".into(),
            last_name: "Cook".into(),
            password: "long-enough-pw".into(),
        }
    }

    #[test]
    fn valid_user_passes() {
        assert!(valid().validate().is_empty());
    }

    #[test]
    fn reserved_username_is_rejected() {
        let user = NewUser {
            username: "me".into(),
            ..valid()
        };
        assert!(user.validate().contains("username"));
    }

    #[test]
    fn username_pattern_is_enforced() {
        let user = NewUser {
            username: "white space".into(),
            ..valid()
        };
        assert!(user.validate().contains("username"));
    }

    #[test]
    fn blank_fields_are_reported() {
        let user = NewUser {
            email: String::new(),
            first_name: " ".into(),
            ..valid()
        };
        let errors = user.validate();
        assert!(errors.contains("email"));
        assert!(errors.contains("first_name"));
        assert!(!errors.contains("last_name"));
    }

    #[test]
    fn username_may_be_as_long_as_an_email() {
        let user = NewUser {
            username: "u".repeat(MAX_USERNAME_LEN),
            ..valid()
        };
        assert!(user.validate().is_empty());

        let user = NewUser {
            username: "u".repeat(MAX_USERNAME_LEN + 1),
            ..valid()
        };
        assert!(user.validate().contains("username"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let user = NewUser {
            email: "not-an-email".into(),
            ..valid()
        };
        assert!(user.validate().contains("email"));
    }
}
