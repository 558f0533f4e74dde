//! Field rules for drafts, shared by client preflight and the backend.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::codes;
use crate::models::{ApplicationDraft, GroupDraft, SuperUserDraft, TopicDraft, UserDraft};

/// Minimum length of group, topic and application names.
pub const MIN_NAME_LEN: usize = 3;
/// Maximum length of a description.
pub const MAX_DESCRIPTION_LEN: usize = 4000;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9_+&*-]+(?:\.[a-zA-Z0-9_+&*-]+)*@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,7}$",
    )
    .expect("email pattern compiles")
});

/// One or more violated rules, as response codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", .codes.join(", "))]
pub struct ValidationError {
    pub codes: Vec<&'static str>,
}

/// A draft that can be checked before it is sent or stored.
pub trait Validate {
    fn violations(&self) -> Vec<&'static str>;

    fn validate(&self) -> Result<(), ValidationError> {
        let codes = self.violations();
        if codes.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { codes })
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

fn check_name(out: &mut Vec<&'static str>, name: &str, blank: &'static str, short: &'static str) {
    let name = name.trim();
    if name.is_empty() {
        out.push(blank);
    } else if name.chars().count() < MIN_NAME_LEN {
        out.push(short);
    }
}

fn check_email(out: &mut Vec<&'static str>, email: &str) {
    if email.trim().is_empty() {
        out.push(codes::EMAIL_CANNOT_BE_BLANK_OR_NULL);
    } else if !is_valid_email(email) {
        out.push(codes::INVALID_EMAIL_FORMAT);
    }
}

fn check_description(out: &mut Vec<&'static str>, description: Option<&str>) {
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        out.push(codes::DESCRIPTION_TOO_LONG);
    }
}

impl Validate for GroupDraft {
    fn violations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        check_name(
            &mut out,
            &self.name,
            codes::GROUP_NAME_CANNOT_BE_BLANK_OR_NULL,
            codes::GROUP_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS,
        );
        check_description(&mut out, self.description.as_deref());
        out
    }
}

impl Validate for UserDraft {
    fn violations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        check_email(&mut out, &self.email);
        if self.group <= 0 {
            out.push(codes::GROUP_MEMBERSHIP_REQUIRES_GROUP_ASSOCIATION);
        }
        out
    }
}

impl Validate for SuperUserDraft {
    fn violations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        check_email(&mut out, &self.email);
        out
    }
}

impl Validate for TopicDraft {
    fn violations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        check_name(
            &mut out,
            &self.name,
            codes::TOPIC_NAME_CANNOT_BE_BLANK_OR_NULL,
            codes::TOPIC_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS,
        );
        check_description(&mut out, self.description.as_deref());
        if self.group <= 0 {
            out.push(codes::TOPIC_REQUIRES_GROUP_ASSOCIATION);
        }
        out
    }
}

impl Validate for ApplicationDraft {
    fn violations(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        check_name(
            &mut out,
            &self.name,
            codes::APPLICATION_NAME_CANNOT_BE_BLANK_OR_NULL,
            codes::APPLICATION_NAME_CANNOT_BE_LESS_THAN_THREE_CHARACTERS,
        );
        check_description(&mut out, self.description.as_deref());
        if self.group <= 0 {
            out.push(codes::APPLICATION_REQUIRES_GROUP_ASSOCIATION);
        }
        out
    }
}
