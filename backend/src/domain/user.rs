//! User record, validation, and partial updates.
//!
//! All writes go through [`NewUser::try_from_parts`] or
//! [`UserPatch::try_from_fields`], so adapters only ever see validated
//! values. Defaults for unset optional fields are assigned *before*
//! validation runs.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

/// Minimum allowed length for a first name.
pub const FIRST_NAME_MIN: usize = 3;
/// Maximum allowed length for a first name.
pub const FIRST_NAME_MAX: usize = 20;
/// Minimum allowed password length.
pub const PASSWORD_MIN: usize = 6;
/// Minimum length demanded by the password strength policy.
pub const STRONG_PASSWORD_MIN: usize = 8;
/// Maximum number of skills a user may list.
pub const SKILLS_MAX: usize = 25;

/// Placeholder avatar assigned when signup omits `photourl`.
pub const DEFAULT_PHOTOURL: &str =
    "https://www.pngfind.com/pngs/m/610-6104451_image-placeholder-png-user-profile-placeholder-image-png.png";

/// Biography assigned when signup omits `about`.
pub const DEFAULT_ABOUT: &str =
    "Passionate tech enthusiast with a strong background in software development and problem-solving.";

/// Fields accepted by a partial update. Any other key rejects the whole
/// request.
pub const UPDATE_ALLOW_LIST: [&str; 6] = [
    "firstName",
    "lastName",
    "password",
    "age",
    "about",
    "photourl",
];

/// Validation errors raised while constructing or patching a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// A required field was absent from the payload.
    MissingField { field: &'static str },
    /// A field held a JSON value of the wrong type.
    InvalidFieldType { field: &'static str },
    /// First name outside the allowed length range.
    FirstNameLength { min: usize, max: usize },
    /// First name contains characters other than ASCII letters.
    InvalidFirstName,
    /// Last name contains characters other than ASCII letters.
    InvalidLastName,
    /// Email does not match the accepted pattern.
    InvalidEmail,
    /// Password shorter than the minimum length.
    PasswordTooShort { min: usize },
    /// Password fails the strength policy.
    WeakPassword,
    /// Gender value outside the enumerated set.
    InvalidGender,
    /// Photo URL failed to parse as an absolute URL.
    InvalidPhotoUrl,
    /// More skills than the allowed maximum.
    TooManySkills { max: usize },
    /// Identifier is not a valid UUID.
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field: {field}"),
            Self::InvalidFieldType { field } => write!(f, "{field} has the wrong type"),
            Self::FirstNameLength { min, max } => {
                write!(f, "first name must be {min}-{max} characters")
            }
            Self::InvalidFirstName => write!(f, "first name may only contain letters"),
            Self::InvalidLastName => write!(f, "last name may only contain letters"),
            Self::InvalidEmail => write!(f, "invalid email format"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::WeakPassword => write!(
                f,
                "password must contain at least one lowercase letter, one uppercase letter, \
                 one digit, one symbol, and be at least {STRONG_PASSWORD_MIN} characters"
            ),
            Self::InvalidGender => write!(f, "gender must be male, female, or other"),
            Self::InvalidPhotoUrl => write!(f, "photourl must be a valid URL"),
            Self::TooManySkills { max } => write!(f, "no more than {max} skills are allowed"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque user identifier, assigned by the store at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Parse and validate a [`UserId`] from its string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a fresh random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        let pattern = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validated email address.
///
/// ## Invariants
/// - Matches the accepted email pattern; never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Password satisfying the strength policy.
///
/// ## Invariants
/// - At least [`PASSWORD_MIN`] characters.
/// - At least one lowercase letter, one uppercase letter, one digit, one
///   symbol, and [`STRONG_PASSWORD_MIN`] characters overall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Password(String);

impl Password {
    /// Validate and construct a [`Password`].
    pub fn new(password: impl Into<String>) -> Result<Self, UserValidationError> {
        let password = password.into();
        if password.chars().count() < PASSWORD_MIN {
            return Err(UserValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }

        let strong = password.chars().count() >= STRONG_PASSWORD_MIN
            && password.chars().any(|c| c.is_ascii_lowercase())
            && password.chars().any(|c| c.is_ascii_uppercase())
            && password.chars().any(|c| c.is_ascii_digit())
            && password.chars().any(|c| !c.is_alphanumeric());
        if !strong {
            return Err(UserValidationError::WeakPassword);
        }
        Ok(Self(password))
    }
}

impl AsRef<str> for Password {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Password> for String {
    fn from(value: Password) -> Self {
        value.0
    }
}

impl TryFrom<String> for Password {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Enumerated gender values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::str::FromStr for Gender {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(UserValidationError::InvalidGender),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_regex() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        // Length is enforced separately; this regex constrains allowed characters.
        Regex::new("^[a-zA-Z]+$")
            .unwrap_or_else(|error| panic!("name regex failed to compile: {error}"))
    })
}

fn validate_first_name(value: &str) -> Result<(), UserValidationError> {
    let length = value.chars().count();
    if length < FIRST_NAME_MIN || length > FIRST_NAME_MAX {
        return Err(UserValidationError::FirstNameLength {
            min: FIRST_NAME_MIN,
            max: FIRST_NAME_MAX,
        });
    }
    if !name_regex().is_match(value) {
        return Err(UserValidationError::InvalidFirstName);
    }
    Ok(())
}

// Empty last names are allowed; they are the default.
fn validate_last_name(value: &str) -> Result<(), UserValidationError> {
    if !value.is_empty() && !name_regex().is_match(value) {
        return Err(UserValidationError::InvalidLastName);
    }
    Ok(())
}

fn validate_photourl(value: &str) -> Result<(), UserValidationError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|_| UserValidationError::InvalidPhotoUrl)
}

fn validate_skills(value: &[String]) -> Result<(), UserValidationError> {
    if value.len() > SKILLS_MAX {
        return Err(UserValidationError::TooManySkills { max: SKILLS_MAX });
    }
    Ok(())
}

/// Raw signup fields before defaults and validation.
#[derive(Debug, Clone, Default)]
pub struct SignupFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub photourl: Option<String>,
    pub about: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// A validated user draft, ready for the store to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password: Password,
    pub age: i32,
    pub gender: Option<Gender>,
    pub photourl: String,
    pub about: String,
    pub skills: Vec<String>,
}

impl NewUser {
    /// Apply defaults for unset optional fields, then validate every
    /// constraint. Pure; no side effects.
    pub fn try_from_parts(fields: SignupFields) -> Result<Self, UserValidationError> {
        let first_name = fields
            .first_name
            .ok_or(UserValidationError::MissingField { field: "firstName" })?;
        validate_first_name(&first_name)?;

        let last_name = fields.last_name.unwrap_or_default();
        validate_last_name(&last_name)?;

        let email = Email::new(
            fields
                .email
                .ok_or(UserValidationError::MissingField { field: "email" })?,
        )?;
        let password = Password::new(
            fields
                .password
                .ok_or(UserValidationError::MissingField { field: "password" })?,
        )?;
        let age = fields
            .age
            .ok_or(UserValidationError::MissingField { field: "age" })?;

        let gender = fields
            .gender
            .map(|value| value.parse::<Gender>())
            .transpose()?;

        let photourl = fields
            .photourl
            .unwrap_or_else(|| DEFAULT_PHOTOURL.to_owned());
        validate_photourl(&photourl)?;

        let about = fields.about.unwrap_or_else(|| DEFAULT_ABOUT.to_owned());
        let skills = fields.skills.unwrap_or_default();
        validate_skills(&skills)?;

        Ok(Self {
            first_name,
            last_name,
            email,
            password,
            age,
            gender,
            photourl,
            about,
            skills,
        })
    }

    /// Promote the draft to a persisted record with its assigned identity
    /// and timestamps.
    #[must_use]
    pub fn into_record(self, id: UserId, now: DateTime<Utc>) -> User {
        let Self {
            first_name,
            last_name,
            email,
            password,
            age,
            gender,
            photourl,
            about,
            skills,
        } = self;
        User {
            id,
            first_name,
            last_name,
            email,
            password,
            age,
            gender,
            photourl,
            about,
            skills,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Persisted user record.
///
/// ## Invariants
/// - `email` is globally unique (enforced by the store).
/// - All fields satisfy the constraints in [`NewUser::try_from_parts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    #[schema(example = "Alice")]
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = String, example = "a@example.com")]
    pub email: Email,
    #[schema(value_type = String)]
    pub password: Password,
    pub age: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub photourl: String,
    pub about: String,
    pub skills: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated partial update restricted to [`UPDATE_ALLOW_LIST`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<Password>,
    pub age: Option<i32>,
    pub about: Option<String>,
    pub photourl: Option<String>,
}

/// Return the first submitted key outside [`UPDATE_ALLOW_LIST`], if any.
///
/// The update is all-or-nothing at the key-set level: one unrecognised key
/// rejects the whole request, and no allowed sibling is applied.
#[must_use]
pub fn first_disallowed_field(fields: &Map<String, Value>) -> Option<&str> {
    fields
        .keys()
        .map(String::as_str)
        .find(|key| !UPDATE_ALLOW_LIST.contains(key))
}

fn required_str<'v>(
    value: &'v Value,
    field: &'static str,
) -> Result<&'v str, UserValidationError> {
    value
        .as_str()
        .ok_or(UserValidationError::InvalidFieldType { field })
}

impl UserPatch {
    /// Build a patch from submitted fields, re-running the same validators
    /// as creation over every supplied value.
    ///
    /// Callers must have already rejected disallowed keys via
    /// [`first_disallowed_field`]; keys outside the allow-list are ignored
    /// here.
    pub fn try_from_fields(fields: &Map<String, Value>) -> Result<Self, UserValidationError> {
        let mut patch = Self::default();

        if let Some(value) = fields.get("firstName") {
            let first_name = required_str(value, "firstName")?;
            validate_first_name(first_name)?;
            patch.first_name = Some(first_name.to_owned());
        }
        if let Some(value) = fields.get("lastName") {
            let last_name = required_str(value, "lastName")?;
            validate_last_name(last_name)?;
            patch.last_name = Some(last_name.to_owned());
        }
        if let Some(value) = fields.get("password") {
            patch.password = Some(Password::new(required_str(value, "password")?)?);
        }
        if let Some(value) = fields.get("age") {
            let age = value
                .as_i64()
                .and_then(|raw| i32::try_from(raw).ok())
                .ok_or(UserValidationError::InvalidFieldType { field: "age" })?;
            patch.age = Some(age);
        }
        if let Some(value) = fields.get("about") {
            patch.about = Some(required_str(value, "about")?.to_owned());
        }
        if let Some(value) = fields.get("photourl") {
            let photourl = required_str(value, "photourl")?;
            validate_photourl(photourl)?;
            patch.photourl = Some(photourl.to_owned());
        }

        Ok(patch)
    }

    /// Apply the patch to a record, refreshing `updated_at`.
    pub fn apply(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(password) = &self.password {
            user.password = password.clone();
        }
        if let Some(age) = self.age {
            user.age = age;
        }
        if let Some(about) = &self.about {
            user.about = about.clone();
        }
        if let Some(photourl) = &self.photourl {
            user.photourl = photourl.clone();
        }
        user.updated_at = now;
    }
}
