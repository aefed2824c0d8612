//! MongoDB-backed `UserStore` implementation.
//!
//! This adapter owns the document shape stored in the `users` collection and
//! the mapping between driver errors and the port's error taxonomy. Email
//! uniqueness is backed by a unique index created at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::{DateTime as BsonDateTime, Document, doc};
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ports::{UserStore, UserStoreError};
use crate::domain::{Email, Gender, NewUser, Password, User, UserId, UserPatch};

/// Connection settings for the MongoDB adapter.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// Database holding the `users` collection.
    pub database: String,
}

const COLLECTION: &str = "users";
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Document shape persisted in the `users` collection.
///
/// Field names match the JSON surface (camelCase, `photourl` lowercase);
/// validated newtypes deserialise through their own `TryFrom`, so a corrupt
/// document surfaces as a driver deserialisation error rather than an
/// invalid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: String,
    first_name: String,
    last_name: String,
    email: Email,
    password: Password,
    age: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<Gender>,
    photourl: String,
    about: String,
    skills: Vec<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
}

impl UserDocument {
    fn from_record(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            password: user.password.clone(),
            age: user.age,
            gender: user.gender,
            photourl: user.photourl.clone(),
            about: user.about.clone(),
            skills: user.skills.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    fn into_record(self) -> Result<User, UserStoreError> {
        let id = UserId::new(&self.id)
            .map_err(|_| UserStoreError::query(format!("stored user has invalid id {}", self.id)))?;
        Ok(User {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password: self.password,
            age: self.age,
            gender: self.gender,
            photourl: self.photourl,
            about: self.about,
            skills: self.skills,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn map_mongo_error(err: &MongoError) -> UserStoreError {
    debug!(error = %err, "mongodb operation failed");
    match err.kind.as_ref() {
        ErrorKind::Io(_)
        | ErrorKind::ServerSelection { .. }
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => UserStoreError::connection(err.to_string()),
        _ => UserStoreError::query(err.to_string()),
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

// `$set` always carries updatedAt, so the update document is never empty
// even for an empty patch.
fn update_document(patch: &UserPatch, now: DateTime<Utc>) -> Document {
    let mut set = Document::new();
    if let Some(first_name) = &patch.first_name {
        set.insert("firstName", first_name);
    }
    if let Some(last_name) = &patch.last_name {
        set.insert("lastName", last_name);
    }
    if let Some(password) = &patch.password {
        set.insert("password", password.as_ref());
    }
    if let Some(age) = patch.age {
        set.insert("age", age);
    }
    if let Some(about) = &patch.about {
        set.insert("about", about);
    }
    if let Some(photourl) = &patch.photourl {
        set.insert("photourl", photourl);
    }
    set.insert("updatedAt", BsonDateTime::from_chrono(now));
    doc! { "$set": set }
}

/// MongoDB implementation of the `UserStore` port.
#[derive(Clone)]
pub struct MongoUserStore {
    collection: Collection<UserDocument>,
}

impl MongoUserStore {
    /// Build handles against the configured database.
    ///
    /// The driver connects lazily; [`Self::ensure_indexes`] performs the
    /// first round trip.
    pub async fn connect(config: &MongoConfig) -> Result<Self, UserStoreError> {
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|err| UserStoreError::connection(err.to_string()))?;
        let collection = client.database(&config.database).collection(COLLECTION);
        Ok(Self { collection })
    }

    /// Create the unique email index backing the uniqueness invariant.
    pub async fn ensure_indexes(&self) -> Result<(), UserStoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection
            .create_index(index)
            .await
            .map_err(|err| map_mongo_error(&err))?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let record = user.into_record(UserId::random(), Utc::now());
        let document = UserDocument::from_record(&record);
        match self.collection.insert_one(&document).await {
            Ok(_) => Ok(record),
            Err(err) if is_duplicate_key(&err) => {
                Err(UserStoreError::duplicate_email(record.email))
            }
            Err(err) => Err(map_mongo_error(&err)),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let document = self
            .collection
            .find_one(doc! { "email": email })
            .await
            .map_err(|err| map_mongo_error(&err))?;
        document.map(UserDocument::into_record).transpose()
    }

    async fn list_all(&self) -> Result<Vec<User>, UserStoreError> {
        let cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(|err| map_mongo_error(&err))?;
        let documents: Vec<UserDocument> = cursor
            .try_collect()
            .await
            .map_err(|err| map_mongo_error(&err))?;
        documents.into_iter().map(UserDocument::into_record).collect()
    }

    async fn update(&self, id: &UserId, patch: UserPatch) -> Result<Option<User>, UserStoreError> {
        let document = self
            .collection
            .find_one_and_update(doc! { "_id": id.to_string() }, update_document(&patch, Utc::now()))
            .return_document(ReturnDocument::After)
            .await
            .map_err(|err| map_mongo_error(&err))?;
        document.map(UserDocument::into_record).transpose()
    }

    async fn delete(&self, id: &UserId) -> Result<Option<User>, UserStoreError> {
        let document = self
            .collection
            .find_one_and_delete(doc! { "_id": id.to_string() })
            .await
            .map_err(|err| map_mongo_error(&err))?;
        document.map(UserDocument::into_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SignupFields;
    use chrono::TimeZone;
    use mongodb::bson::{Bson, to_document};
    use serde_json::json;

    fn record() -> User {
        NewUser::try_from_parts(SignupFields {
            first_name: Some("Alice".to_owned()),
            email: Some("a@example.com".to_owned()),
            password: Some("Str0ng!Pass".to_owned()),
            age: Some(30),
            gender: Some("other".to_owned()),
            ..SignupFields::default()
        })
        .expect("valid draft")
        .into_record(
            UserId::random(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .expect("timestamp"),
        )
    }

    #[test]
    fn document_round_trips_to_the_domain_record() {
        let user = record();
        let document = UserDocument::from_record(&user);
        let restored = document.into_record().expect("valid document");
        assert_eq!(restored, user);
    }

    #[test]
    fn document_serialises_wire_field_names() {
        let user = record();
        let document = to_document(&UserDocument::from_record(&user)).expect("bson document");

        assert_eq!(
            document.get("_id").and_then(Bson::as_str),
            Some(user.id.to_string().as_str())
        );
        assert!(document.get("firstName").is_some());
        assert!(document.get("first_name").is_none());
        assert!(document.get("photourl").is_some());
        assert!(matches!(document.get("createdAt"), Some(Bson::DateTime(_))));
        assert_eq!(
            document.get("gender").and_then(Bson::as_str),
            Some("other")
        );
    }

    #[test]
    fn invalid_stored_id_maps_to_a_query_error() {
        let user = record();
        let mut document = UserDocument::from_record(&user);
        document.id = "not-a-uuid".to_owned();
        let err = document.into_record().expect_err("invalid id");
        assert!(matches!(err, UserStoreError::Query { .. }));
    }

    #[test]
    fn update_document_contains_only_submitted_fields() {
        let fields = json!({ "about": "Building storage engines.", "age": 31 });
        let patch = UserPatch::try_from_fields(fields.as_object().expect("object"))
            .expect("valid patch");
        let now = Utc
            .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
            .single()
            .expect("timestamp");

        let update = update_document(&patch, now);
        let set = update
            .get("$set")
            .and_then(Bson::as_document)
            .expect("$set document");

        assert_eq!(
            set.get("about").and_then(Bson::as_str),
            Some("Building storage engines.")
        );
        assert_eq!(set.get("age").and_then(Bson::as_i32), Some(31));
        assert!(set.get("firstName").is_none());
        assert!(set.get("password").is_none());
        assert!(matches!(set.get("updatedAt"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn empty_patch_still_touches_updated_at() {
        let update = update_document(&UserPatch::default(), Utc::now());
        let set = update
            .get("$set")
            .and_then(Bson::as_document)
            .expect("$set document");
        assert_eq!(set.len(), 1);
        assert!(set.get("updatedAt").is_some());
    }
}
