use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, Document},
    error::{ErrorKind, WriteFailure},
    options::{
        ClientOptions, FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument,
        UpdateOptions,
    },
    Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::ServiceError;
use super::store::{AccountFilter, CredentialStore};
use crate::config::MongoConfig;
use crate::models::{
    status_for, PendingRegistration, PendingStatus, RejectedRegistration, Session, User,
};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        tracing::info!(database = %config.database, "Connecting to MongoDB");
        let mut options = ClientOptions::parse(&config.uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            AppError::from(e)
        })?;
        options.app_name = Some("access-service".to_string());
        options.max_pool_size = Some(config.max_pool_size);
        options.server_selection_timeout =
            Some(Duration::from_millis(config.server_selection_timeout_ms));

        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(&config.database);
        tracing::info!(database = %config.database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for access-service");

        let unique_email = |name: &str| {
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(true)
                        .build(),
                )
                .build()
        };

        self.pending_users()
            .create_index(unique_email("pending_email_unique"), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on pendingusers: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on pendingusers.email");

        self.users()
            .create_index(unique_email("user_email_unique"), None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create email index on users: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created unique index on users.email");

        // Pending listing: status filter, newest registration first
        let pending_listing = IndexModel::builder()
            .keys(doc! { "status": 1, "registrationDate": -1 })
            .options(
                IndexOptions::builder()
                    .name("pending_listing".to_string())
                    .build(),
            )
            .build();

        self.pending_users()
            .create_index(pending_listing, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create listing index on pendingusers: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created index on pendingusers.(status, registrationDate)");

        let session_user = IndexModel::builder()
            .keys(doc! { "userId": 1 })
            .options(
                IndexOptions::builder()
                    .name("session_user_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        let session_activity = IndexModel::builder()
            .keys(doc! { "lastActive": -1 })
            .options(
                IndexOptions::builder()
                    .name("session_last_active".to_string())
                    .build(),
            )
            .build();

        self.sessions()
            .create_indexes(vec![session_user, session_activity], None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create indexes on sessions: {}", e);
                AppError::from(e)
            })?;
        tracing::info!("Created indexes on sessions.userId and sessions.lastActive");

        Ok(())
    }

    /// Close the connection pool. Called once in-flight requests have drained.
    pub async fn shutdown(&self) {
        tracing::info!("Closing MongoDB connections");
        self.client.clone().shutdown().await;
    }

    pub fn pending_users(&self) -> Collection<PendingRegistration> {
        self.db.collection("pendingusers")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    pub fn rejected_users(&self) -> Collection<RejectedRegistration> {
        self.db.collection("rejectedusers")
    }

    pub fn sessions(&self) -> Collection<Session> {
        self.db.collection("sessions")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// `$or` of escaped, case-insensitive regexes over the searchable fields.
fn text_filter(query: Option<&str>) -> Document {
    match query {
        Some(q) => {
            let pattern = regex::escape(q);
            let clause = |field: &str| {
                doc! { field: { "$regex": pattern.clone(), "$options": "i" } }
            };
            doc! {
                "$or": [
                    clause("firstName"),
                    clause("lastName"),
                    clause("email"),
                    clause("organization"),
                ]
            }
        }
        None => doc! {},
    }
}

fn bson_date(at: DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_chrono(at)
}

#[async_trait]
impl CredentialStore for MongoDb {
    async fn health_check(&self) -> Result<(), ServiceError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;
        Ok(())
    }

    async fn insert_pending(&self, pending: &PendingRegistration) -> Result<(), ServiceError> {
        match self.pending_users().insert_one(pending, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::DuplicateRegistration(
                "Registration request already pending for this email".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_pending_by_id(&self, id: &str) -> Result<Option<PendingRegistration>, ServiceError> {
        Ok(self.pending_users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_pending_by_email(
        &self,
        email: &str,
    ) -> Result<Option<PendingRegistration>, ServiceError> {
        Ok(self
            .pending_users()
            .find_one(doc! { "email": email }, None)
            .await?)
    }

    async fn transition_pending(
        &self,
        id: &str,
        from: PendingStatus,
        to: PendingStatus,
    ) -> Result<Option<PendingRegistration>, ServiceError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .pending_users()
            .find_one_and_update(
                doc! { "_id": id, "status": from.as_str() },
                doc! { "$set": { "status": to.as_str() } },
                options,
            )
            .await?)
    }

    async fn delete_pending(&self, id: &str) -> Result<bool, ServiceError> {
        let result = self
            .pending_users()
            .delete_one(doc! { "_id": id }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn list_pending(&self, limit: i64) -> Result<Vec<PendingRegistration>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "registrationDate": -1 })
            .limit(limit)
            .build();

        let cursor = self
            .pending_users()
            .find(doc! { "status": PendingStatus::Pending.as_str() }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_pending(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<PendingRegistration>, ServiceError> {
        let options = FindOptions::builder()
            .sort(doc! { "registrationDate": -1 })
            .build();

        let cursor = self.pending_users().find(text_filter(query), options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), ServiceError> {
        match self.users().insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::DuplicateRegistration(
                "An account already exists for this email".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(user_id_filter(id), None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<(), ServiceError> {
        self.users()
            .update_one(
                user_id_filter(id),
                doc! { "$set": { "lastLogin": bson_date(at) } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn set_user_active(&self, id: &str, is_active: bool) -> Result<bool, ServiceError> {
        let result = self
            .users()
            .update_one(
                user_id_filter(id),
                doc! { "$set": { "isActive": is_active, "status": status_for(is_active) } },
                None,
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        let options = FindOptions::builder().sort(doc! { "email": 1 }).build();
        let cursor = self.users().find(doc! {}, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_active_users_by_ids(&self, ids: &[String]) -> Result<Vec<User>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .users()
            .find(
                doc! { "_id": { "$in": user_id_candidates(ids) }, "isActive": true },
                None,
            )
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn search_users(
        &self,
        query: Option<&str>,
        filter: AccountFilter,
    ) -> Result<Vec<User>, ServiceError> {
        let mut filter_doc = text_filter(query);
        match filter {
            AccountFilter::Any => {}
            AccountFilter::Active => {
                filter_doc.insert("isActive", true);
            }
            AccountFilter::Inactive => {
                filter_doc.insert("isActive", false);
            }
        }

        let options = FindOptions::builder().sort(doc! { "email": 1 }).build();
        let cursor = self.users().find(filter_doc, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_active_users(&self) -> Result<u64, ServiceError> {
        Ok(self
            .users()
            .count_documents(doc! { "isActive": true }, None)
            .await?)
    }

    async fn count_active_users_by_access_level(
        &self,
    ) -> Result<BTreeMap<String, u64>, ServiceError> {
        let pipeline = vec![
            doc! { "$match": { "isActive": true } },
            doc! { "$group": { "_id": "$accessLevel", "count": { "$sum": 1 } } },
        ];

        let mut cursor = self.users().aggregate(pipeline, None).await?;
        let mut counts = BTreeMap::new();
        while let Some(group) = cursor.try_next().await? {
            let level = match group.get("_id") {
                Some(Bson::String(level)) => level.clone(),
                _ => continue,
            };
            let count = match group.get("count") {
                Some(Bson::Int32(n)) => u64::try_from(*n).unwrap_or(0),
                Some(Bson::Int64(n)) => u64::try_from(*n).unwrap_or(0),
                _ => 0,
            };
            counts.insert(level, count);
        }
        Ok(counts)
    }

    async fn insert_rejected(&self, rejected: &RejectedRegistration) -> Result<(), ServiceError> {
        self.rejected_users().insert_one(rejected, None).await?;
        Ok(())
    }

    async fn touch_session(&self, user_id: &str, at: DateTime<Utc>) -> Result<(), ServiceError> {
        let options = UpdateOptions::builder().upsert(true).build();
        self.sessions()
            .update_one(
                doc! { "userId": user_id },
                doc! { "$set": { "lastActive": bson_date(at) } },
                options,
            )
            .await?;
        Ok(())
    }

    async fn active_session_user_ids(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<String>, ServiceError> {
        let cursor = self
            .sessions()
            .find(doc! { "lastActive": { "$gte": bson_date(since) } }, None)
            .await?;
        let sessions: Vec<Session> = cursor.try_collect().await?;
        Ok(sessions.into_iter().map(|s| s.user_id).collect())
    }
}

/// Values an account `_id` may be stored as. Accounts seeded outside this
/// service use ObjectIds, which reach callers as hex strings.
fn user_id_candidates(ids: &[String]) -> Vec<Bson> {
    let mut candidates = Vec::with_capacity(ids.len());
    for id in ids {
        candidates.push(Bson::String(id.clone()));
        if let Ok(oid) = ObjectId::parse_str(id) {
            candidates.push(Bson::ObjectId(oid));
        }
    }
    candidates
}

fn user_id_filter(id: &str) -> Document {
    match ObjectId::parse_str(id) {
        Ok(oid) => doc! { "_id": { "$in": [id, oid] } },
        Err(_) => doc! { "_id": id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_filter_matches_both_forms_for_hex_ids() {
        let oid = ObjectId::new();
        let filter = user_id_filter(&oid.to_hex());
        let candidates = filter.get_document("_id").unwrap().get_array("$in").unwrap();

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0], Bson::String(oid.to_hex()));
        assert_eq!(candidates[1], Bson::ObjectId(oid));
    }

    #[test]
    fn test_user_id_filter_plain_for_uuid_ids() {
        let filter = user_id_filter("7d3c1c52-1111-4a4b-9c55-0f6e5d8f2a10");
        assert_eq!(
            filter.get_str("_id").unwrap(),
            "7d3c1c52-1111-4a4b-9c55-0f6e5d8f2a10"
        );
    }

    #[test]
    fn test_user_id_candidates_adds_object_ids() {
        let oid = ObjectId::new();
        let ids = vec!["not-hex".to_string(), oid.to_hex()];

        let candidates = user_id_candidates(&ids);

        assert_eq!(
            candidates,
            vec![
                Bson::String("not-hex".to_string()),
                Bson::String(oid.to_hex()),
                Bson::ObjectId(oid),
            ]
        );
    }

    #[test]
    fn test_text_filter_escapes_regex_metacharacters() {
        let filter = text_filter(Some("a.b+c"));
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 4);

        let first = clauses[0].as_document().unwrap();
        let regex = first.get_document("firstName").unwrap();
        assert_eq!(regex.get_str("$regex").unwrap(), r"a\.b\+c");
        assert_eq!(regex.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn test_text_filter_empty_without_query() {
        assert!(text_filter(None).is_empty());
    }
}
