pub mod access_level;
pub mod pending_registration;
pub mod rejected_registration;
pub mod session;
pub mod user;

pub use access_level::AccessLevel;
pub use pending_registration::{PendingRegistration, PendingStatus};
pub use rejected_registration::RejectedRegistration;
pub use session::Session;
pub use user::{status_for, User};

/// BSON date helper for optional timestamps.
pub mod optional_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match val {
            Some(date) => {
                mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime::serialize(
                    date, serializer,
                )
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Wrapper(
            #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
            DateTime<Utc>,
        );

        let wrapper = Option::<Wrapper>::deserialize(deserializer)?;
        Ok(wrapper.map(|w| w.0))
    }
}

/// `_id` that may be a string or an ObjectId. Accounts seeded outside this
/// service carry ObjectIds; they are surfaced as 24-char hex strings.
pub mod string_or_object_id {
    use mongodb::bson::Bson;
    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Bson::deserialize(deserializer)? {
            Bson::String(id) => Ok(id),
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            other => Err(D::Error::custom(format!(
                "expected string or ObjectId for _id, got {:?}",
                other.element_type()
            ))),
        }
    }
}
