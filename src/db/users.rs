use redb::{Database, ReadableTable};

use super::{decode, encode, tables};
use crate::error::Result;
use crate::identity::GoogleIdentity;
use crate::models::record::new_id;
use crate::models::user::normalize_email;
use crate::models::UserRecord;

/// Find or create the user behind a verified Google identity
///
/// Lookup order is OAuth subject first, then email. An existing account found
/// by email gets the subject linked and only its empty profile fields filled.
pub fn upsert_google_user(
    db: &Database,
    identity: &GoogleIdentity,
    now: i64,
) -> Result<(String, UserRecord)> {
    let email = normalize_email(&identity.email);

    let write_txn = db.begin_write()?;
    let result = {
        let mut users = write_txn.open_table(tables::USERS)?;
        let mut by_email = write_txn.open_table(tables::USERS_BY_EMAIL)?;
        let mut by_google_id = write_txn.open_table(tables::USERS_BY_GOOGLE_ID)?;

        let linked_id = by_google_id
            .get(identity.sub.as_str())?
            .map(|id| id.value().to_string());
        let existing = match linked_id {
            Some(id) => users
                .get(id.as_str())?
                .map(|bytes| decode::<UserRecord>(bytes.value()))
                .transpose()?
                .map(|record| (id, record)),
            None => None,
        };

        match existing {
            Some(found) => found,
            None => {
                let email_id = by_email
                    .get(email.as_str())?
                    .map(|id| id.value().to_string());
                let by_mail = match email_id {
                    Some(id) => users
                        .get(id.as_str())?
                        .map(|bytes| decode::<UserRecord>(bytes.value()))
                        .transpose()?
                        .map(|record| (id, record)),
                    None => None,
                };

                let (id, record) = match by_mail {
                    Some((id, mut record)) => {
                        tracing::info!("Linking Google account to existing user {}", id);
                        record.google_id = Some(identity.sub.clone());
                        if record.name.is_none() {
                            record.name = identity.name.clone();
                        }
                        if record.picture.is_none() {
                            record.picture = identity.picture.clone();
                        }
                        (id, record)
                    }
                    None => {
                        let id = new_id();
                        tracing::info!("Creating user {}", id);
                        let record = UserRecord {
                            email: email.clone(),
                            google_id: Some(identity.sub.clone()),
                            name: identity.name.clone(),
                            picture: identity.picture.clone(),
                            created_at: now,
                        };
                        by_email.insert(email.as_str(), id.as_str())?;
                        (id, record)
                    }
                };

                let bytes = encode(&record)?;
                users.insert(id.as_str(), bytes.as_slice())?;
                by_google_id.insert(identity.sub.as_str(), id.as_str())?;
                (id, record)
            }
        }
    };
    write_txn.commit()?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use tempfile::TempDir;

    fn get_user(db: &Database, user_id: &str) -> Result<Option<UserRecord>> {
        let read_txn = db.begin_read()?;
        let users = read_txn.open_table(tables::USERS)?;

        let record = users
            .get(user_id)?
            .map(|bytes| decode(bytes.value()))
            .transpose()?;
        Ok(record)
    }

    fn identity(sub: &str, email: &str) -> GoogleIdentity {
        GoogleIdentity {
            sub: sub.to_string(),
            email: email.to_string(),
            email_verified: true,
            name: Some("Asha Rao".to_string()),
            picture: Some("https://example.com/asha.png".to_string()),
        }
    }

    #[test]
    fn test_creates_user_on_first_login() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let (id, record) = upsert_google_user(&db, &identity("g-1", "Asha@Example.com"), 100).unwrap();

        assert_eq!(record.email, "asha@example.com");
        assert_eq!(record.google_id.as_deref(), Some("g-1"));
        assert_eq!(record.created_at, 100);
        assert_eq!(get_user(&db, &id).unwrap(), Some(record));
    }

    #[test]
    fn test_same_subject_returns_same_user() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let (first, _) = upsert_google_user(&db, &identity("g-1", "asha@example.com"), 100).unwrap();
        let (second, record) =
            upsert_google_user(&db, &identity("g-1", "asha@example.com"), 200).unwrap();

        assert_eq!(first, second);
        assert_eq!(record.created_at, 100);
    }

    #[test]
    fn test_links_existing_email_and_keeps_profile() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let (first, _) = upsert_google_user(&db, &identity("g-1", "asha@example.com"), 100).unwrap();

        let mut other = identity("g-2", "ASHA@example.com");
        other.name = Some("Someone Else".to_string());
        let (second, record) = upsert_google_user(&db, &other, 200).unwrap();

        assert_eq!(first, second);
        assert_eq!(record.google_id.as_deref(), Some("g-2"));
        assert_eq!(record.name.as_deref(), Some("Asha Rao"));
    }

    #[test]
    fn test_get_missing_user() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        assert!(get_user(&db, "missing").unwrap().is_none());
    }
}
