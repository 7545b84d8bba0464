use redb::TableDefinition;

/// Users table: user_id -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Email index: normalized email -> user_id
pub const USERS_BY_EMAIL: TableDefinition<&str, &str> = TableDefinition::new("users_by_email");

/// OAuth subject index: google_id -> user_id
pub const USERS_BY_GOOGLE_ID: TableDefinition<&str, &str> =
    TableDefinition::new("users_by_google_id");

/// Records table: record_id -> RecordRow (serialized)
pub const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// User records index: user_id -> Vec<record_id> in creation order
pub const USER_RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("user_records");

/// Hash index: data_hash -> Vec<record_id> in creation order
pub const RECORDS_BY_HASH: TableDefinition<&str, &[u8]> = TableDefinition::new("records_by_hash");
