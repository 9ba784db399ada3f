/// User primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Job and profile ids are UUID v7, minted in process before generation so
/// image paths can embed them ahead of the commit.
pub type EntityId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Mint a new time-ordered [`EntityId`].
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::now_v7()
}
