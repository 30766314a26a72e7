use super::DatabaseError;

/// CRUD access to one entity table.
///
/// `update` and `delete` return the number of affected rows; an unknown id
/// affects zero rows and is not an error. An empty patch is a no-op.
pub trait Repository {
    type Entity;
    type New;
    type Patch;

    /// The full collection in the entity's canonical order.
    fn fetch_all(&self) -> Result<Vec<Self::Entity>, DatabaseError>;

    fn get(&self, id: i64) -> Result<Option<Self::Entity>, DatabaseError>;

    /// Insert a new row and return its generated id.
    fn insert(&self, new: &Self::New) -> Result<i64, DatabaseError>;

    fn update(&self, id: i64, patch: &Self::Patch) -> Result<usize, DatabaseError>;

    fn delete(&self, id: i64) -> Result<usize, DatabaseError>;
}
