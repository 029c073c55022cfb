use std::error::Error;

pub mod config;
pub mod coordinator;
pub mod database;
pub mod poller;
pub mod testing;

/// Hand-rolled error enum with manual `From` impls, rather than reaching
/// for `thiserror`.
#[derive(Debug)]
pub enum IngestionError {
    Database(database::DatabaseError),
    Publish(database::PublishError),
    Other(Box<dyn Error + Send + Sync>),
}

impl IngestionError {
    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }
}

impl From<database::DatabaseError> for IngestionError {
    fn from(why: database::DatabaseError) -> Self {
        Self::Database(why)
    }
}

impl From<database::PublishError> for IngestionError {
    fn from(why: database::PublishError) -> Self {
        Self::Publish(why)
    }
}

pub type IngestionResult<O> = Result<O, IngestionError>;
