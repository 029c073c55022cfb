use std::fmt::Debug;

use serde::Serialize;
pub use serde_with;
use utility::id::{HasId, Id};

pub mod contributor;
pub mod stop;
pub mod trip;
pub mod trip_update;

/// Pairs a row's id with its content, for collaborators that hand back rows
/// read straight off a database query.
#[derive(Debug, Clone, Serialize)]
pub struct WithId<V>
where
    V: HasId,
    V::IdType: Debug + Clone + Serialize,
{
    pub id: Id<V>,
    #[serde(flatten)]
    pub content: V,
}

impl<V> WithId<V>
where
    V: HasId,
    V::IdType: Debug + Clone + Serialize,
{
    pub fn new(id: Id<V>, content: V) -> Self {
        Self { id, content }
    }
}
