use utility::id::HasId;

/// An identified upstream source of real-time data.
pub struct Contributor;

impl HasId for Contributor {
    type IdType = String;
}

pub type ContributorId = utility::id::Id<Contributor>;
