use utility::id::HasId;

/// Marker type identifying a navitia stop point. Stop data itself (name,
/// location, ...) lives with the schedule-lookup collaborator;
/// the merge engine only ever needs the id to key lookups.
pub struct StopPoint;

impl HasId for StopPoint {
    type IdType = String;
}

pub type StopPointRef = utility::id::Id<StopPoint>;
