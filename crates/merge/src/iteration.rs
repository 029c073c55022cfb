use model::trip::{TheoreticalStopTime, VehicleJourney};
use model::trip_update::{StopTimeUpdate, TripUpdate};

/// Drives the sequence of `(order, theoretical_stop)` pairs the merge
/// orchestrator walks. A tagged variant over two finite, restartable
/// strategies rather than a nested generator closure.
pub enum StopIterator<'a> {
    /// Mode A: walk the theoretical VJ in order; the incoming update is
    /// expected to touch only a subset of these stops.
    Theoretical(std::iter::Enumerate<std::slice::Iter<'a, TheoreticalStopTime>>),
    /// Mode B: walk the incoming STUs, synthesizing theoretical stops for
    /// ones the VJ doesn't know about (added stops, or previously-added
    /// stops now being deleted).
    Complete(CompleteIter<'a>),
}

pub struct CompleteIter<'a> {
    vj: &'a VehicleJourney,
    db: Option<&'a TripUpdate>,
    new_stops: std::iter::Enumerate<std::slice::Iter<'a, StopTimeUpdate>>,
}

/// Builds the iteration strategy for one merge.
pub fn stops<'a>(
    vj: &'a VehicleJourney,
    new: &'a TripUpdate,
    db: Option<&'a TripUpdate>,
    is_new_complete: bool,
) -> StopIterator<'a> {
    if is_new_complete {
        StopIterator::Complete(CompleteIter {
            vj,
            db,
            new_stops: new.stop_time_updates.iter().enumerate(),
        })
    } else {
        StopIterator::Theoretical(vj.stop_times.iter().enumerate())
    }
}

impl<'a> Iterator for StopIterator<'a> {
    type Item = (usize, TheoreticalStopTime);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            StopIterator::Theoretical(iter) => iter.next().map(|(order, stop)| (order, stop.clone())),
            StopIterator::Complete(iter) => iter.next(),
        }
    }
}

impl<'a> Iterator for CompleteIter<'a> {
    type Item = (usize, TheoreticalStopTime);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (order, stu) = self.new_stops.next()?;

            if let Some(found) = self.vj.find_stop(&stu.stop_point) {
                return Some((order, found.clone()));
            }

            if stu.arrival_status.is_added() || stu.departure_status.is_added() {
                return Some((order, synthesize(stu)));
            }

            if stu.arrival_status.is_deleted() || stu.departure_status.is_deleted() {
                match self.db {
                    Some(db) if db.deleteable(&stu.stop_point) => {
                        return Some((order, synthesize(stu)));
                    }
                    Some(_) => {
                        log::warn!(
                            "can't delete stop {:?}: it was never added in a prior trip update",
                            stu.stop_point
                        );
                        continue;
                    }
                    None => {
                        log::warn!(
                            "can't delete stop {:?}: no prior trip update to check against",
                            stu.stop_point
                        );
                        continue;
                    }
                }
            }

            // neither a known theoretical stop nor an add/delete signal: skip
        }
    }
}

/// Builds a "fake" theoretical stop for an added or re-deleted stop absent
/// from the VJ, taking its clock reading from the incoming STU's own
/// arrival/departure, working from the already-parsed datetimes this repo
/// stores rather than string time parsing.
fn synthesize(stu: &StopTimeUpdate) -> TheoreticalStopTime {
    TheoreticalStopTime::new(
        stu.stop_point.clone(),
        stu.arrival.map(|dt| dt.time()),
        stu.departure.map(|dt| dt.time()),
    )
}
