pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/protobuf/transit_realtime.rs"));
}

pub mod assemble;
pub mod decode;
pub mod encode;
pub mod poller;
pub mod publish;

pub use assemble::to_trip_update;
pub use decode::{decode_feed, DecodeError, DecodedTripUpdate};
pub use encode::GtfsRtEncoder;
pub use poller::GtfsRtPoller;
pub use publish::HttpPublisher;
