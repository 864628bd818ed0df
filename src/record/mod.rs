//! 录制 xfconf 设置变更

pub mod recorder;
pub mod snapshot;

pub use recorder::{save_recording, Recorder, RECORDED_AT_KEY, RECORD_INTERVAL};
pub use snapshot::{
    parse_channel_xml, ArrayEntry, PropertyValue, Snapshot, SnapshotChanges, XfconfItem,
};
