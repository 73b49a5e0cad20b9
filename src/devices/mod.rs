//! Device discovery: microphones matched by name, cameras probed by index,
//! and the positional pairing between them.

pub mod model;
pub mod registry;

pub use model::{AudioDevice, DeviceInventory, DevicePair, VideoDevice};
pub use registry::{discover, enumerate_cameras, enumerate_microphones, pair_devices};
