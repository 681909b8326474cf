pub mod capabilities;
pub mod device;

pub use capabilities::{DeviceCapabilities, Feature, Support};
pub use device::{DeviceBackupRecord, DeviceConfigSource};
