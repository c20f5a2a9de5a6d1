//! Host platform detection.

pub mod detector;
pub mod profile;

pub use detector::{
    detect, resolve, FamilyProbe, HostProbe, StaticHost, SystemHost, DETECTION_ORDER, FALLBACK,
};
pub use profile::{PlatformFamily, PlatformProfile};
