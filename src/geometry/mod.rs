//! Device-space / application-space coordinate mapping.

pub mod transform;

pub use transform::{
    to_application_space, to_device_direction, to_device_space, TransformPair,
};
