//! Terminal helpers for picking serial hardware at startup.

mod device_selector;

pub use device_selector::select_device;
