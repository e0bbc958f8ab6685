// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (clippy default thresholds)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Real-time bridge between a force-feedback stylus and a molecular
//! simulation.
//!
//! A high-rate servo loop samples the device, maps the stylus into the
//! application's coordinate frame, picks the atom under the pointer,
//! renders a gradient-driven restoring force while the secondary button is
//! held, and reports button edges and throttled camera motion to
//! registered observers.
//!
//! # Key entry points
//!
//! - [`bridge::HapticBridge`] - lifecycle and mutation entry points
//! - [`device::HapticDriver`] / [`device::ServoScheduler`] - the vendor SDK
//!   seam, with [`device::sim`] for software devices
//! - [`observer::HapticObserver`] - event callbacks, or
//!   [`observer::EventReceiver`] for queued delivery
//! - [`options::Options`] - construction-time configuration

pub mod bridge;
pub mod device;
pub mod error;
pub mod force;
pub mod geometry;
pub mod input;
pub mod molecule;
pub mod observer;
pub mod options;

pub use bridge::{HapticBridge, PointerState};
pub use error::BridgeError;
