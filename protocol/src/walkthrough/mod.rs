//! # Walkthrough
//!
//! The narrated, step-by-step tour of the vault flow.
//!
//! ```text
//! steps.rs       - Step and the default seven-step catalogue
//! controller.rs  - active index, prev/next (clamping), play flag, tick (wrapping)
//! player.rs      - tokio autoplay ticker + event broadcast
//! flow.rs        - vault / vault+TEE tab selector and its diagram model
//! ```

pub mod controller;
pub mod flow;
pub mod player;
pub mod steps;

pub use controller::{WalkthroughController, WalkthroughError, WalkthroughState};
pub use flow::{FlowEdge, FlowNode, TabbedFlow};
pub use player::{WalkthroughEvent, WalkthroughPlayer};
pub use steps::{default_steps, Step};
