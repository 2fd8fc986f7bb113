//! # Demo Sequencer
//!
//! The one-shot encrypt/store/license/decrypt pipeline.
//!
//! ```text
//! stage.rs      - DemoStage, DemoEvent, DemoError
//! io.rs         - SelectedFile input, DownloadSink output
//! sequencer.rs  - DemoSequencer, the state machine tying it together
//! ```

pub mod io;
pub mod sequencer;
pub mod stage;

pub use io::{DeliveryReceipt, DirectorySink, DownloadSink, MemorySink, SelectedFile};
pub use sequencer::{DemoSequencer, Delivery, UploadReceipt};
pub use stage::{DemoError, DemoEvent, DemoStage};
