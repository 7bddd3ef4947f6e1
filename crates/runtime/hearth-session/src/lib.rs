//! # Hearth Session
//!
//! The submission handler. Each submission coerces the form, puts
//! `Calculating...` on the display, makes one prediction call and writes the
//! price, the server's error, or a connection error back to the display.
//!
//! The display is a single-slot `watch` channel: subscribers always see the
//! latest state, never a history. [`Submitter::transitions`] gives a
//! `broadcast` feed of every write for consumers that print each one.
//! Overlapping submissions are governed by [`ResubmitPolicy`].
//!
//! ```ignore
//! let submitter = Submitter::new(Arc::new(client), ResubmitPolicy::LastWriterWins);
//! let mut display = submitter.subscribe();
//! let state = submitter.submit(&form).settled().await;
//! ```

pub mod display;
pub mod submitter;

pub use display::{DisplayUpdate, SubmissionId};
pub use submitter::{Submission, Submitter, TRANSITION_BUFFER};

pub use hearth_core::{DisplayState, DisplayStyle, Phase, ResubmitPolicy};
