//! Replay recorded browser interactions against a live HTTP target without a browser.
//!
//! A [`Replayer`] loads an [`ActionScript`] and executes its steps in order, driving an
//! [`HttpSession`] and locating forms, fields, links and frames in raw markup.

pub mod browser;
pub mod config;
pub mod error;
pub mod interaction;
pub mod replayer;
pub mod script;
pub mod selectors;

pub use browser::{CookieJar, HttpSession, PageState};
pub use config::ReplayConfig;
pub use error::ReplayError;
pub use replayer::{Replayer, RunOutcome};
pub use script::{ActionScript, ActionStep};
