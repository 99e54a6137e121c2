//! Library side of the csvview command-line viewer.

#![allow(missing_docs)]

pub mod logging;
pub mod render;
pub mod settings;
