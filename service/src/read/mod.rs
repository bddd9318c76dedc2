//! Read entities definitions.

pub mod joke;
