//! # UI Module
//!
//! Screen layout for the string tuner. The drawing widgets live in
//! [`crate::widgets`].

pub mod main_display;
