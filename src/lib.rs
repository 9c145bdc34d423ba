//! # castrank
//!
//! Ranks the most active Farcaster authors over the last 24 hours or 7 days.
//!
//! Casts are pulled page by page from the Neynar API, filtered to the
//! selected window, counted per author, ranked, and optionally exported as
//! CSV. See [`pipeline`] for the data flow and [`config`] for the
//! environment variables.

pub mod cli;
pub mod config;
pub mod pipeline;
pub mod render;
