//! # API Route Modules
//!
//! - `admin`: spec and route management, fallback selection, and
//!   validation counters. These are the only operations that mutate the
//!   registry after start-up.

pub mod admin;
