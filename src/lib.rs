//! towers: bracket expressions as towers within towers
//!
//! A bracket expression is parsed into nested towers, each nested group a
//! block resting on its parent. Structural operations on the towers produce
//! plans that the scheduler turns into timed, sonified animation events.
//!
//! Layers:
//! - `domain`: towers, layout, parser, tree operations, instruments
//! - `application`: sonification, event scheduling, scene service
//! - `infrastructure`: playback boundary implementations, service container
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
