//! Scenario tests spanning several subsystems
//!
//! Unit tests live next to the code they cover; these exercise the graph the
//! way an application drives it.

mod manipulation;
mod rendering;
mod traversal;
