//! Result structs for command output. Commands return these instead of
//! printing directly; main.rs renders them as human text or JSON based on
//! the global --json flag.
mod capsule;
mod init;
mod resources;
mod run;

pub use capsule::*;
pub use init::*;
pub use resources::*;
pub use run::*;
