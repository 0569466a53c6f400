pub mod check;
pub mod project;
pub mod schema;
pub mod shared;

use crate::cli::{Commands, GlobalFlags};

/// Route a parsed command to its handler.
pub fn dispatch(command: &Commands, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Project(args) => project::handle(args, flags),
        Commands::Check(args) => check::handle(args, flags),
        Commands::Schema(args) => schema::handle(args, flags),
    }
}
