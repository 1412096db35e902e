/*!
Subcommand dispatch.

  src/cmd/
    mod.rs          (this file)
    catalogue.rs    raw `tools/list` response
    list.rs         operation table / JSON summary
    operations.rs   synthesized per-operation commands
    format.rs       table + color helpers for human output

Each subcommand module exposes one `execute_*` function returning
`anyhow::Result<()>`; argument structs derive `clap::Args`.
*/

pub mod catalogue;
pub mod format;
pub mod list;
pub mod operations;

pub use catalogue::execute_catalogue;
pub use list::{ListArgs, execute_list};
pub use operations::{OperationsArgs, execute_operations};
