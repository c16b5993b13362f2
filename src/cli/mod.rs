mod add;
mod info;
mod search;
pub mod server;
mod update;

pub use add::*;
pub use info::*;
pub use search::*;
pub use server::*;
pub use update::*;

use crate::config::Opts;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}
