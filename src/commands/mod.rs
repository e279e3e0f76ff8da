mod config_cmd;
mod doc;
mod generate;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use doc::DocCommand;
pub use generate::GenerateCommand;
pub use sync_cmd::SyncCommand;
