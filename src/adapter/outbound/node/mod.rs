//! Node processes on the local machine.

pub mod network;
pub mod plugin;
pub mod process;
pub mod settings;

pub use network::LocalNetwork;
pub use plugin::stage_plugin;
pub use settings::NodeSettings;
