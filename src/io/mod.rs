pub mod config_io;
pub mod fetch_worker;
pub mod source;
