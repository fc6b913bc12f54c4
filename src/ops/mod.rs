pub mod directory;
pub mod insert;
pub mod suggestions;
