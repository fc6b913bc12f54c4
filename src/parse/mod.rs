pub mod mention_parser;

pub use mention_parser::{MentionPattern, detect};
