pub mod analyzers;
pub mod filter;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod record;
pub mod source;
pub mod synthetic;
