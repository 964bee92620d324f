pub mod parser;
pub mod validator;

pub use parser::parse;
pub use validator::{decode, validate};
