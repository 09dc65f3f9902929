mod datatype;
mod error;
mod id;
mod output;
mod prefix;
mod sink;
mod term;
pub mod vocab;

pub use datatype::*;
pub use error::*;
pub use id::*;
pub use output::*;
pub use prefix::*;
pub use sink::*;
pub use term::*;
