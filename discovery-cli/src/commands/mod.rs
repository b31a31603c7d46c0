pub mod decode;
pub mod input;
pub mod inspect;

pub use decode::run_decode;
pub use inspect::run_inspect;
