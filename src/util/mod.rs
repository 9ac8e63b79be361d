pub mod clock;
pub mod slice;
pub mod status;

pub use clock::now_micros;
pub use slice::Slice;
pub use status::{Code, Result, Status};
