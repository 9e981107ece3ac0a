//! Database repositories for data access layer

mod pool;
mod video;

pub use pool::connect;
pub use video::VideoRepository;
