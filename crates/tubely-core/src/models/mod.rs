//! Data models shared by the database, pipeline and HTTP layers.

mod thumbnail;
mod video;

pub use thumbnail::*;
pub use video::*;
