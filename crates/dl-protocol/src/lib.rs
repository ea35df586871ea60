pub mod analysis;
pub mod files;
pub mod level;

pub use analysis::*;
pub use files::*;
pub use level::*;
