pub mod files;
pub mod scan;
pub mod signatures;
pub mod spaces;

pub use files::*;
pub use scan::*;
pub use signatures::*;
pub use spaces::*;
