pub mod document;
pub mod enums;
pub mod fact_check;
pub mod region;
pub mod summary;

pub use document::Document;
pub use enums::{Language, ProcessingStatus};
pub use fact_check::FactCheck;
pub use region::Region;
pub use summary::Summary;
