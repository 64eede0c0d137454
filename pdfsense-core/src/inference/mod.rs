pub mod model;
pub mod ocr;
pub mod paddle;

pub use ocr::PaddleOcr;
