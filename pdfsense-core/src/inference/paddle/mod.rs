pub mod detect;
pub mod recognize;

pub use detect::{PaddleDet, PaddleDetConfig, PaddleDetSession, TextDetection};
pub use recognize::{PaddleRec, PaddleRecConfig, PaddleRecSession};
