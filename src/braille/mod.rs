mod canvas;

pub use canvas::{BrailleCanvas, Layer};
