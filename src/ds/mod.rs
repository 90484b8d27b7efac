pub mod retained;

pub use retained::RetainedBits;
