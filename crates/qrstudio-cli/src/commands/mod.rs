mod decode;
mod generate;

pub use decode::decode_image;
pub use generate::generate;
