mod gray;
pub use gray::{gray_from_rgb_u8, gray_from_rgba_u8};
