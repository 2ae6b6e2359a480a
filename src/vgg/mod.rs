mod network;

pub use network::{Vgg, VggBlock, VggConfig, VggVariant};
