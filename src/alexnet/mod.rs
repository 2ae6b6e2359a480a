mod cifar;
mod network;

pub use cifar::{AlexNetCifar, AlexNetCifarConfig};
pub use network::{AlexNet, AlexNetConfig};
