mod inception;
mod network;

pub use inception::{Inception, InceptionConfig};
pub use network::{
    AuxClassifier, AuxClassifierConfig, GoogLeNet, GoogLeNetConfig, GoogLeNetOutput,
};
