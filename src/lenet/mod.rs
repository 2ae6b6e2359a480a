mod network;
mod subsampling;

pub use network::{LeNet5, LeNet5Config, PoolingLayer, SubsamplingKind};
pub use subsampling::{
    Subsampling, SubsamplingConfig, SubsamplingPerCell, SubsamplingPerCellConfig,
};
