#[cfg(feature = "alexnet")]
pub mod alexnet;
#[cfg(feature = "googlenet")]
pub mod googlenet;
#[cfg(feature = "lenet")]
pub mod lenet;
#[cfg(feature = "vgg")]
pub mod vgg;

pub mod data;
pub mod notebook;

pub mod prelude {
    #[cfg(feature = "alexnet")]
    pub use crate::alexnet::*;
    #[cfg(feature = "googlenet")]
    pub use crate::googlenet::*;
    #[cfg(feature = "lenet")]
    pub use crate::lenet::*;
    #[cfg(feature = "vgg")]
    pub use crate::vgg::*;

    pub use crate::data::*;
}

pub mod utils;
