mod mnist;
mod sequence;

pub use mnist::{HEIGHT, Mnist, MnistError, MnistSplit, NUM_CLASSES, WIDTH};
pub use sequence::{DataSequence, RandStrategy, ShuffleStrategy, ShuffledDataSequence};
