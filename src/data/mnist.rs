//! Loader for the MNIST handwritten-digit dataset in its original IDX layout.
//!
//! Files are read from a local directory, gzipped (`.gz`) or plain; nothing
//! is downloaded. The [CVDF mirror](https://github.com/cvdfoundation/mnist)
//! hosts the canonical files.

use burn::prelude::*;
use flate2::read::GzDecoder;
use num_traits::AsPrimitive;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const NUM_CLASSES: usize = 10;

const TRAIN_IMAGES: &str = "train-images-idx3-ubyte";
const TRAIN_LABELS: &str = "train-labels-idx1-ubyte";
const TEST_IMAGES: &str = "t10k-images-idx3-ubyte";
const TEST_LABELS: &str = "t10k-labels-idx1-ubyte";

const IMAGES_MAGIC: u32 = 0x0000_0803;
const LABELS_MAGIC: u32 = 0x0000_0801;

#[derive(Debug, thiserror::Error)]
pub enum MnistError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: bad magic number {found:#010x}, expected {expected:#010x}")]
    BadMagic {
        name: String,
        found: u32,
        expected: u32,
    },

    #[error("{name}: truncated file, expected {expected} bytes after the header but found {found}")]
    Truncated {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{name}: unsupported image size {rows}x{cols}, expected 28x28")]
    BadImageSize { name: String, rows: u32, cols: u32 },

    #[error("split has {images} images but {labels} labels")]
    CountMismatch { images: usize, labels: usize },
}

/// One split (train or test) of the dataset, held in memory as raw bytes.
#[derive(Debug, Clone)]
pub struct MnistSplit {
    /// Row-major `HEIGHT * WIDTH` brightness bytes per image.
    images: Vec<Vec<u8>>,
    /// Digit class per image, `0..=9`.
    labels: Vec<u8>,
}

impl MnistSplit {
    /// Parses a split from raw IDX file contents.
    pub fn from_idx(image_bytes: &[u8], label_bytes: &[u8]) -> Result<Self, MnistError> {
        let images = parse_images(image_bytes, "images")?;
        let labels = parse_labels(label_bytes, "labels")?;
        if images.len() != labels.len() {
            return Err(MnistError::CountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { images, labels })
    }

    fn load(dir: &Path, images_name: &str, labels_name: &str) -> Result<Self, MnistError> {
        let image_bytes = read_file(&dir.join(images_name))?;
        let label_bytes = read_file(&dir.join(labels_name))?;
        let images = parse_images(&image_bytes, images_name)?;
        let labels = parse_labels(&label_bytes, labels_name)?;
        if images.len() != labels.len() {
            return Err(MnistError::CountMismatch {
                images: images.len(),
                labels: labels.len(),
            });
        }
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Raw brightness bytes of one image, row-major.
    pub fn image_raw(&self, index: usize) -> &[u8] {
        &self.images[index]
    }

    pub fn label(&self, index: usize) -> u8 {
        self.labels[index]
    }

    /// Images at `positions` (e.g. one [`ShuffledDataSequence`] batch) as a
    /// float tensor, brightness scaled from `[0, 255]` into `target_range`.
    ///
    /// [`ShuffledDataSequence`]: crate::data::ShuffledDataSequence
    ///
    /// # Shapes
    ///   - Output [positions.len(), 1, HEIGHT, WIDTH]
    pub fn images_tensor<B: Backend>(
        &self,
        positions: &[usize],
        target_range: (f32, f32),
        device: &B::Device,
    ) -> Tensor<B, 4> {
        let (low, high) = target_range;
        assert!(
            low < high,
            "target range ({low}, {high}) must be (low, high) with low < high"
        );

        let mut flat = Vec::with_capacity(positions.len() * HEIGHT * WIDTH);
        for &position in positions {
            for byte in &self.images[position] {
                let brightness: f32 = (*byte).as_();
                flat.push(brightness / 255.0 * (high - low) + low);
            }
        }

        let data = TensorData::new(flat, [positions.len(), 1, HEIGHT, WIDTH]);
        Tensor::from_data(data.convert::<B::FloatElem>(), device)
    }

    /// Labels at `positions` as an int tensor.
    ///
    /// # Shapes
    ///   - Output [positions.len()]
    pub fn labels_tensor<B: Backend>(&self, positions: &[usize], device: &B::Device) -> Tensor<B, 1, Int> {
        let labels: Vec<i64> = positions.iter().map(|&position| self.labels[position] as i64).collect();
        let data = TensorData::new(labels, [positions.len()]);
        Tensor::from_data(data.convert::<B::IntElem>(), device)
    }

    /// Labels at `positions` one-hot encoded over the ten digit classes.
    ///
    /// # Shapes
    ///   - Output [positions.len(), NUM_CLASSES]
    pub fn labels_one_hot<B: Backend>(&self, positions: &[usize], device: &B::Device) -> Tensor<B, 2> {
        let mut flat = vec![0.0f32; positions.len() * NUM_CLASSES];
        for (row, &position) in positions.iter().enumerate() {
            flat[row * NUM_CLASSES + self.labels[position] as usize] = 1.0;
        }
        let data = TensorData::new(flat, [positions.len(), NUM_CLASSES]);
        Tensor::from_data(data.convert::<B::FloatElem>(), device)
    }
}

/// The MNIST dataset: 60,000 training and 10,000 test 28x28 grayscale digit
/// images in 10 classes.
#[derive(Debug, Clone)]
pub struct Mnist {
    train: MnistSplit,
    test: MnistSplit,
}

impl Mnist {
    /// Reads both splits from `dir`, which holds the four IDX files under
    /// their original names, either plain or with a `.gz` suffix.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, MnistError> {
        let dir = dir.as_ref();
        Ok(Self {
            train: MnistSplit::load(dir, TRAIN_IMAGES, TRAIN_LABELS)?,
            test: MnistSplit::load(dir, TEST_IMAGES, TEST_LABELS)?,
        })
    }

    pub fn train(&self) -> &MnistSplit {
        &self.train
    }

    pub fn test(&self) -> &MnistSplit {
        &self.test
    }

    pub fn num_classes(&self) -> usize {
        NUM_CLASSES
    }
}

/// Reads a file whole, transparently decompressing a `.gz` sibling when the
/// plain file is absent.
fn read_file(path: &Path) -> Result<Vec<u8>, MnistError> {
    let mut buf = Vec::new();
    if path.exists() {
        File::open(path)
            .and_then(|mut file| file.read_to_end(&mut buf))
            .map_err(|source| MnistError::Io {
                path: path.to_path_buf(),
                source,
            })?;
    } else {
        let gz_path = path.with_added_extension("gz");
        File::open(&gz_path)
            .and_then(|file| GzDecoder::new(file).read_to_end(&mut buf))
            .map_err(|source| MnistError::Io {
                path: gz_path.clone(),
                source,
            })?;
    }
    Ok(buf)
}

fn header_field(bytes: &[u8], offset: usize, name: &str) -> Result<u32, MnistError> {
    let field: [u8; 4] = bytes
        .get(offset..offset + 4)
        .and_then(|field| field.try_into().ok())
        .ok_or_else(|| MnistError::Truncated {
            name: name.to_owned(),
            expected: offset + 4,
            found: bytes.len(),
        })?;
    Ok(u32::from_be_bytes(field))
}

/// Parses an IDX image file: magic, count, rows, cols as big-endian u32s,
/// then `count * rows * cols` brightness bytes.
fn parse_images(bytes: &[u8], name: &str) -> Result<Vec<Vec<u8>>, MnistError> {
    let magic = header_field(bytes, 0, name)?;
    if magic != IMAGES_MAGIC {
        return Err(MnistError::BadMagic {
            name: name.to_owned(),
            found: magic,
            expected: IMAGES_MAGIC,
        });
    }

    let count = header_field(bytes, 4, name)? as usize;
    let rows = header_field(bytes, 8, name)?;
    let cols = header_field(bytes, 12, name)?;
    if rows as usize != HEIGHT || cols as usize != WIDTH {
        return Err(MnistError::BadImageSize {
            name: name.to_owned(),
            rows,
            cols,
        });
    }

    let data = &bytes[16..];
    let expected = count * HEIGHT * WIDTH;
    if data.len() != expected {
        return Err(MnistError::Truncated {
            name: name.to_owned(),
            expected,
            found: data.len(),
        });
    }

    Ok(data.chunks(HEIGHT * WIDTH).map(|chunk| chunk.to_vec()).collect())
}

/// Parses an IDX label file: magic and count as big-endian u32s, then
/// `count` label bytes.
fn parse_labels(bytes: &[u8], name: &str) -> Result<Vec<u8>, MnistError> {
    let magic = header_field(bytes, 0, name)?;
    if magic != LABELS_MAGIC {
        return Err(MnistError::BadMagic {
            name: name.to_owned(),
            found: magic,
            expected: LABELS_MAGIC,
        });
    }

    let count = header_field(bytes, 4, name)? as usize;
    let data = &bytes[8..];
    if data.len() != count {
        return Err(MnistError::Truncated {
            name: name.to_owned(),
            expected: count,
            found: data.len(),
        });
    }

    Ok(data.to_vec())
}
