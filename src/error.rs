use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("point index {index} is out of range for a buffer of {len} points")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("axis {axis} is out of range for dimension {dim}")]
    AxisOutOfRange { axis: usize, dim: usize },
}
