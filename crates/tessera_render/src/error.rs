//! # Render Error Types
//!
//! All errors that can occur while setting up or running the compositor.

use thiserror::Error;

/// Errors raised by a display device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not be brought up.
    #[error("device init failed: {0}")]
    Init(String),
}

/// Errors that can occur in the compositor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Display configuration rejected.
    #[error("invalid display configuration: {0}")]
    InvalidConfig(String),

    /// A buffer could not be reserved at startup.
    #[error("could not allocate {what}: {bytes} bytes")]
    OutOfMemory {
        /// Which buffer.
        what: &'static str,
        /// Requested size.
        bytes: usize,
    },

    /// The viewport does not fit inside the tile map.
    #[error("viewport at ({x}, {y}) leaves the {map_width}x{map_height} px tile map")]
    ViewportOutOfBounds {
        /// Requested scroll x.
        x: i32,
        /// Requested scroll y.
        y: i32,
        /// Tile map width in pixels.
        map_width: usize,
        /// Tile map height in pixels.
        map_height: usize,
    },

    /// A resource table does not match the display configuration.
    #[error("resource mismatch: {0}")]
    ResourceMismatch(String),

    /// Device failure.
    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Reserves a boxed slice of `len` copies of `value` without aborting on
/// allocation failure.
pub(crate) fn alloc_filled<T: Copy>(what: &'static str, len: usize, value: T) -> RenderResult<Box<[T]>> {
    let mut buf: Vec<T> = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| RenderError::OutOfMemory {
        what,
        bytes: len * std::mem::size_of::<T>(),
    })?;
    buf.resize(len, value);
    Ok(buf.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_error_passes_through() {
        let err = RenderError::from(DeviceError::Init("no panel".into()));
        assert_eq!(err.to_string(), "device init failed: no panel");
        assert!(matches!(err, RenderError::Device(DeviceError::Init(_))));
    }

    #[test]
    fn test_alloc_filled() {
        let buf = alloc_filled("rows", 6, 7u16).unwrap();
        assert_eq!(&*buf, &[7; 6]);
    }
}
