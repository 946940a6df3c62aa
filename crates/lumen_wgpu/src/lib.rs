//! # Lumen WGPU
//!
//! [`ComputeBackend`] implementation over a wgpu device.
//!
//! Every exported word array becomes one read-only storage buffer. Device
//! limits are checked before allocating, and out-of-memory is caught with
//! an error scope so a failed load can be reported instead of aborting.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lumen_export::{ResetReason, SceneLoader};
//! use lumen_wgpu::WgpuBackend;
//!
//! let backend = WgpuBackend::request_headless()?;
//! let mut loader = SceneLoader::new(backend);
//! loader.load(scene.mod_count(), ResetReason::SceneLoaded, &scene)?;
//!
//! let octree: &wgpu::Buffer = loader.octree_data().buffer();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

use std::sync::Arc;

use lumen_export::{BackendError, ComputeBackend, Release};
use thiserror::Error;
use wgpu::util::DeviceExt;

/// Bytes per exported word.
const WORD_BYTES: u64 = 4;

/// Errors raised while acquiring a device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// No adapter matched the request.
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    /// The adapter refused to create a device.
    #[error("failed to create device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
}

/// A storage buffer holding exported words.
#[derive(Debug)]
pub struct GpuIntBuffer {
    buffer: wgpu::Buffer,
    words: usize,
}

impl GpuIntBuffer {
    /// The device buffer, for binding.
    #[must_use]
    pub const fn buffer(&self) -> &wgpu::Buffer {
        &self.buffer
    }

    /// Length in 32-bit words.
    #[must_use]
    pub const fn words(&self) -> usize {
        self.words
    }
}

impl Release for GpuIntBuffer {
    fn release(self) {
        self.buffer.destroy();
    }
}

/// Compute backend that allocates storage buffers on a wgpu device.
#[derive(Debug, Clone)]
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    max_binding_words: usize,
}

impl WgpuBackend {
    /// Wraps an existing device.
    #[must_use]
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let max_binding_words = binding_limit_words(&device.limits());
        Self {
            device,
            queue,
            max_binding_words,
        }
    }

    /// Requests a device with no surface, for offline rendering.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError`] if no adapter is available or the device
    /// cannot be created.
    pub fn request_headless() -> Result<Self, DeviceError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or(DeviceError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "GPU adapter selected");

        // Take the adapter's own limits: scene buffers routinely exceed the defaults.
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("lumen"),
                required_features: wgpu::Features::empty(),
                required_limits: adapter.limits(),
            },
            None,
        ))?;
        Ok(Self::new(Arc::new(device), Arc::new(queue)))
    }

    /// The device.
    #[must_use]
    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// The queue kernels are submitted on.
    #[must_use]
    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }

    /// Largest buffer, in words, a kernel can bind.
    #[must_use]
    pub const fn max_binding_words(&self) -> usize {
        self.max_binding_words
    }
}

impl ComputeBackend for WgpuBackend {
    type Buffer = GpuIntBuffer;

    fn create_int_buffer(&mut self, label: &str, data: &[i32]) -> Result<GpuIntBuffer, BackendError> {
        check_size(label, data.len(), self.max_binding_words)?;

        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            buffer.destroy();
            return Err(BackendError::Allocation {
                label: label.to_string(),
                words: data.len(),
                reason: error.to_string(),
            });
        }

        tracing::trace!(label, words = data.len(), "storage buffer created");
        Ok(GpuIntBuffer {
            buffer,
            words: data.len(),
        })
    }
}

/// Binding limit of a device in words.
fn binding_limit_words(limits: &wgpu::Limits) -> usize {
    let bytes = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    usize::try_from(bytes / WORD_BYTES).unwrap_or(usize::MAX)
}

fn check_size(label: &str, words: usize, limit: usize) -> Result<(), BackendError> {
    if words > limit {
        return Err(BackendError::TooLarge {
            label: label.to_string(),
            words,
            limit,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_limit_uses_smaller_limit() {
        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: 1 << 20,
            max_buffer_size: 1 << 30,
            ..wgpu::Limits::default()
        };
        assert_eq!(binding_limit_words(&limits), (1 << 20) / 4);

        let limits = wgpu::Limits {
            max_storage_buffer_binding_size: u32::MAX,
            max_buffer_size: 1 << 10,
            ..wgpu::Limits::default()
        };
        assert_eq!(binding_limit_words(&limits), 256);
    }

    #[test]
    fn test_size_check() {
        assert!(check_size("octree_data", 256, 256).is_ok());

        let err = check_size("octree_data", 257, 256).unwrap_err();
        assert_eq!(
            err,
            BackendError::TooLarge {
                label: "octree_data".to_string(),
                words: 257,
                limit: 256,
            }
        );
    }
}
