//! GPU compute path for the product-sum reduction.
//!
//! One blocking dispatch per call: both columns are uploaded as storage
//! buffers, each workgroup tree-reduces its 256-element slice in shared
//! memory, and the host reads back the per-workgroup partial sums and
//! performs the final sequential sum.
//!
//! WGSL has no 64-bit integers, so products and partial sums are emulated
//! as `(lo, hi)` pairs of `u32` limbs. That emulation is only correct for
//! non-negative operands, which play counts and durations always are; the
//! host rejects negative inputs up front.

use std::borrow::Cow;
use std::sync::mpsc;

use wgpu::util::DeviceExt;

use crate::error::{Error, Result};

/// Threads per workgroup; must match `@workgroup_size` in the shader.
const WORKGROUP_SIZE: u32 = 256;

/// Tree reduction over emulated u64 values, one partial sum per workgroup.
const SHADER: &str = r"
const WG: u32 = 256u;

@group(0) @binding(0) var<storage, read> counts: array<u32>;
@group(0) @binding(1) var<storage, read> durations: array<u32>;
@group(0) @binding(2) var<storage, read_write> partials: array<vec2<u32>>;

var<workgroup> scratch: array<vec2<u32>, 256>;

// 32x32 -> 64 bit unsigned multiply via 16-bit limbs.
fn mul_wide(x: u32, y: u32) -> vec2<u32> {
    let xl = x & 0xffffu;
    let xh = x >> 16u;
    let yl = y & 0xffffu;
    let yh = y >> 16u;
    let ll = xl * yl;
    let lh = xl * yh;
    let hl = xh * yl;
    let mid = lh + hl;
    let mid_carry = select(0u, 0x10000u, mid < lh);
    let lo = ll + (mid << 16u);
    let lo_carry = select(0u, 1u, lo < ll);
    let hi = (xh * yh) + (mid >> 16u) + mid_carry + lo_carry;
    return vec2<u32>(lo, hi);
}

fn add64(a: vec2<u32>, b: vec2<u32>) -> vec2<u32> {
    let lo = a.x + b.x;
    let carry = select(0u, 1u, lo < a.x);
    return vec2<u32>(lo, a.y + b.y + carry);
}

@compute @workgroup_size(256)
fn reduce(@builtin(global_invocation_id) gid: vec3<u32>,
          @builtin(local_invocation_id) lid: vec3<u32>,
          @builtin(workgroup_id) wid: vec3<u32>) {
    var value = vec2<u32>(0u, 0u);
    if (gid.x < arrayLength(&counts)) {
        value = mul_wide(counts[gid.x], durations[gid.x]);
    }
    scratch[lid.x] = value;
    workgroupBarrier();

    var stride = WG / 2u;
    loop {
        if (stride == 0u) {
            break;
        }
        if (lid.x < stride) {
            scratch[lid.x] = add64(scratch[lid.x], scratch[lid.x + stride]);
        }
        workgroupBarrier();
        stride = stride / 2u;
    }

    if (lid.x == 0u) {
        partials[wid.x] = scratch[0];
    }
}
";

/// Owned GPU device and queue for the reduction dispatch.
///
/// Construction is fatal on a missing device; the benchmark has no retry
/// policy. All buffers created per call are released by RAII.
pub struct GpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
}

impl GpuContext {
    /// Acquire an adapter, device, and compiled pipeline, blocking until
    /// ready.
    ///
    /// # Errors
    ///
    /// [`Error::DeviceUnavailable`] when no compatible adapter exists or
    /// device creation fails.
    pub fn new_blocking() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or_else(|| Error::DeviceUnavailable("no compatible GPU adapter found".to_string()))?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("sumar reduce device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| Error::DeviceUnavailable(e.to_string()))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sumar reduce shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER)),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("sumar reduce pipeline"),
            layout: None,
            module: &module,
            entry_point: Some("reduce"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
        })
    }

    /// Compute `Σ counts[i] * durations[i]` on the device.
    ///
    /// # Errors
    ///
    /// [`Error::ShapeMismatch`] on unequal lengths,
    /// [`Error::NegativeInput`] on any negative operand, and
    /// [`Error::Gpu`] on readback failure.
    pub fn reduce(&self, counts: &[i32], durations: &[i32]) -> Result<i64> {
        if counts.len() != durations.len() {
            return Err(Error::ShapeMismatch {
                counts_len: counts.len(),
                durations_len: durations.len(),
            });
        }
        if counts.is_empty() {
            return Ok(0);
        }
        validate_non_negative(counts)?;
        validate_non_negative(durations)?;

        let workgroups = (counts.len() as u32).div_ceil(WORKGROUP_SIZE);
        let partials_size = u64::from(workgroups) * 8;

        let counts_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("counts"),
                contents: bytemuck::cast_slice(counts),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let durations_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("durations"),
                contents: bytemuck::cast_slice(durations),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let partials_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("partials"),
            size: partials_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("partials staging"),
            size: partials_size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sumar reduce bind group"),
            layout: &self.pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: counts_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: durations_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: partials_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sumar reduce encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("sumar reduce pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&partials_buffer, 0, &staging_buffer, 0, partials_size);
        self.queue.submit([encoder.finish()]);

        let slice = staging_buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| Error::Gpu("map callback dropped".to_string()))?
            .map_err(|e| Error::Gpu(format!("buffer mapping failed: {e:?}")))?;

        let total = {
            let mapped = slice.get_mapped_range();
            let limbs: &[u32] = bytemuck::cast_slice(&mapped);
            limbs
                .chunks_exact(2)
                .map(|pair| (u64::from(pair[1]) << 32) | u64::from(pair[0]))
                .fold(0u64, u64::wrapping_add) as i64
        };
        staging_buffer.unmap();
        Ok(total)
    }
}

fn validate_non_negative(values: &[i32]) -> Result<()> {
    for (index, &value) in values.iter().enumerate() {
        if value < 0 {
            return Err(Error::NegativeInput { index, value });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{self, Strategy};
    use crate::library::{PlaybackColumns, SyntheticLibrary};

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(&[0, 1, 2]).is_ok());
        let err = validate_non_negative(&[3, -1]).unwrap_err();
        assert!(matches!(err, Error::NegativeInput { index: 1, value: -1 }));
    }

    #[test]
    #[ignore = "Requires real GPU - run with --ignored"]
    fn test_gpu_matches_scalar() {
        let context = GpuContext::new_blocking().unwrap();
        let mut library = SyntheticLibrary::new(10_000);
        let columns = PlaybackColumns::collect(&mut library, 10_000);
        let expected =
            kernel::reduce(Strategy::Scalar, columns.counts(), columns.durations()).unwrap();
        let total = context.reduce(columns.counts(), columns.durations()).unwrap();
        assert_eq!(total, expected);
    }

    #[test]
    #[ignore = "Requires real GPU - run with --ignored"]
    fn test_gpu_empty_is_zero() {
        let context = GpuContext::new_blocking().unwrap();
        assert_eq!(context.reduce(&[], &[]).unwrap(), 0);
    }

    #[test]
    #[ignore = "Requires real GPU - run with --ignored"]
    fn test_gpu_rejects_negative_input() {
        let context = GpuContext::new_blocking().unwrap();
        let err = context.reduce(&[-1], &[1]).unwrap_err();
        assert!(matches!(err, Error::NegativeInput { .. }));
    }
}
