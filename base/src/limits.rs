//! Fixed slot counts and queryable device limits.
//!
//! The neutral runtime hides memory-type/queue-family selection entirely
//! (spec §1 Non-goals), so this table only carries the fixed binding-slot
//! counts the command-buffer shadow tables are sized to, plus the couple of
//! true hardware limits spec §4.4's ambient dispatch clamp needs (max
//! compute workgroup count).

/// Number of color attachment slots a render pass may bind.
pub const MAX_COLOR_TARGETS: usize = 4;
/// Number of vertex buffer binding slots.
pub const MAX_VERTEX_BUFFERS: usize = 16;
/// Number of uniform-buffer slots per shader stage (spec §4.2: slots 0..3).
pub const MAX_UNIFORM_SLOTS: usize = 4;
/// Number of sampler/texture/storage-buffer binding slots per group.
pub const MAX_BINDING_SLOTS: usize = 16;
/// Total native vertex-buffer slots available to the backend; vertex
/// buffers occupy the *high* end of this range (spec §4.7).
pub const MAX_NATIVE_BUFFERS: usize = 32;

/// Hardware limits queried from the backend at device-creation time.
#[derive(Debug, Clone, Copy)]
pub struct DeviceLimits {
    /// Per-axis limit on `dispatch`'s workgroup count (spec §4.4, ambient).
    pub max_compute_workgroup_count: [u32; 3],
    /// Minimum alignment, in bytes, required for a uniform buffer offset.
    /// Spec §3 fixes the sub-allocator's own alignment at 256 bytes; a
    /// backend may report a smaller requirement but never a larger one.
    pub min_uniform_buffer_offset_alignment: u32,
    /// Maximum number of samples a multisample texture may request.
    pub max_sample_count: u32,
}

impl Default for DeviceLimits {
    fn default() -> Self {
        Self {
            max_compute_workgroup_count: [u32::MAX, u32::MAX, u32::MAX],
            min_uniform_buffer_offset_alignment: 256,
            max_sample_count: 1,
        }
    }
}
