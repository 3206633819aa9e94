//! Compute stages of the probe pipeline.
//!
//! Each stage owns its pipeline, uniform buffers and bind groups, and turns
//! its inputs into an ordered list of [`Dispatch`]es. Stages never open
//! passes themselves; [`record_pass`] records a list into one compute pass,
//! and wgpu orders dependent dispatches within it.

pub mod filter;
pub mod inject;
pub mod mip;

pub use filter::{plan_filter_passes, FilterPassPlan, FilterStage, FilterTarget};
pub use inject::InjectStage;
pub use mip::MipStage;

use crate::launch::ComputeLaunch;

/// One compute dispatch, ready to be recorded.
pub struct Dispatch<'a> {
    pub label: &'static str,
    /// Mip level written by the dispatch.
    pub level: u32,
    pub pipeline: &'a wgpu::ComputePipeline,
    pub bind_group: &'a wgpu::BindGroup,
    pub launch: ComputeLaunch,
}

/// Records `dispatches` in order into a new compute pass.
pub fn record_pass(encoder: &mut wgpu::CommandEncoder, label: &str, dispatches: &[Dispatch<'_>]) {
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some(label),
        timestamp_writes: None,
    });
    for dispatch in dispatches {
        let groups = dispatch.launch.groups;
        log::trace!(
            "{label}: {} level {} groups {}x{}x{}",
            dispatch.label,
            dispatch.level,
            groups.x,
            groups.y,
            groups.z
        );
        pass.set_pipeline(dispatch.pipeline);
        pass.set_bind_group(0, dispatch.bind_group, &[]);
        pass.dispatch_workgroups(groups.x, groups.y, groups.z);
    }
}
