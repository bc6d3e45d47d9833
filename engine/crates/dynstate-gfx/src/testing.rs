//! 不依赖 GPU 的测试替身
//!
//! - [`FakeDevice`]：可配置支持哪些扩展，解析出的函数指针是真实可调用的函数
//! - [`RecordingCommandBuffer`]：记录所有录制的命令
//!
//! 两者写入同一个线程局部的命令列表，通过 [`take_recorded_commands`] 取出

use std::cell::RefCell;
use std::ffi::{CStr, CString};

use ash::vk;
use ash::vk::Handle;

use crate::commands::barrier::GfxBarrierMask;
use crate::commands::recorder::GfxCommandRecorder;
use crate::dynamic_state::capabilities::{DynamicStateCapabilities, DynamicStateExtension};
use crate::dynamic_state::entry_points::DynamicStateOp;
use crate::foundation::capability_query::{DeviceExtensionQuery, DeviceProcResolver};

/// 录制的命令
///
/// viewport 与 scissor 转为数组保存，便于比较
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    MemoryBarrier(GfxBarrierMask),
    BeginRendering {
        render_area: [u32; 2],
        color_attachment_count: u32,
        has_depth: bool,
    },
    EndRendering,
    /// x, y, width, height, min_depth, max_depth
    SetViewport(Vec<[f32; 6]>),
    /// x, y, width, height
    SetScissor(Vec<[i64; 4]>),
    SetLineWidth(f32),
    BindPipeline(vk::PipelineBindPoint, vk::Pipeline),
    PushConstants {
        layout: vk::PipelineLayout,
        stage: vk::ShaderStageFlags,
        offset: u32,
        size: usize,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    SetCullMode(vk::CullModeFlags),
    SetFrontFace(vk::FrontFace),
}

thread_local! {
    static RECORDED_COMMANDS: RefCell<Vec<(vk::CommandBuffer, RecordedCommand)>> = const { RefCell::new(Vec::new()) };
}

fn record(cmd: vk::CommandBuffer, command: RecordedCommand) {
    RECORDED_COMMANDS.with_borrow_mut(|commands| commands.push((cmd, command)));
}

/// 取出当前线程录制的所有命令，并清空
pub fn take_recorded_commands() -> Vec<(vk::CommandBuffer, RecordedCommand)> {
    RECORDED_COMMANDS.with_borrow_mut(std::mem::take)
}

unsafe extern "system" fn fake_cmd_set_cull_mode(cmd: vk::CommandBuffer, cull_mode: vk::CullModeFlags) {
    record(cmd, RecordedCommand::SetCullMode(cull_mode));
}

unsafe extern "system" fn fake_cmd_set_front_face(cmd: vk::CommandBuffer, front_face: vk::FrontFace) {
    record(cmd, RecordedCommand::SetFrontFace(front_face));
}

/// 同时扮演 physical device（扩展查询）与 logical device（命令解析）
#[derive(Debug)]
pub struct FakeDevice {
    extensions: Vec<DynamicStateExtension>,
    provides_entry_points: bool,
    resolved_names: RefCell<Vec<CString>>,
}

impl FakeDevice {
    pub fn with_extensions(extensions: &[DynamicStateExtension]) -> Self {
        Self {
            extensions: extensions.to_vec(),
            provides_entry_points: true,
            resolved_names: RefCell::new(Vec::new()),
        }
    }

    pub fn without_extensions() -> Self {
        Self::with_extensions(&[])
    }

    pub fn from_capabilities(capabilities: DynamicStateCapabilities) -> Self {
        Self::with_extensions(&capabilities.supported().collect::<Vec<_>>())
    }

    /// 声明支持扩展，但是 vkGetDeviceProcAddr 始终返回空
    pub fn without_entry_points(mut self) -> Self {
        self.provides_entry_points = false;
        self
    }

    /// 按顺序返回所有被解析过的命令名称
    pub fn resolved_names(&self) -> Vec<CString> {
        self.resolved_names.borrow().clone()
    }
}

impl DeviceExtensionQuery for FakeDevice {
    fn supports_device_extension(&self, name: &CStr) -> bool {
        self.extensions.iter().any(|ext| ext.name() == name)
    }
}

impl DeviceProcResolver for FakeDevice {
    fn device_proc_addr(&self, name: &CStr) -> vk::PFN_vkVoidFunction {
        self.resolved_names.borrow_mut().push(name.to_owned());
        if !self.provides_entry_points {
            return None;
        }

        let op = DynamicStateOp::ALL.into_iter().find(|op| op.command_name() == name)?;
        if !self.extensions.contains(&op.extension()) {
            return None;
        }

        // SAFETY: 调用方会按照命令名称 transmute 回对应的签名
        unsafe {
            Some(match op {
                DynamicStateOp::SetCullMode => std::mem::transmute::<vk::PFN_vkCmdSetCullMode, unsafe extern "system" fn()>(
                    fake_cmd_set_cull_mode,
                ),
                DynamicStateOp::SetFrontFace => std::mem::transmute::<
                    vk::PFN_vkCmdSetFrontFace,
                    unsafe extern "system" fn(),
                >(fake_cmd_set_front_face),
            })
        }
    }
}

/// 记录所有命令的 command buffer
pub struct RecordingCommandBuffer {
    vk_handle: vk::CommandBuffer,
}

impl RecordingCommandBuffer {
    /// `raw` 仅用于区分不同的 command buffer
    pub fn new(raw: u64) -> Self {
        Self {
            vk_handle: vk::CommandBuffer::from_raw(raw),
        }
    }

    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }
}

impl GfxCommandRecorder for RecordingCommandBuffer {
    fn vk_handle(&self) -> vk::CommandBuffer {
        self.vk_handle
    }

    fn cmd_memory_barrier(&self, mask: GfxBarrierMask) {
        record(self.vk_handle, RecordedCommand::MemoryBarrier(mask));
    }

    fn cmd_begin_rendering(&self, rendering_info: &vk::RenderingInfo<'_>) {
        record(
            self.vk_handle,
            RecordedCommand::BeginRendering {
                render_area: [rendering_info.render_area.extent.width, rendering_info.render_area.extent.height],
                color_attachment_count: rendering_info.color_attachment_count,
                has_depth: !rendering_info.p_depth_attachment.is_null(),
            },
        );
    }

    fn cmd_end_rendering(&self) {
        record(self.vk_handle, RecordedCommand::EndRendering);
    }

    fn cmd_set_viewport(&self, _first_viewport: u32, viewports: &[vk::Viewport]) {
        let viewports = viewports.iter().map(|v| [v.x, v.y, v.width, v.height, v.min_depth, v.max_depth]).collect();
        record(self.vk_handle, RecordedCommand::SetViewport(viewports));
    }

    fn cmd_set_scissor(&self, _first_scissor: u32, scissors: &[vk::Rect2D]) {
        let scissors = scissors
            .iter()
            .map(|s| [s.offset.x as i64, s.offset.y as i64, s.extent.width as i64, s.extent.height as i64])
            .collect();
        record(self.vk_handle, RecordedCommand::SetScissor(scissors));
    }

    fn cmd_set_line_width(&self, line_width: f32) {
        record(self.vk_handle, RecordedCommand::SetLineWidth(line_width));
    }

    fn cmd_bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        record(self.vk_handle, RecordedCommand::BindPipeline(bind_point, pipeline));
    }

    fn cmd_push_constants(
        &self,
        pipeline_layout: vk::PipelineLayout,
        stage: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        record(
            self.vk_handle,
            RecordedCommand::PushConstants {
                layout: pipeline_layout,
                stage,
                offset,
                size: data.len(),
            },
        );
    }

    fn cmd_draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        record(
            self.vk_handle,
            RecordedCommand::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            },
        );
    }
}
