use std::rc::Rc;

use ash::vk;

use crate::commands::{
    command_buffer::GfxCommandBuffer, command_pool::GfxCommandPool, command_queue::GfxCommandQueue,
};
use crate::dynamic_state::{DynamicStateSupport, probe_dynamic_state};
use crate::error::GfxResult;
use crate::foundation::{
    debug_messenger::GfxDebugMsger, device::GfxDevice, instance::GfxInstance, mem_allocator::GfxMemAllocator,
    physical_device::GfxPhysicalDevice,
};

/// 持有所有全局的 Vulkan 对象
///
/// 其他对象通过 `Rc<GfxDevice>` 共享 device，而不是访问全局单例。
/// 正常退出时调用 [`GfxCore::destroy`]，在此之前所有持有 device 的对象都应该已经释放。
///
/// 字段按照销毁顺序声明：初始化中途出错时 `GfxCore` 被隐式 drop，也会按照这个顺序销毁。
pub struct GfxCore {
    /// 用于 one-time 的命令
    temp_command_pool: GfxCommandPool,

    gfx_queue: GfxCommandQueue,

    allocator: Rc<GfxMemAllocator>,
    device: Rc<GfxDevice>,

    debug_msger: GfxDebugMsger,
    instance: GfxInstance,

    /// vk 基础函数的接口
    ///
    /// 在 drop 之后，会卸载 dll，因此必须最后 drop
    vk_entry: ash::Entry,

    /// 初始化之后只读
    dynamic_state: DynamicStateSupport,
}

// 创建与销毁
impl GfxCore {
    pub fn new(app_name: &str, engine_name: &str, enable_validation: bool) -> GfxResult<Self> {
        let _span = tracy_client::span!("GfxCore::new");

        let vk_entry = unsafe { ash::Entry::load()? };
        let instance = GfxInstance::new(&vk_entry, app_name, engine_name, enable_validation)?;
        let physical_device = GfxPhysicalDevice::new_descrete_physical_device(instance.ash_instance())?;

        let gfx_queue_family = physical_device.gfx_queue_family().clone();
        let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
            .queue_family_index(gfx_queue_family.queue_family_index)
            .queue_priorities(&[1.0])];

        // 先探测扩展，再根据探测结果创建 device，最后解析扩展命令
        let (device, dynamic_state) = probe_dynamic_state(&physical_device, |caps| {
            GfxDevice::new(
                instance.ash_instance(),
                physical_device.vk_handle(),
                &queue_create_infos,
                &caps.device_extensions(),
                caps.device_features(),
            )
            .map(Rc::new)
        })?;

        let allocator =
            Rc::new(GfxMemAllocator::new(instance.ash_instance(), physical_device.vk_handle(), device.clone())?);

        let gfx_queue = GfxCommandQueue {
            vk_queue: unsafe { device.get_device_queue(gfx_queue_family.queue_family_index, 0) },
            queue_family: gfx_queue_family.clone(),
            device: device.clone(),
        };
        log::info!("gfx queue's queue family:\n{:#?}", gfx_queue.queue_family());

        let temp_command_pool = GfxCommandPool::new(
            device.clone(),
            gfx_queue_family,
            vk::CommandPoolCreateFlags::TRANSIENT,
            "gfx-core-temp",
        )?;

        let debug_msger = GfxDebugMsger::new(&vk_entry, instance.ash_instance())?;

        // 在 device 以及 debug_utils 之前创建的 vk::Handle
        {
            device.set_object_debug_name(instance.vk_instance(), "GfxInstance");
            device.set_object_debug_name(physical_device.vk_handle(), "GfxPhysicalDevice");

            device.set_object_debug_name(device.vk_handle(), "GfxDevice");
            device.set_object_debug_name(gfx_queue.handle(), "GfxCommandQueue-gfx");
        }

        Ok(Self {
            temp_command_pool,
            gfx_queue,
            allocator,
            device,
            debug_msger,
            instance,
            vk_entry,
            dynamic_state,
        })
    }

    pub fn destroy(self) {
        let Self {
            temp_command_pool,
            gfx_queue,
            allocator,
            device,
            debug_msger,
            instance,
            vk_entry,
            dynamic_state: _,
        } = self;

        drop(temp_command_pool);
        drop(gfx_queue);

        debug_assert_eq!(Rc::strong_count(&allocator), 1, "allocator is still in use");
        drop(allocator);

        debug_assert_eq!(Rc::strong_count(&device), 1, "device is still in use");
        drop(device);

        drop(debug_msger);
        drop(instance);
        drop(vk_entry);
    }
}

// getters
impl GfxCore {
    #[inline]
    pub fn device(&self) -> &Rc<GfxDevice> {
        &self.device
    }

    #[inline]
    pub fn allocator(&self) -> &Rc<GfxMemAllocator> {
        &self.allocator
    }

    #[inline]
    pub fn gfx_queue(&self) -> &GfxCommandQueue {
        &self.gfx_queue
    }

    #[inline]
    pub fn dynamic_state(&self) -> &DynamicStateSupport {
        &self.dynamic_state
    }
}

// tools
impl GfxCore {
    /// 录制并立即执行，等待 queue 空闲后返回
    pub fn one_time_exec<F, R>(&self, func: F, name: impl AsRef<str>) -> GfxResult<R>
    where
        F: FnOnce(&GfxCommandBuffer) -> R,
    {
        let command_buffer = GfxCommandBuffer::new(&self.temp_command_pool, &format!("one-time-{}", name.as_ref()))?;

        command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, name.as_ref())?;
        let result = func(&command_buffer);
        command_buffer.end()?;

        self.gfx_queue.submit(&[&command_buffer], None)?;
        self.gfx_queue.wait_idle()?;
        unsafe {
            self.device.free_command_buffers(self.temp_command_pool.handle(), &[command_buffer.vk_handle()]);
        }

        Ok(result)
    }

    #[inline]
    pub fn wait_idle(&self) -> GfxResult<()> {
        self.device.wait_idle()
    }
}
