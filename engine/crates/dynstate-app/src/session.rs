use dynstate_gfx::dynamic_state::{
    DynamicStateCapabilities, DynamicStateEntryPoints, DynamicStateSupport, DynamicStateValues,
};

/// 一次渲染会话的上下文，显式传递给各个组件
///
/// - 探测结果：初始化时写入，之后只读
/// - 状态值：只由控制面板修改，重建 command buffer 时读取
/// - 重建请求：控制面板置位，帧循环消费
#[derive(Debug)]
pub struct DynamicStateSession {
    support: DynamicStateSupport,
    values: DynamicStateValues,
    rebuild_requested: bool,
}

impl DynamicStateSession {
    /// 新建的 session 需要录制一次 command buffer
    pub fn new(support: DynamicStateSupport, initial_values: DynamicStateValues) -> Self {
        Self {
            support,
            values: initial_values,
            rebuild_requested: true,
        }
    }
}

// getters
impl DynamicStateSession {
    #[inline]
    pub fn capabilities(&self) -> &DynamicStateCapabilities {
        &self.support.capabilities
    }

    #[inline]
    pub fn entry_points(&self) -> &DynamicStateEntryPoints {
        &self.support.entry_points
    }

    #[inline]
    pub fn values(&self) -> &DynamicStateValues {
        &self.values
    }

    #[inline]
    pub fn is_rebuild_requested(&self) -> bool {
        self.rebuild_requested
    }
}

// 控制面板使用
impl DynamicStateSession {
    #[inline]
    pub(crate) fn values_mut(&mut self) -> &mut DynamicStateValues {
        &mut self.values
    }

    #[inline]
    pub fn request_rebuild(&mut self) {
        self.rebuild_requested = true;
    }

    /// 返回是否有未处理的重建请求，并清除
    #[inline]
    pub fn take_rebuild_request(&mut self) -> bool {
        std::mem::take(&mut self.rebuild_requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_requests_initial_recording() {
        let mut session = DynamicStateSession::new(DynamicStateSupport::default(), DynamicStateValues::default());

        assert!(session.is_rebuild_requested());
        assert!(session.take_rebuild_request());
        assert!(!session.take_rebuild_request());

        session.request_rebuild();
        assert!(session.take_rebuild_request());
    }
}
