//! 命令分发器
//!
//! 维护命令到处理器列表的注册表，按注册顺序同步调用处理器。
//! 注册表是显式对象而不是进程级单例，由启动代码构造后传给
//! 监听器和装配代码

use std::collections::HashMap;

use mccl_core::{Command, Payload};

/// 命令处理器
///
/// 使用函数指针而不是闭包：函数指针天然具备身份相等性，
/// 这是`remove_one`/`remove_all`按身份摘除处理器的前提
pub type CommandHandler = fn(&Payload);

/// 命令分发器
///
/// 同一命令可注册多个处理器，注册顺序即调用顺序；
/// 同一处理器可重复注册，每次触发各调用一次
#[derive(Debug, Default)]
pub struct CommandDispatcher {
    registry: HashMap<Command, Vec<CommandHandler>>,
}

impl CommandDispatcher {
    /// 创建空分发器
    pub fn new() -> Self {
        Self {
            registry: HashMap::new(),
        }
    }

    /// 注册处理器
    ///
    /// 追加到该命令的处理器列表尾部，列表不存在时创建。
    /// 不校验重复，总是成功
    pub fn register(&mut self, cmd: Command, handler: CommandHandler) {
        self.registry.entry(cmd).or_default().push(handler);
    }

    /// 摘除该命令下第一个匹配的处理器
    ///
    /// 直接作用于存活的注册表
    ///
    /// # 返回
    /// - `true`: 摘除了一个处理器
    /// - `false`: 命令或处理器未注册
    pub fn remove_one(&mut self, cmd: Command, handler: CommandHandler) -> bool {
        if let Some(handlers) = self.registry.get_mut(&cmd) {
            if let Some(index) = handlers.iter().position(|&h| h == handler) {
                handlers.remove(index);
                return true;
            }
        }
        false
    }

    /// 摘除该命令下所有匹配的处理器
    ///
    /// # 返回
    /// 摘除的处理器个数
    pub fn remove_all(&mut self, cmd: Command, handler: CommandHandler) -> usize {
        if let Some(handlers) = self.registry.get_mut(&cmd) {
            let before = handlers.len();
            handlers.retain(|&h| h != handler);
            before - handlers.len()
        } else {
            0
        }
    }

    /// 触发无载荷命令
    ///
    /// 命令未注册任何处理器不是错误，静默忽略
    pub fn trigger(&self, cmd: Command) {
        self.trigger_with(cmd, &Payload::None);
    }

    /// 触发携带载荷的命令
    ///
    /// 分发器不解释载荷内容，原样交给每个处理器。
    /// 迭代基于处理器列表的快照，结构性变更不影响本次分发
    pub fn trigger_with(&self, cmd: Command, payload: &Payload) {
        let Some(handlers) = self.registry.get(&cmd) else {
            return;
        };

        // 快照后逐个调用，注册顺序即调用顺序
        let snapshot: Vec<CommandHandler> = handlers.clone();
        for handler in snapshot {
            handler(payload);
        }
    }

    /// 清空所有注册
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// 该命令当前注册的处理器个数
    pub fn handler_count(&self, cmd: Command) -> usize {
        self.registry.get(&cmd).map_or(0, |handlers| handlers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // 测试用处理器通过静态计数器记录调用，
    // 计数器是共享的，用锁串行化相关测试
    static TEST_LOCK: Mutex<()> = Mutex::new(());
    static FIRST_CALLS: AtomicUsize = AtomicUsize::new(0);
    static SECOND_CALLS: AtomicUsize = AtomicUsize::new(0);
    static LAST_SPEED: AtomicUsize = AtomicUsize::new(usize::MAX);
    static ORDER_TRACE: AtomicUsize = AtomicUsize::new(0);

    fn first_handler(_payload: &Payload) {
        FIRST_CALLS.fetch_add(1, Ordering::SeqCst);
        // 记录调用顺序：first在前时trace为奇数个1
        ORDER_TRACE.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v * 10 + 1))
            .unwrap();
    }

    fn second_handler(_payload: &Payload) {
        SECOND_CALLS.fetch_add(1, Ordering::SeqCst);
        ORDER_TRACE.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| Some(v * 10 + 2))
            .unwrap();
    }

    fn speed_handler(payload: &Payload) {
        if let Some(value) = payload.as_byte() {
            LAST_SPEED.store(value as usize, Ordering::SeqCst);
        }
    }

    fn reset_counters() {
        FIRST_CALLS.store(0, Ordering::SeqCst);
        SECOND_CALLS.store(0, Ordering::SeqCst);
        LAST_SPEED.store(usize::MAX, Ordering::SeqCst);
        ORDER_TRACE.store(0, Ordering::SeqCst);
    }

    #[test]
    fn test_register_and_trigger_in_order() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::Start, first_handler);
        dispatcher.register(Command::Start, second_handler);

        dispatcher.trigger(Command::Start);

        assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(SECOND_CALLS.load(Ordering::SeqCst), 1);
        // first先于second被调用
        assert_eq!(ORDER_TRACE.load(Ordering::SeqCst), 12);
    }

    #[test]
    fn test_trigger_unregistered_is_noop() {
        let dispatcher = CommandDispatcher::new();
        // 未注册命令静默忽略，不应panic
        dispatcher.trigger(Command::Reverse);
        dispatcher.trigger_with(Command::SetSpeed, &Payload::Byte(0x10));
    }

    #[test]
    fn test_trigger_with_payload() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::SetSpeed, speed_handler);

        dispatcher.trigger_with(Command::SetSpeed, &Payload::Byte(0x2A));
        assert_eq!(LAST_SPEED.load(Ordering::SeqCst), 0x2A);
    }

    #[test]
    fn test_remove_one_acts_on_live_registry() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::Stop, first_handler);
        dispatcher.register(Command::Stop, second_handler);

        assert!(dispatcher.remove_one(Command::Stop, first_handler));
        assert_eq!(dispatcher.handler_count(Command::Stop), 1);

        dispatcher.trigger(Command::Stop);
        assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(SECOND_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_one_only_first_occurrence() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::Start, first_handler);
        dispatcher.register(Command::Start, first_handler);

        assert!(dispatcher.remove_one(Command::Start, first_handler));
        assert_eq!(dispatcher.handler_count(Command::Start), 1);

        dispatcher.trigger(Command::Start);
        assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_all_occurrences() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::Start, first_handler);
        dispatcher.register(Command::Start, second_handler);
        dispatcher.register(Command::Start, first_handler);

        assert_eq!(dispatcher.remove_all(Command::Start, first_handler), 2);
        assert_eq!(dispatcher.handler_count(Command::Start), 1);

        dispatcher.trigger(Command::Start);
        assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(SECOND_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut dispatcher = CommandDispatcher::new();
        assert!(!dispatcher.remove_one(Command::Start, first_handler));
        assert_eq!(dispatcher.remove_all(Command::Start, first_handler), 0);

        dispatcher.register(Command::Start, first_handler);
        // 已注册其他处理器时摘除未注册的处理器同样是no-op
        assert!(!dispatcher.remove_one(Command::Start, second_handler));
        assert_eq!(dispatcher.handler_count(Command::Start), 1);
    }

    #[test]
    fn test_duplicate_registration_fires_each() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::Reverse, first_handler);
        dispatcher.register(Command::Reverse, first_handler);

        dispatcher.trigger(Command::Reverse);
        assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear() {
        let _guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        reset_counters();
        let mut dispatcher = CommandDispatcher::new();
        dispatcher.register(Command::Start, first_handler);
        dispatcher.register(Command::Stop, second_handler);

        dispatcher.clear();
        assert_eq!(dispatcher.handler_count(Command::Start), 0);
        assert_eq!(dispatcher.handler_count(Command::Stop), 0);

        dispatcher.trigger(Command::Start);
        dispatcher.trigger(Command::Stop);
        assert_eq!(FIRST_CALLS.load(Ordering::SeqCst), 0);
        assert_eq!(SECOND_CALLS.load(Ordering::SeqCst), 0);
    }
}
