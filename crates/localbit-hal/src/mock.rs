//! Mock 寄存器总线
//!
//! 用于测试的内存寄存器模型：
//! - 写操作只记录，不改变读到的值（置位/清零寄存器不是存储器）
//! - 读操作优先消费脚本队列，队列耗尽后返回最后一次的值

use crate::RegisterBus;
use crate::regs;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Default)]
struct MockState {
    values: HashMap<u32, u32>,
    scripted: HashMap<u32, VecDeque<u32>>,
    writes: Vec<(u32, u32)>,
    reads: HashMap<u32, usize>,
}

/// 模拟寄存器窗口
#[derive(Debug, Default)]
pub struct MockBus {
    state: RefCell<MockState>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置寄存器的稳定值
    pub fn set(&self, offset: u32, value: u32) {
        self.state.borrow_mut().values.insert(offset, value);
    }

    /// 追加读脚本，按顺序被后续读取消费
    ///
    /// 每读出一个脚本值都会成为新的稳定值：脚本耗尽后停留在最后一个值，
    /// 之前用 [`Self::set`] 设置的值被覆盖。需要"先若干次 A 再稳定为 B"时把 B 也写进脚本。
    pub fn script(&self, offset: u32, values: impl IntoIterator<Item = u32>) {
        self.state
            .borrow_mut()
            .scripted
            .entry(offset)
            .or_default()
            .extend(values);
    }

    /// 模拟一次 ADC 转换：第一次读返回当前相位，第二次读相位翻转并带上采样值
    pub fn queue_adc_conversion(&self, magnitude: u32) {
        let current = self.peek_last(regs::adc::VALUE);
        let flipped = (current ^ regs::adc::PHASE_BIT) & regs::adc::PHASE_BIT;
        self.script(
            regs::adc::VALUE,
            [current, flipped | (magnitude & !regs::adc::PHASE_BIT)],
        );
    }

    /// 最后一个将被读到的值（脚本末尾或稳定值）
    fn peek_last(&self, offset: u32) -> u32 {
        let state = self.state.borrow();
        state
            .scripted
            .get(&offset)
            .and_then(|q| q.back().copied())
            .or_else(|| state.values.get(&offset).copied())
            .unwrap_or(0)
    }

    /// 全部写记录（按时间顺序）
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.state.borrow().writes.clone()
    }

    /// 某个寄存器的写记录
    pub fn writes_to(&self, offset: u32) -> Vec<u32> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(o, _)| *o == offset)
            .map(|(_, v)| *v)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.state.borrow_mut().writes.clear();
    }

    /// 某个寄存器被读取的次数
    pub fn read_count(&self, offset: u32) -> usize {
        self.state.borrow().reads.get(&offset).copied().unwrap_or(0)
    }
}

impl RegisterBus for MockBus {
    fn read32(&self, offset: u32) -> u32 {
        let mut state = self.state.borrow_mut();
        *state.reads.entry(offset).or_default() += 1;
        if let Some(value) = state.scripted.get_mut(&offset).and_then(VecDeque::pop_front) {
            state.values.insert(offset, value);
            return value;
        }
        state.values.get(&offset).copied().unwrap_or(0)
    }

    fn write32(&self, offset: u32, value: u32) {
        self.state.borrow_mut().writes.push((offset, value));
    }
}
