//! `/dev/mem` 寄存器窗口
//!
//! 把一段物理地址映射为 `MAP_SHARED` 读写内存，按 32 位 volatile 访问。
//!
//! ## 限制
//!
//! - **仅限 Linux**：需要 `/dev/mem` 与 root 权限
//! - 窗口在进程生命周期内独占，不可跨线程（`MmapWindow` 是 `!Send`）

use crate::{HalError, RegisterBus};
use memmap2::{MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::ptr;
use tracing::trace;

/// 打开内存设备（读写）
///
/// 映射完成后即可关闭文件，映射本身保持有效。
pub fn open_mem_device(path: impl AsRef<Path>) -> Result<File, HalError> {
    let path = path.as_ref();
    OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| HalError::Open {
            path: path.display().to_string(),
            source,
        })
}

/// 映射后的寄存器窗口
pub struct MmapWindow {
    /// 持有映射，Drop 时解除
    _map: MmapMut,
    /// 映射起始地址（构造时从 `&mut` 取得，之后只经由裸指针访问）
    ptr: *mut u8,
    /// 窗口长度（字节）
    len: usize,
    /// 物理基地址（仅用于日志）
    base: u64,
    /// 窗口名称（仅用于日志）
    name: &'static str,
}

impl MmapWindow {
    /// 映射 `[base, base + len)`
    ///
    /// # 错误
    /// - `HalError::Map`: mmap 失败（权限不足、地址无效等）
    pub fn map(file: &File, name: &'static str, base: u64, len: usize) -> Result<Self, HalError> {
        // SAFETY: 映射的是设备寄存器而非普通文件，其内容由硬件改变；
        // 所有访问都经由 volatile 读写，不会形成 Rust 引用。
        let mut map = unsafe { MmapOptions::new().offset(base).len(len).map_mut(file) }.map_err(
            |source| HalError::Map {
                name,
                base,
                len,
                source,
            },
        )?;
        let ptr = map.as_mut_ptr();

        trace!(
            "mapped {} window at 0x{:08X} (+0x{:X}) -> {:p}",
            name, base, len, ptr
        );

        Ok(Self {
            _map: map,
            ptr,
            len,
            base,
            name,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn register(&self, offset: u32) -> *mut u32 {
        debug_assert!(offset % 4 == 0, "misaligned register offset 0x{:04X}", offset);
        debug_assert!(
            offset as usize + 4 <= self.len,
            "register offset 0x{:04X} outside {} window",
            offset,
            self.name
        );
        // SAFETY: 偏移来自 regs 常量表，位于窗口内
        unsafe { self.ptr.add(offset as usize).cast::<u32>() }
    }
}

impl RegisterBus for MmapWindow {
    fn read32(&self, offset: u32) -> u32 {
        // SAFETY: 见 register()；映射页对齐，偏移 4 字节对齐
        let value = unsafe { ptr::read_volatile(self.register(offset)) };
        trace!("peek {} + 0x{:04X} : {:08X}", self.name, offset, value);
        value
    }

    fn write32(&self, offset: u32, value: u32) {
        trace!("poke {} + 0x{:04X} : {:08X}", self.name, offset, value);
        // SAFETY: 同上
        unsafe { ptr::write_volatile(self.register(offset), value) }
    }
}

impl std::fmt::Debug for MmapWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapWindow")
            .field("name", &self.name)
            .field("base", &format_args!("0x{:08X}", self.base))
            .field("len", &self.len)
            .finish()
    }
}
