use std::collections::{VecDeque, vec_deque};
use std::fmt;
use std::io::IoSliceMut;
use std::iter::FusedIterator;

use bytes::{Bytes, BytesMut};
use tracing::{debug, trace};

use crate::config::NetBufferConfig;
use crate::error::{BufferError, BufferOperation};

/// 缓冲链中的位置：`(块序号, 块内偏移)`。
///
/// # 契约说明（What）
/// - 由 [`MessageBuffer::read_index`]/[`MessageBuffer::write_index`] 生成的快照总是已归一化，
///   即 `offset < chunk_size`；
/// - 快照只在下一次推进读游标之前有效：读游标跨块时会淘汰前部块并整体重排块序号。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BufferIndex {
    block: usize,
    offset: usize,
}

impl BufferIndex {
    pub const fn new(block: usize, offset: usize) -> Self {
        Self { block, offset }
    }

    pub const fn block(self) -> usize {
        self.block
    }

    pub const fn offset(self) -> usize {
        self.offset
    }
}

impl From<(usize, usize)> for BufferIndex {
    fn from((block, offset): (usize, usize)) -> Self {
        Self::new(block, offset)
    }
}

impl From<BufferIndex> for (usize, usize) {
    fn from(index: BufferIndex) -> Self {
        (index.block, index.offset)
    }
}

impl fmt::Display for BufferIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.offset)
    }
}

/// `MessageBuffer` 是点对点消息层读路径下的分块接收缓冲。
///
/// # 设计动机（Why）
/// - 对端报文长度可变且可能远大于单次接收量，连续大缓冲要么浪费内存、要么在扩容时整体搬移；
/// - 以固定容量的块串成链，接收侧只追加整块、消费侧只整块丢弃，任何增长、淘汰或收缩都不会复制字节；
/// - 可写区域以描述符列表的形式交给异步分散读（scatter read），网络字节直接落入块内。
///
/// # 结构（How）
/// - `blocks`：`VecDeque` 承载的块数组，前端为最旧数据，后端为最新追加的容量；
/// - `read`/`write`：两个独立游标，分别指向首个未读字节与首个未写字节；
/// - 写游标落在块尾时立即归一化到下一块起点，必要时追加新块，因此可写描述符永不为空；
/// - 读游标跨入后续块时淘汰其之前的全部块并重排游标；读写游标重合时链收缩为单块、游标归零。
///
/// # 契约说明（What）
/// - `total_bytes() == chunk_size() * block_count()` 恒成立，链长度始终不小于 1；
/// - `bytes_to_write() == total_bytes() - linear(write)`，`bytes_to_read() == linear(write) - linear(read)`；
/// - 所有修改操作都要求 `&mut self`：同一实例只由所属连接的 I/O 任务串行驱动，内部不加锁；
/// - 借出的切片、描述符与游标绑定，借用检查器保证它们不会跨越下一次修改调用。
///
/// # 风险与取舍（Trade-offs）
/// - 新块一律以 0 填充后再交给接收方，换取全程无 `unsafe`；
/// - [`BufferIndex`] 快照是普通值，淘汰发生后继续使用旧快照属于调用方缺陷，
///   [`MessageBuffer::peek`] 只能拦截越过写游标的那一部分。
pub struct MessageBuffer {
    chunk_size: usize,
    blocks: VecDeque<Box<[u8]>>,
    read: BufferIndex,
    write: BufferIndex,
}

impl MessageBuffer {
    /// 创建只含一个块的空缓冲。
    ///
    /// `chunk_size` 为 0 时返回 `InvalidArgument`；首块分配失败返回 `AllocationFailure`。
    pub fn new(chunk_size: usize) -> Result<Self, BufferError> {
        if chunk_size == 0 {
            return Err(BufferError::invalid(BufferOperation::New, 0, 0));
        }
        let mut blocks = VecDeque::with_capacity(1);
        blocks.push_back(allocate_block(chunk_size, BufferOperation::New)?);
        Ok(Self {
            chunk_size,
            blocks,
            read: BufferIndex::default(),
            write: BufferIndex::default(),
        })
    }

    /// 按配置中的块大小创建缓冲。
    pub fn from_config(config: &NetBufferConfig) -> Result<Self, BufferError> {
        Self::new(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// 当前持有的全部块容量之和。
    pub fn total_bytes(&self) -> usize {
        self.chunk_size * self.blocks.len()
    }

    pub fn bytes_to_write(&self) -> usize {
        self.total_bytes() - self.linear(self.write)
    }

    pub fn bytes_to_read(&self) -> usize {
        self.linear(self.write) - self.linear(self.read)
    }

    /// 读写游标重合，即不存在未消费字节。
    pub fn is_empty(&self) -> bool {
        self.read == self.write
    }

    pub fn read_index(&self) -> BufferIndex {
        self.read
    }

    pub fn write_index(&self) -> BufferIndex {
        self.write
    }

    /// 写游标所在块的剩余可写区域。
    ///
    /// 写游标已归一化，因此返回的切片至少包含 1 个字节。
    pub fn write_slice(&mut self) -> &mut [u8] {
        let BufferIndex { block, offset } = self.write;
        &mut self.blocks[block][offset..]
    }

    /// 读游标所在块中尚未消费的已写字节。
    ///
    /// 未读数据跨块时只返回第一段；缓冲为空时返回空切片，其起始地址与 [`Self::write_slice`] 相同。
    pub fn read_slice(&self) -> &[u8] {
        let BufferIndex { block, offset } = self.read;
        let end = if block == self.write.block {
            self.write.offset
        } else {
            self.chunk_size
        };
        &self.blocks[block][offset..end]
    }

    /// 确认从写游标起已写入 `n` 个字节。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`n <= bytes_to_write()`，否则返回 `InvalidArgument` 且状态不变；
    ///   `n` 可以跨越多个块，对应一次分散读填满了若干描述符的情形；
    /// - **后置条件**：写游标前移 `n` 字节并归一化；若恰好落在最后一个块的末尾，
    ///   会**追加一个新块**，`total_bytes()` 因此增加 `chunk_size()`。
    ///
    /// # 执行逻辑（How）
    /// 1. 先校验容量，再在需要时分配新块，分配失败时游标保持原位；
    /// 2. 按线性位置重新计算 `(块, 偏移)`，块尾自然归一化到下一块起点。
    pub fn advance_write_ptr(&mut self, n: usize) -> Result<(), BufferError> {
        let available = self.bytes_to_write();
        if n > available {
            return Err(BufferError::invalid(
                BufferOperation::AdvanceWrite,
                n,
                available,
            ));
        }
        if n == available {
            self.push_block(BufferOperation::AdvanceWrite)?;
            trace!(
                blocks = self.blocks.len(),
                total_bytes = self.total_bytes(),
                "write cursor reached chain end, appended block"
            );
        }
        self.write = self.locate(self.linear(self.write) + n);
        Ok(())
    }

    /// 确认从读游标起已消费 `n` 个字节。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`n <= bytes_to_read()`，否则返回 `InvalidArgument` 且状态不变；
    /// - **后置条件**：
    ///   - 读游标追上写游标时，链收缩为单块，两个游标重置为 `(0, 0)`；
    ///   - 读游标跨入第 `k` 块（`k > 0`）时，前 `k` 个块被整块淘汰，两个游标的块序号减去 `k`。
    pub fn advance_read_ptr(&mut self, n: usize) -> Result<(), BufferError> {
        let available = self.bytes_to_read();
        if n > available {
            return Err(BufferError::invalid(
                BufferOperation::AdvanceRead,
                n,
                available,
            ));
        }
        if n == available {
            self.collapse();
            return Ok(());
        }
        let target = self.locate(self.linear(self.read) + n);
        if target.block > 0 {
            self.blocks.drain(..target.block);
            self.write.block -= target.block;
            trace!(
                evicted = target.block,
                blocks = self.blocks.len(),
                "read cursor crossed block boundary, evicted consumed blocks"
            );
        }
        self.read = BufferIndex::new(0, target.offset);
        Ok(())
    }

    /// 在链尾追加一个块。
    pub fn add_buffer_to_chain(&mut self) -> Result<(), BufferError> {
        self.push_block(BufferOperation::Grow)
    }

    /// 在当前 `total_bytes()` 之外再预留至少 `n` 字节，即追加 `ceil(n / chunk_size)` 个块。
    ///
    /// 所有新块分配成功后才挂入链中，失败时链保持原样。
    pub fn add_space(&mut self, n: usize) -> Result<(), BufferError> {
        let count = n.div_ceil(self.chunk_size);
        if count == 0 {
            return Ok(());
        }
        let reserve_failed = |source| BufferError::AllocationFailure {
            operation: BufferOperation::Grow,
            requested: n,
            source,
        };
        let mut fresh = Vec::new();
        fresh.try_reserve_exact(count).map_err(reserve_failed)?;
        self.blocks.try_reserve(count).map_err(reserve_failed)?;
        for _ in 0..count {
            fresh.push(allocate_block(self.chunk_size, BufferOperation::Grow)?);
        }
        self.blocks.extend(fresh);
        debug!(
            requested = n,
            added_blocks = count,
            total_bytes = self.total_bytes(),
            "reserved additional message buffer space"
        );
        Ok(())
    }

    /// 返回从写游标到链尾的全部可写区域，按块顺序排列。
    ///
    /// # 契约说明（What）
    /// - 第一段从写游标偏移延伸到所在块末尾，其余各段均为整块；每段长度都大于 0；
    /// - 序列是调用时刻的快照，借用期间缓冲不可被修改；
    /// - 接收完成后用实际收到的字节数调用 [`Self::advance_write_ptr`]，未收到的部分不得提交。
    pub fn write_descriptors(&mut self) -> WriteDescriptors<'_> {
        WriteDescriptors {
            blocks: self.blocks.range_mut(self.write.block..),
            first_offset: Some(self.write.offset),
        }
    }

    /// 将 [`Self::write_descriptors`] 包装为向量化读取所需的 `IoSliceMut` 列表。
    pub fn io_slices(&mut self) -> Vec<IoSliceMut<'_>> {
        self.write_descriptors().map(IoSliceMut::new).collect()
    }

    /// 从快照位置 `from` 起复制 `dest.len()` 个字节到 `dest`，不修改任何状态。
    ///
    /// # 契约说明（What）
    /// - `from` 须指向当前链内，且 `linear(from) + dest.len() <= linear(write)`，否则返回 `InvalidArgument`；
    /// - 读取区间可以跨越任意多个块边界。
    pub fn peek(&self, dest: &mut [u8], from: BufferIndex) -> Result<(), BufferError> {
        let limit = self.linear(self.write);
        if from.block >= self.blocks.len() || from.offset > self.chunk_size {
            return Err(BufferError::invalid(BufferOperation::Peek, dest.len(), 0));
        }
        let start = self.linear(from);
        let available = limit.saturating_sub(start);
        if start > limit || dest.len() > available {
            return Err(BufferError::invalid(
                BufferOperation::Peek,
                dest.len(),
                available,
            ));
        }

        let mut position = from;
        let mut copied = 0;
        while copied < dest.len() {
            if position.offset == self.chunk_size {
                position = BufferIndex::new(position.block + 1, 0);
            }
            let take = (self.chunk_size - position.offset).min(dest.len() - copied);
            let block = &self.blocks[position.block];
            dest[copied..copied + take]
                .copy_from_slice(&block[position.offset..position.offset + take]);
            copied += take;
            position.offset += take;
        }
        Ok(())
    }

    /// 读取并消费 `dest.len()` 个字节：`peek(dest, read_index())` 之后 `advance_read_ptr(dest.len())`。
    pub fn read(&mut self, dest: &mut [u8]) -> Result<(), BufferError> {
        self.peek(dest, self.read)?;
        self.advance_read_ptr(dest.len())
    }

    /// 读取并消费 `n` 个字节，以 `Bytes` 形式交给下游。
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes, BufferError> {
        let available = self.bytes_to_read();
        if n > available {
            return Err(BufferError::invalid(BufferOperation::Peek, n, available));
        }
        let mut out = BytesMut::zeroed(n);
        self.read(&mut out[..])?;
        Ok(out.freeze())
    }

    fn linear(&self, index: BufferIndex) -> usize {
        index.block * self.chunk_size + index.offset
    }

    fn locate(&self, linear: usize) -> BufferIndex {
        BufferIndex::new(linear / self.chunk_size, linear % self.chunk_size)
    }

    fn push_block(&mut self, operation: BufferOperation) -> Result<(), BufferError> {
        let block = allocate_block(self.chunk_size, operation)?;
        self.blocks.push_back(block);
        Ok(())
    }

    fn collapse(&mut self) {
        if self.blocks.len() > 1 {
            trace!(
                released = self.blocks.len() - 1,
                "message buffer drained, collapsing to a single block"
            );
            self.blocks.truncate(1);
        }
        self.read = BufferIndex::default();
        self.write = BufferIndex::default();
    }
}

impl fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("chunk_size", &self.chunk_size)
            .field("blocks", &self.blocks.len())
            .field("read", &self.read)
            .field("write", &self.write)
            .finish()
    }
}

/// 以 `try_reserve_exact` 申请一个零填充的块，使分配失败可以作为错误返回。
fn allocate_block(chunk_size: usize, operation: BufferOperation) -> Result<Box<[u8]>, BufferError> {
    let mut storage = Vec::new();
    storage
        .try_reserve_exact(chunk_size)
        .map_err(|source| BufferError::AllocationFailure {
            operation,
            requested: chunk_size,
            source,
        })?;
    storage.resize(chunk_size, 0);
    Ok(storage.into_boxed_slice())
}

/// [`MessageBuffer::write_descriptors`] 返回的可写区域序列。
///
/// 有限、不可重启；每一项都是某个块中的一段可写字节。
pub struct WriteDescriptors<'a> {
    blocks: vec_deque::IterMut<'a, Box<[u8]>>,
    first_offset: Option<usize>,
}

impl<'a> Iterator for WriteDescriptors<'a> {
    type Item = &'a mut [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.blocks.next()?;
        let start = self.first_offset.take().unwrap_or(0);
        Some(&mut block[start..])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.blocks.size_hint()
    }
}

impl ExactSizeIterator for WriteDescriptors<'_> {}

impl FusedIterator for WriteDescriptors<'_> {}
