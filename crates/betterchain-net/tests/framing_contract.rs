//! `framing_contract` 集成测试：长度前缀分帧在块链上的行为。
//!
//! # 测试总览（Why）
//! - 报文头与负载都可能跨越块边界，分帧器必须只在整帧到齐后才消费；
//! - 声明长度超过可写空间时要提前扩容，使下一次分散读能够收完整帧；
//! - 非法长度在消费之前被拒绝。

use betterchain_net::{FrameError, FrameOutcome, LengthPrefixedFramer, MessageBuffer};

/// 将字节流按描述符写入缓冲并提交。
fn feed(buffer: &mut MessageBuffer, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let slice = buffer.write_slice();
        let take = slice.len().min(bytes.len());
        slice[..take].copy_from_slice(&bytes[..take]);
        buffer.advance_write_ptr(take).expect("提交写入");
        bytes = &bytes[take..];
    }
}

#[test]
fn short_header_is_incomplete_and_untouched() {
    let framer = LengthPrefixedFramer::new(1024);
    let mut buffer = MessageBuffer::new(16).expect("创建缓冲");
    feed(&mut buffer, &[5, 0]);

    let outcome = framer.decode(&mut buffer).expect("取帧");
    assert_eq!(outcome, FrameOutcome::Incomplete { missing: 2 });
    assert_eq!(buffer.bytes_to_read(), 2, "报文头不足时不得消费");
}

#[test]
fn header_and_payload_may_straddle_blocks() {
    let framer = LengthPrefixedFramer::new(1024);
    let mut buffer = MessageBuffer::new(8).expect("创建缓冲");
    let payload: Vec<u8> = (1..=20).collect();
    let frame = framer.encode(&payload).expect("编码");
    feed(&mut buffer, &[0xAA; 6]);
    feed(&mut buffer, &frame);
    buffer.advance_read_ptr(6).expect("丢弃填充字节，报文头从块内偏移 6 开始");
    assert_eq!(buffer.block_count(), 4);

    let outcome = framer.decode(&mut buffer).expect("取帧");
    assert_eq!(outcome, FrameOutcome::Complete(payload.into()));
    assert!(buffer.is_empty());
    assert_eq!(buffer.block_count(), 1);
}

#[test]
fn partial_frame_reserves_missing_space() {
    let framer = LengthPrefixedFramer::new(1024);
    let mut buffer = MessageBuffer::new(8).expect("创建缓冲");
    let payload = vec![7u8; 40];
    let frame = framer.encode(&payload).expect("编码");
    feed(&mut buffer, &frame[..6]);

    let outcome = framer.decode(&mut buffer).expect("取帧");
    assert_eq!(outcome, FrameOutcome::Incomplete { missing: 38 });
    assert!(buffer.bytes_to_write() >= 38, "应为剩余负载预留空间");
    assert_eq!(buffer.bytes_to_read(), 6);

    let before = buffer.total_bytes();
    feed(&mut buffer, &frame[6..]);
    assert_eq!(buffer.total_bytes(), before, "预留空间足够时不再追加块");
    let outcome = framer.decode(&mut buffer).expect("取帧");
    assert_eq!(outcome, FrameOutcome::Complete(payload.into()));
}

#[test]
fn consecutive_frames_decode_in_order() {
    let framer = LengthPrefixedFramer::default();
    let mut buffer = MessageBuffer::new(32).expect("创建缓冲");
    let first = framer.encode(b"hello").expect("编码");
    let second = framer.encode(b"betterchain").expect("编码");
    feed(&mut buffer, &first);
    feed(&mut buffer, &second);

    assert_eq!(
        framer.decode(&mut buffer).expect("取帧"),
        FrameOutcome::Complete("hello".into())
    );
    assert_eq!(
        framer.decode(&mut buffer).expect("取帧"),
        FrameOutcome::Complete("betterchain".into())
    );
    assert_eq!(
        framer.decode(&mut buffer).expect("取帧"),
        FrameOutcome::Incomplete { missing: 4 }
    );
}

#[test]
fn invalid_lengths_are_rejected_before_consuming() {
    let framer = LengthPrefixedFramer::new(16);
    let mut buffer = MessageBuffer::new(32).expect("创建缓冲");
    feed(&mut buffer, &17u32.to_le_bytes());
    let err = framer.decode(&mut buffer).expect_err("超过上限");
    assert!(matches!(
        err,
        FrameError::InvalidLength {
            length: 17,
            max: 16
        }
    ));
    assert_eq!(buffer.bytes_to_read(), 4);

    let mut buffer = MessageBuffer::new(32).expect("创建缓冲");
    feed(&mut buffer, &0u32.to_le_bytes());
    let err = framer.decode(&mut buffer).expect_err("零长度");
    assert_eq!(err.code(), "betterchain.net.frame.invalid_length");
}

#[test]
fn encode_enforces_payload_bounds() {
    let framer = LengthPrefixedFramer::new(4);
    assert_eq!(
        framer.encode(&[1, 2, 3]).expect("编码").as_ref(),
        &[3, 0, 0, 0, 1, 2, 3]
    );
    assert!(matches!(
        framer.encode(&[]),
        Err(FrameError::InvalidLength { length: 0, .. })
    ));
    assert!(matches!(
        framer.encode(&[0; 5]),
        Err(FrameError::PayloadTooLarge { length: 5, max: 4 })
    ));
}
