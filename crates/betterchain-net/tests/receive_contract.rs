//! `receive_contract` 集成测试：真实回环 TCP 连接上的接收路径。
//!
//! # 测试总览（Why）
//! - 校验分散读只提交实际收到的字节，跨块落盘后内容完整；
//! - 校验 `MessageReader` 在帧边界关闭与半帧关闭时给出不同结果；
//! - 非法长度头经接收路径上抛为 `FrameError`。
//!
//! # 执行方式（How）
//! - 服务端绑定 `127.0.0.1:0`，客户端在独立任务中连接并写出测试字节后关闭写端；
//! - 服务端以小块（8/32 字节）构造缓冲，确保每条消息都跨越多个块。

use anyhow::{Context, Result};
use betterchain_net::{
    FrameError, MessageBuffer, MessageReader, NetBufferConfig, ReceiveError, receive_into,
};
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// 启动回环监听，客户端依次写出 `chunks` 后关闭连接，返回服务端一侧的流。
async fn connected_pair(chunks: Vec<Vec<u8>>) -> Result<(TcpStream, JoinHandle<Result<()>>)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .context("绑定回环地址失败")?;
    let addr = listener.local_addr().context("获取监听地址失败")?;
    let client = tokio::spawn(async move {
        let mut stream = TcpStream::connect(addr).await.context("客户端连接失败")?;
        for chunk in chunks {
            stream.write_all(&chunk).await.context("客户端写入失败")?;
            stream.flush().await.context("客户端刷新失败")?;
        }
        stream.shutdown().await.context("客户端关闭写端失败")?;
        Ok::<(), anyhow::Error>(())
    });
    let (server, _) = listener.accept().await.context("服务端接受连接失败")?;
    Ok((server, client))
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = (payload.len() as u32).to_le_bytes().to_vec();
    out.extend_from_slice(payload);
    out
}

fn small_config(chunk_size: usize) -> NetBufferConfig {
    NetBufferConfig {
        chunk_size,
        ..NetBufferConfig::default()
    }
}

#[tokio::test]
async fn receive_into_commits_only_received_bytes() -> Result<()> {
    let payload: Vec<u8> = (0..100u8).collect();
    let (server, client) = connected_pair(vec![payload.clone()]).await?;
    let mut buffer = MessageBuffer::new(32).context("创建缓冲失败")?;

    while buffer.bytes_to_read() < payload.len() {
        let received = receive_into(&server, &mut buffer).await?;
        assert!(received > 0);
    }
    assert_eq!(buffer.bytes_to_read(), 100);
    assert_eq!(buffer.write_index().block(), 3);
    assert_eq!(buffer.write_index().offset(), 4);

    let received = buffer.read_bytes(100)?;
    assert_eq!(received.as_ref(), payload.as_slice());

    let closed = receive_into(&server, &mut buffer)
        .await
        .expect_err("客户端关闭后应返回 Closed");
    assert!(matches!(closed, ReceiveError::Closed { buffered: 0 }));
    assert_eq!(closed.code(), "betterchain.net.receive.closed");

    client.await??;
    Ok(())
}

#[tokio::test]
async fn reader_yields_frames_split_across_writes() -> Result<()> {
    let first = frame(b"block-announcement");
    let second = frame(&[0x5A; 45]);
    let mut wire = first.clone();
    wire.extend_from_slice(&second);
    // 刻意在报文头与负载中间切分。
    let chunks = vec![wire[..2].to_vec(), wire[2..11].to_vec(), wire[11..].to_vec()];

    let (server, client) = connected_pair(chunks).await?;
    let mut reader = MessageReader::from_config(server, &small_config(8))?;

    let message = reader.next_message().await?;
    assert_eq!(message, Some(Bytes::from_static(b"block-announcement")));
    let message = reader.next_message().await?;
    assert_eq!(message, Some(Bytes::from(vec![0x5A; 45])));
    assert_eq!(reader.next_message().await?, None, "帧边界处关闭应返回 None");

    assert!(reader.buffer().is_empty());
    assert_eq!(reader.buffer().block_count(), 1);
    client.await??;
    Ok(())
}

#[tokio::test]
async fn close_in_the_middle_of_a_frame_is_reported() -> Result<()> {
    let partial = frame(b"truncated")[..7].to_vec();
    let (server, client) = connected_pair(vec![partial]).await?;
    let mut reader = MessageReader::from_config(server, &small_config(8))?;

    let err = reader.next_message().await.expect_err("半帧关闭应报错");
    assert!(matches!(err, ReceiveError::Closed { buffered: 7 }));
    client.await??;
    Ok(())
}

#[tokio::test]
async fn oversized_header_is_rejected() -> Result<()> {
    let config = NetBufferConfig {
        chunk_size: 32,
        max_message_length: 16,
    };
    let (server, client) = connected_pair(vec![frame(&[1; 17])]).await?;
    let mut reader = MessageReader::from_config(server, &config)?;

    let err = reader.next_message().await.expect_err("超长声明应报错");
    assert!(matches!(
        err,
        ReceiveError::Frame(FrameError::InvalidLength {
            length: 17,
            max: 16
        })
    ));
    assert_eq!(err.code(), "betterchain.net.frame.invalid_length");

    let (_stream, buffer) = reader.into_parts();
    assert!(buffer.bytes_to_read() >= 4, "非法报文头不得被消费");
    client.await??;
    Ok(())
}
