//! 有界轮询和可中断等待

use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// 轮询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// 最后一次检查是否满足条件
    pub satisfied: bool,
    /// 执行动作的次数
    pub actions: usize,
}

/// 先检查条件；不满足则执行动作、等待 `interval` 后再检查，
/// 最多执行 `attempts` 次动作。
///
/// `act` 返回 `false` 表示动作目标已不存在，立即停止。
pub async fn poll_until<C, CF, A, AF>(
    attempts: usize,
    interval: Duration,
    mut check: C,
    mut act: A,
) -> Result<PollOutcome>
where
    C: FnMut() -> CF,
    CF: Future<Output = Result<bool>>,
    A: FnMut() -> AF,
    AF: Future<Output = Result<bool>>,
{
    let mut actions = 0;
    loop {
        if check().await? {
            return Ok(PollOutcome {
                satisfied: true,
                actions,
            });
        }
        if actions >= attempts {
            break;
        }
        actions += 1;
        if !act().await? {
            break;
        }
        if !interval.is_zero() {
            tokio::time::sleep(interval).await;
        }
    }
    Ok(PollOutcome {
        satisfied: false,
        actions,
    })
}

/// 等待 `duration`，期间收到停止请求立即返回 `false`
pub async fn wait_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}
