//! 任务状态转换规则和验证

use super::types::TaskStatus;
use thiserror::Error;

/// 状态转换错误
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition for task {task_id} from {from:?} to {to:?}")]
    InvalidTransition {
        task_id: u32,
        from: TaskStatus,
        to: TaskStatus,
    },
    #[error("Task {task_id} cannot leave terminal state {state:?}")]
    FromTerminalState { task_id: u32, state: TaskStatus },
}

/// 状态转换
pub struct TaskTransition;

impl TaskTransition {
    /// 验证状态转换是否合法
    pub fn validate(task_id: u32, from: TaskStatus, to: TaskStatus) -> Result<(), TransitionError> {
        // 终态不能转换
        if Self::is_terminal(from) {
            return Err(TransitionError::FromTerminalState {
                task_id,
                state: from,
            });
        }

        let is_valid = match (from, to) {
            (TaskStatus::Pending, TaskStatus::InProgress) => true,
            // 依赖无法满足或被策略跳过时，任务可以不经执行直接跳过
            (TaskStatus::Pending, TaskStatus::Skipped) => true,
            (TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::InProgress, TaskStatus::Skipped) => true,
            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition { task_id, from, to })
        }
    }

    /// 判断是否为终态
    pub fn is_terminal(status: TaskStatus) -> bool {
        matches!(status, TaskStatus::Completed | TaskStatus::Skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(TaskTransition::validate(1, TaskStatus::Pending, TaskStatus::InProgress).is_ok());
        assert!(TaskTransition::validate(1, TaskStatus::Pending, TaskStatus::Skipped).is_ok());
        assert!(TaskTransition::validate(1, TaskStatus::InProgress, TaskStatus::Completed).is_ok());
        assert!(TaskTransition::validate(1, TaskStatus::InProgress, TaskStatus::Skipped).is_ok());
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(TaskTransition::validate(1, TaskStatus::Pending, TaskStatus::Completed).is_err());
        assert!(TaskTransition::validate(1, TaskStatus::InProgress, TaskStatus::Pending).is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(matches!(
            TaskTransition::validate(3, TaskStatus::Completed, TaskStatus::InProgress),
            Err(TransitionError::FromTerminalState { task_id: 3, .. })
        ));
        assert!(TaskTransition::validate(3, TaskStatus::Skipped, TaskStatus::Completed).is_err());
        assert!(TaskTransition::is_terminal(TaskStatus::Skipped));
        assert!(!TaskTransition::is_terminal(TaskStatus::InProgress));
    }
}
