use crate::types::InfraError;
use thiserror::Error;

/// ニュースAPIのエラー型
/// 呼び出し側に見せるメッセージはValidation/Conflictに含める
#[derive(Error, Debug)]
pub enum NewsError {
    /// 入力値が不正 (ID欠落・長さ超過・未知のソートフィールドなど)
    #[error("{message}")]
    Validation { message: String },

    /// 一意制約・整合性制約の違反
    #[error("{message}")]
    Conflict { message: String },

    /// 指定IDの記事が存在しない
    #[error("News article not found.")]
    NotFound,

    /// インフラ層のエラー (詳細は呼び出し側に返さない)
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl NewsError {
    /// 入力値エラーを作成
    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// 競合エラーを作成
    pub fn conflict<M: Into<String>>(message: M) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// ニュースAPIのResult型エイリアス
pub type NewsResult<T> = std::result::Result<T, NewsError>;
