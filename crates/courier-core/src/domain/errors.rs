//! Errors - 呼び出し失敗の表現
//!
//! worker 側の失敗はすべて `CallbackError` としてデータ化され、
//! `ResultErrorMessage` に載せて controller に返されます。
//! worker 自身の実行コンテキストには伝播しません。

use serde::{Deserialize, Serialize};
use std::fmt;

/// ErrorKind は失敗の分類
///
/// - Invocation: callback 自体がエラーを返した
/// - NotRegistered: 名前に対応する callback が登録されていない
/// - InvalidInput: payload が callback の入力型にデコードできない
/// - InvalidOutput: callback の出力が JSON にエンコードできない
/// - Panicked: callback が panic した（worker は継続）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Invocation,
    NotRegistered,
    InvalidInput,
    InvalidOutput,
    Panicked,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invocation => "invocation",
            Self::NotRegistered => "not_registered",
            Self::InvalidInput => "invalid_input",
            Self::InvalidOutput => "invalid_output",
            Self::Panicked => "panicked",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure detail carried in the `error` field of a `ResultErrorMessage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CallbackError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CallbackError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invocation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Invocation, message)
    }

    pub fn not_registered(callback: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotRegistered,
            format!("no callback registered under '{callback}'"),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOutput, message)
    }

    pub fn panicked(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Panicked, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::invocation(ErrorKind::Invocation, "\"invocation\"")]
    #[case::not_registered(ErrorKind::NotRegistered, "\"not_registered\"")]
    #[case::invalid_input(ErrorKind::InvalidInput, "\"invalid_input\"")]
    #[case::invalid_output(ErrorKind::InvalidOutput, "\"invalid_output\"")]
    #[case::panicked(ErrorKind::Panicked, "\"panicked\"")]
    fn kind_serializes_as_snake_case(#[case] kind: ErrorKind, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&kind).unwrap(), expected);
        assert_eq!(format!("\"{kind}\""), expected);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = CallbackError::invocation("connection refused");
        assert_eq!(err.to_string(), "invocation: connection refused");
    }

    #[test]
    fn not_registered_names_the_callback() {
        let err = CallbackError::not_registered("missing");
        assert_eq!(err.kind, ErrorKind::NotRegistered);
        assert!(err.message.contains("'missing'"));
    }
}
