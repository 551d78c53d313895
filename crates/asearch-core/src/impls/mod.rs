//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **DelayedExecutor**: 一定時間後に決まった結果を返す SearchExecutor
//!
//! 本物の検索エンジンとの接続は、このクレートの利用側で SearchExecutor を実装します。

pub mod delayed;

pub use self::delayed::{DelayedExecutor, Outcome};
