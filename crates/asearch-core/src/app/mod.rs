//! App - アプリケーション層
//!
//! domain と ports を組み合わせて、非同期検索のライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **AsyncSearchRegistry**: handle → エントリの表（登録・延長・完了・削除）
//! - **RetentionTimer**: expires_at での期限切れ
//! - **wait_for_completion**: 完了またはタイムアウトまでの待機
//! - **AsyncSearchService**: submit / get / delete の入口
//! - **ServiceBuilder**: サービスの構築と設定の検証
//! - **rest**: HTTP パラメータからの変換とエラー本文

pub mod builder;
pub mod config;
pub mod registry;
pub mod rest;
pub mod retention;
pub mod service;
pub mod status;
pub mod waiter;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, ServiceBuilder};
pub use self::config::{AsyncSearchConfig, ConfigError};
pub use self::registry::{AsyncSearchRegistry, SearchEntry};
pub use self::rest::{DeleteAsyncSearchParams, GetAsyncSearchParams, error_body};
pub use self::retention::deadline_after;
pub use self::service::AsyncSearchService;
pub use self::status::RegistryCounts;
pub use self::waiter::wait_for_completion;
