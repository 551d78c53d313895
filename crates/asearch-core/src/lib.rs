//! asearch-core
//!
//! Core building blocks for asynchronous search coordination:
//! submit a search, poll it by id with a bounded wait, extend its
//! retention, and drop it when it expires or is deleted.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, handle, time_value, request, response, wire, errors）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, SearchExecutor）
//! - **app**: アプリケーションロジック（registry, retention, waiter, service, config, rest）
//! - **impls**: 実装（DelayedExecutor など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
