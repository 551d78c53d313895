//! Ports - 抽象化レイヤー
//!
//! 外部（時計、ID 生成、検索エンジン）へのインターフェースを trait で定義し、
//! テストで差し替えられるようにします。

pub mod clock;
pub mod executor;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::executor::SearchExecutor;
pub use self::id_generator::{IdGenerator, UlidGenerator};
