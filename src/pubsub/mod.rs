//! Подсистема реестра событий (pub/sub со слабыми подписками).
//!
//! Этот модуль реализует внутрипроцессный реестр событий, который не
//! продлевает жизнь своих подписчиков:
//!
//! - `registry`: таблицы подписок, публикация, уборка, снимки.
//! - `subscription`: идентификаторы подписок и тип обработчика.
//! - `args`: позиционные аргументы события.
//! - `global`: общий реестр процесса и свободные функции-делегаты.
//! - `metrics`: счётчики работы реестра.
//! - `snapshot`: типы снимков и отладочный дамп.
//! - `intern` (приватный): пул имён событий.
//!
//! Публичный API переэкспортирует:
//! - `registry::*`
//! - `subscription::*`
//! - `args::*`
//! - `metrics::*`
//! - `snapshot::*`

pub mod args;
pub mod global;
mod intern;
pub mod metrics;
pub mod registry;
pub mod snapshot;
pub mod subscription;

// Публичный экспорт типов из вложенных модулей, чтобы упростить
// доступ к ним из внешнего кода.
pub use args::*;
pub use metrics::*;
pub use registry::*;
pub use snapshot::*;
pub use subscription::*;

pub(crate) use subscription::HandlerId;
