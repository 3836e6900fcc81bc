//! Процессный реестр событий.
//!
//! Единственный общий экземпляр [`EventRegistry`], создаваемый лениво при
//! первом обращении. Свободные функции повторяют операции реестра и
//! делегируют ему; они же — основная точка входа для кода, которому не
//! нужен собственный изолированный реестр.

use std::sync::Arc;

use bytes::Bytes;
use once_cell::sync::Lazy;
use serde::Serialize;

use super::{EventArgs, EventHandler, EventRegistry, RegistrySnapshot, SubscriptionId};
use crate::error::RegistryResult;

static GLOBAL: Lazy<Arc<EventRegistry>> = Lazy::new(EventRegistry::new);

/// Возвращает общий реестр процесса.
pub fn registry() -> Arc<EventRegistry> {
    GLOBAL.clone()
}

/// Подписка в общем реестре; см. [`EventRegistry::subscribe`].
pub fn subscribe(event: &str, handler: &EventHandler) -> SubscriptionId {
    GLOBAL.subscribe(event, handler)
}

/// Одноразовая подписка в общем реестре; см. [`EventRegistry::subscribe_once`].
pub fn subscribe_once(event: &str, handler: &EventHandler) -> SubscriptionId {
    GLOBAL.subscribe_once(event, handler)
}

/// Отписка по значению обработчика; см. [`EventRegistry::unsubscribe`].
pub fn unsubscribe(event: &str, handler: &EventHandler) {
    GLOBAL.unsubscribe(event, handler)
}

/// Отписка по идентификатору; см. [`EventRegistry::unsubscribe_by_id`].
pub fn unsubscribe_by_id(id: SubscriptionId) {
    GLOBAL.unsubscribe_by_id(id)
}

/// Удаление всех подписок события; см. [`EventRegistry::unsubscribe_all`].
pub fn unsubscribe_all(event: &str) {
    GLOBAL.unsubscribe_all(event)
}

/// Полная очистка общего реестра; см. [`EventRegistry::clear`].
pub fn clear() {
    GLOBAL.clear()
}

/// Публикация события; см. [`EventRegistry::emit`].
pub fn emit(event: &str, args: EventArgs) {
    GLOBAL.emit(event, args)
}

/// Публикация строкового события; см. [`EventRegistry::emit_str`].
pub fn emit_str(event: &str, value: impl Into<String>) {
    GLOBAL.emit_str(event, value)
}

/// Публикация бинарного события; см. [`EventRegistry::emit_bytes`].
pub fn emit_bytes(event: &str, payload: Bytes) {
    GLOBAL.emit_bytes(event, payload)
}

/// Публикация значения как JSON; см. [`EventRegistry::emit_json`].
pub fn emit_json<T: Serialize>(event: &str, value: &T) -> RegistryResult<()> {
    GLOBAL.emit_json(event, value)
}

/// Уборка умерших записей; см. [`EventRegistry::sweep`].
pub fn sweep() -> usize {
    GLOBAL.sweep()
}

/// Снимок общего реестра; см. [`EventRegistry::snapshot`].
pub fn snapshot() -> RegistrySnapshot {
    GLOBAL.snapshot()
}

/// Дамп общего реестра; см. [`EventRegistry::debug_dump`].
pub fn debug_dump() -> String {
    GLOBAL.debug_dump()
}

/// Имена событий общего реестра; см. [`EventRegistry::event_names`].
pub fn event_names() -> Vec<String> {
    GLOBAL.event_names()
}

/// Число записей подписок события; см. [`EventRegistry::subscription_count`].
pub fn subscription_count(event: &str) -> usize {
    GLOBAL.subscription_count(event)
}

/// Есть ли строка события; см. [`EventRegistry::contains_event`].
pub fn contains_event(event: &str) -> bool {
    GLOBAL.contains_event(event)
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
