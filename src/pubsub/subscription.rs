use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use serde::Serialize;

use super::EventArgs;

/// Сигнатура обработчика события: вызывается с позиционными аргументами
/// публикации. Обязан быть `Send + Sync`, т.к. реестр используется из
/// нескольких потоков.
pub type HandlerFn = dyn Fn(&EventArgs) + Send + Sync;

/// Владеющая ссылка на обработчик. Вызывающая сторона держит `Arc`,
/// реестр — только `Weak`-даунгрейд: подписка не продлевает жизнь
/// обработчика. Идентичность обработчика — идентичность аллокации `Arc`:
/// клоны одного `Arc` считаются одним обработчиком, два отдельно созданных
/// `Arc` с одинаковым кодом — разными.
pub type EventHandler = Arc<HandlerFn>;

/// Заворачивает замыкание в [`EventHandler`].
pub fn handler<F>(f: F) -> EventHandler
where
    F: Fn(&EventArgs) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Глобальный счётчик идентификаторов подписок. Ид выдаются строго
/// возрастающими и никогда не переиспользуются за время жизни процесса,
/// в том числе между разными экземплярами реестра.
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Идентификатор подписки.
///
/// Непрозрачный токен, выдаваемый при подписке. Снаружи его нельзя
/// сконструировать, только получить из `subscribe`/`subscribe_once`.
/// Порядок идентификаторов совпадает с порядком оформления подписок.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionId(u64);

/// Идентичность обработчика: адрес аллокации `Arc`. Ключ обратной таблицы.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct HandlerId(usize);

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SubscriptionId {
    /// Выдаёт следующий свободный идентификатор.
    pub(crate) fn next() -> Self {
        Self(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Числовое значение идентификатора (для логов и дампов).
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl HandlerId {
    /// Идентичность аллокации: указатель без метаданных vtable.
    pub(crate) fn of(handler: &EventHandler) -> Self {
        Self(Arc::as_ptr(handler) as *const () as usize)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Проверяет, что идентификаторы выдаются строго возрастающими.
    #[test]
    fn ids_are_monotonic() {
        let a = SubscriptionId::next();
        let b = SubscriptionId::next();
        let c = SubscriptionId::next();
        assert!(a < b && b < c);
        assert!(a.as_u64() < b.as_u64());
    }

    /// Проверяет уникальность идентификаторов при конкурентной выдаче
    /// из нескольких потоков.
    #[test]
    fn ids_are_unique_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| (0..100).map(|_| SubscriptionId::next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = HashSet::new();
        for h in handles {
            for id in h.join().unwrap() {
                assert!(all.insert(id), "идентификатор выдан дважды: {id}");
            }
        }
        assert_eq!(all.len(), 800);
    }

    /// Проверяет формат отображения идентификатора.
    #[test]
    fn id_display_format() {
        let id = SubscriptionId(42);
        assert_eq!(id.to_string(), "#42");
    }

    /// Проверяет, что клоны одного `Arc` дают одну идентичность,
    /// а отдельные аллокации — разные.
    #[test]
    fn handler_identity_follows_allocation() {
        let a = handler(|_args: &EventArgs| {});
        let a_clone = a.clone();
        let b = handler(|_args: &EventArgs| {});

        assert_eq!(HandlerId::of(&a), HandlerId::of(&a_clone));
        assert_ne!(HandlerId::of(&a), HandlerId::of(&b));
    }
}
