use std::fmt;

use serde::Serialize;

use super::{MetricsSnapshot, SubscriptionId};
use crate::error::RegistryResult;

/// Состояние weak-ячейки обработчика на момент снимка.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum HandlerState {
    /// Обработчик жив; хранится адрес его аллокации для отладки.
    Live(String),
    /// Последняя сильная ссылка отпущена; запись ждёт уборки.
    Reclaimed,
}

/// Одна запись таблицы подписок в снимке.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionSnapshot {
    pub id: SubscriptionId,
    pub state: HandlerState,
    /// `true` для once-обёрток, которые реестр удерживает до срабатывания.
    pub pinned: bool,
}

/// Срез одного события: имя и его подписки в порядке оформления.
#[derive(Debug, Clone, Serialize)]
pub struct EventSnapshot {
    pub event: String,
    pub subscriptions: Vec<SubscriptionSnapshot>,
}

/// Полный снимок реестра.
///
/// Только чтение: снятие снимка не вычищает умершие записи, поэтому в нём
/// видны и ячейки в состоянии [`HandlerState::Reclaimed`]. События
/// отсортированы по имени, подписки — по идентификатору, так что вывод
/// детерминирован.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrySnapshot {
    pub events: Vec<EventSnapshot>,
    pub metrics: MetricsSnapshot,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl HandlerState {
    pub fn is_live(&self) -> bool {
        matches!(self, HandlerState::Live(_))
    }
}

impl RegistrySnapshot {
    /// Суммарное число записей подписок по всем событиям.
    pub fn subscription_total(&self) -> usize {
        self.events.iter().map(|e| e.subscriptions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Сериализует снимок в JSON (для внешней диагностики).
    pub fn to_json(&self) -> RegistryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for HandlerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerState::Live(addr) => write!(f, "live @ {addr}"),
            HandlerState::Reclaimed => write!(f, "reclaimed"),
        }
    }
}

impl fmt::Display for RegistrySnapshot {
    /// Человекочитаемый дамп: по строке на подписку, события по алфавиту.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.events.is_empty() {
            return write!(f, "registry: empty");
        }
        writeln!(
            f,
            "registry: {} events, {} subscriptions",
            self.events.len(),
            self.subscription_total()
        )?;
        for event in &self.events {
            writeln!(f, "  {}:", event.event)?;
            for sub in &event.subscriptions {
                write!(f, "    {} {}", sub.id, sub.state)?;
                if sub.pinned {
                    write!(f, " (once)")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
