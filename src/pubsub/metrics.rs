use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Счётчики работы реестра.
///
/// Обновляются relaxed-атомиками на горячем пути; точность на уровне
/// «монотонные итоги за время жизни реестра», без попарной согласованности
/// между счётчиками в конкретный момент.
#[derive(Debug, Default)]
pub struct RegistryMetrics {
    /// Всего вызовов `emit` (включая события без единой подписки).
    pub emit_count: AtomicU64,
    /// Всего фактически вызванных обработчиков.
    pub invoke_count: AtomicU64,
    /// Ячейки, умершие между снимком и вызовом; такие вызовы молча пропущены.
    pub skipped_dead: AtomicU64,
    /// Всего оформленных подписок (once-обёртки считаются подпиской).
    pub subscribe_count: AtomicU64,
    /// Подписки, снятые по явному запросу (любой путь отписки).
    pub unsubscribe_count: AtomicU64,
    /// Мёртвые подписки, вычищенные уборкой перед emit или через sweep.
    pub purged_count: AtomicU64,
}

/// Снимок счётчиков обычными числами: для сериализации, логов и дампов.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub emit_count: u64,
    pub invoke_count: u64,
    pub skipped_dead: u64,
    pub subscribe_count: u64,
    pub unsubscribe_count: u64,
    pub purged_count: u64,
}

impl RegistryMetrics {
    /// Считывает все счётчики в обычную структуру.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            emit_count: self.emit_count.load(Ordering::Relaxed),
            invoke_count: self.invoke_count.load(Ordering::Relaxed),
            skipped_dead: self.skipped_dead.load(Ordering::Relaxed),
            subscribe_count: self.subscribe_count.load(Ordering::Relaxed),
            unsubscribe_count: self.unsubscribe_count.load(Ordering::Relaxed),
            purged_count: self.purged_count.load(Ordering::Relaxed),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
