use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use bytes::Bytes;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, trace};

use super::{
    intern::{intern_event, release_event},
    EventArgs, EventHandler, EventSnapshot, HandlerFn, HandlerId, HandlerState, RegistryMetrics,
    RegistrySnapshot, SubscriptionId, SubscriptionSnapshot,
};
use crate::error::RegistryResult;

type EventKey = Arc<str>;

/// Строка реестра для одного события: две связанные таблицы и пины.
#[derive(Default)]
struct EventEntry {
    /// Идентификатор подписки → weak-ячейка обработчика.
    /// Порядок ключей совпадает с порядком оформления подписок.
    subs: BTreeMap<SubscriptionId, Weak<HandlerFn>>,
    /// Идентичность обработчика → идентификатор его последней подписки.
    by_handler: HashMap<HandlerId, SubscriptionId>,
    /// Сильные ссылки на once-обёртки до их срабатывания или отмены.
    pinned: HashMap<SubscriptionId, EventHandler>,
}

impl EventEntry {
    /// Вычищает записи с умершими обработчиками из обеих таблиц.
    /// Возвращает число удалённых подписок.
    fn clean(&mut self) -> u64 {
        let dead: Vec<SubscriptionId> = self
            .subs
            .iter()
            .filter(|(_, cell)| cell.strong_count() == 0)
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            self.subs.remove(id);
            // ключ обратной таблицы мёртв вместе с обработчиком,
            // поэтому запись ищется сканом по значению
            self.by_handler.retain(|_, mapped| *mapped != *id);
        }
        dead.len() as u64
    }

    /// Снимок порядка вызова: weak-ячейки в порядке идентификаторов.
    fn invocation_order(&self) -> Vec<Weak<HandlerFn>> {
        self.subs.values().cloned().collect()
    }
}

/// Реестр событий со слабыми подписками.
///
/// Подписка не продлевает жизнь обработчика: реестр хранит только
/// `Weak`-даунгрейд пользовательского `Arc`. Обработчик, которого больше
/// никто не держит, подлежит реклейму; его записи вычищаются перед каждой
/// публикацией события и целиком — через [`EventRegistry::sweep`].
///
/// Поддерживает:
/// - Отписку по значению обработчика и по идентификатору подписки
/// - Одноразовые подписки с самоснятием после первого срабатывания
/// - Автоматическое удаление опустевших строк событий
/// - Снимки состояния и счётчики работы
///
/// Ни один замок строки не удерживается во время вызова обработчиков,
/// поэтому обработчики могут свободно обращаться к реестру из своего вызова.
pub struct EventRegistry {
    events: DashMap<EventKey, EventEntry>,
    /// Счётчики работы реестра.
    pub metrics: RegistryMetrics,
}

impl EventRegistry {
    /// Создаёт пустой реестр.
    ///
    /// Возвращает `Arc`: once-обёртки держат слабую обратную ссылку на свой
    /// реестр, чтобы снять себя после срабатывания.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: DashMap::new(),
            metrics: RegistryMetrics::default(),
        })
    }

    ////////////////////////////////////////////////////////////////////////////
    // Подписка
    ////////////////////////////////////////////////////////////////////////////

    /// Подписывает обработчик на событие и возвращает идентификатор подписки.
    ///
    /// Повторная подписка той же аллокации на то же событие выдаёт новый
    /// идентификатор и переписывает на него обратную запись; прежний
    /// идентификатор остаётся в таблице подписок, вызывается, пока жив
    /// обработчик, и снимается только по идентификатору.
    pub fn subscribe(&self, event: &str, handler: &EventHandler) -> SubscriptionId {
        let id = SubscriptionId::next();
        self.insert_subscription(event, id, handler, None);
        trace!("subscribed {} to '{}'", id, event);
        id
    }

    /// Подписывает обработчик одним срабатыванием.
    ///
    /// Регистрируется обёртка: при первом вызове она вызывает пользовательский
    /// обработчик (если тот ещё жив) и тут же снимает себя обычным путём по
    /// идентификатору, не выходя из собственного вызова. До срабатывания
    /// обёртку удерживает сам реестр, поэтому подписка живёт, даже если
    /// вызывающая сторона не сохранила ничего, кроме идентификатора.
    /// Пользовательский обработчик держится слабо, как и при [`subscribe`].
    ///
    /// Отменяется по идентификатору; отписка по значению пользовательского
    /// обработчика одноразовую подписку не находит, т.к. в таблицах стоит
    /// обёртка.
    ///
    /// [`subscribe`]: EventRegistry::subscribe
    pub fn subscribe_once(self: &Arc<Self>, event: &str, handler: &EventHandler) -> SubscriptionId {
        let id = SubscriptionId::next();
        let target = Arc::downgrade(handler);
        let owner = Arc::downgrade(self);
        let fired = AtomicBool::new(false);
        let wrapper: EventHandler = Arc::new(move |args: &EventArgs| {
            // конкурирующие emit могли снять снимок с одной и той же обёрткой
            if fired.swap(true, Ordering::AcqRel) {
                return;
            }
            if let Some(user) = target.upgrade() {
                user(args);
            }
            if let Some(registry) = owner.upgrade() {
                registry.unsubscribe_by_id(id);
            }
        });
        self.insert_subscription(event, id, &wrapper, Some(wrapper.clone()));
        trace!("armed once-subscription {} on '{}'", id, event);
        id
    }

    /// Общий путь вставки: интернирует имя, создаёт строку при первой
    /// подписке, заполняет обе таблицы и при необходимости пин.
    fn insert_subscription(
        &self,
        event: &str,
        id: SubscriptionId,
        handler: &EventHandler,
        pin: Option<EventHandler>,
    ) {
        let key = intern_event(event);
        let mut entry = self.events.entry(key).or_default();
        entry.subs.insert(id, Arc::downgrade(handler));
        entry.by_handler.insert(HandlerId::of(handler), id);
        if let Some(wrapper) = pin {
            entry.pinned.insert(id, wrapper);
        }
        drop(entry);
        self.metrics.subscribe_count.fetch_add(1, Ordering::Relaxed);
    }

    ////////////////////////////////////////////////////////////////////////////
    // Отписка
    ////////////////////////////////////////////////////////////////////////////

    /// Снимает подписку по значению обработчика (идентичность аллокации).
    ///
    /// Неизвестное событие или обработчик — тихий no-op.
    pub fn unsubscribe(&self, event: &str, handler: &EventHandler) {
        let mut pin = None;
        let removed = match self.events.get_mut(event) {
            None => false,
            Some(mut entry) => match entry.by_handler.remove(&HandlerId::of(handler)) {
                None => false,
                Some(id) => {
                    entry.subs.remove(&id);
                    pin = entry.pinned.remove(&id);
                    true
                }
            },
        };
        // пин отпускается вне замка строки
        drop(pin);
        if removed {
            self.metrics
                .unsubscribe_count
                .fetch_add(1, Ordering::Relaxed);
            self.drop_if_empty(event);
            trace!("unsubscribed handler from '{}'", event);
        }
    }

    /// Снимает подписку по её идентификатору.
    ///
    /// Поиск владельца линеен по числу различных имён событий. Запись таблицы
    /// подписок удаляется независимо от того, жив ли обработчик. Обратная
    /// запись удаляется, только если всё ещё указывает на этот идентификатор:
    /// после повторной подписки той же аллокации она указывает на более
    /// новый, и снятие осиротевшей записи её не трогает. Для умершего
    /// обработчика обратная запись ищется сканом по значению.
    /// Неизвестный идентификатор — тихий no-op.
    pub fn unsubscribe_by_id(&self, id: SubscriptionId) {
        let owner: Option<EventKey> = self.events.iter().find_map(|entry| {
            entry
                .value()
                .subs
                .contains_key(&id)
                .then(|| entry.key().clone())
        });
        let Some(event) = owner else {
            return;
        };
        let mut resolved = None;
        let mut pin = None;
        let removed = match self.events.get_mut(&*event) {
            None => false,
            Some(mut entry) => match entry.subs.remove(&id) {
                None => false,
                Some(cell) => {
                    match cell.upgrade() {
                        Some(live) => {
                            let hid = HandlerId::of(&live);
                            if entry.by_handler.get(&hid) == Some(&id) {
                                entry.by_handler.remove(&hid);
                            }
                            resolved = Some(live);
                        }
                        None => {
                            entry.by_handler.retain(|_, mapped| *mapped != id);
                        }
                    }
                    pin = entry.pinned.remove(&id);
                    true
                }
            },
        };
        // снятые сильные ссылки отпускаются уже после замка строки:
        // деструкторы обработчика не выполняются под ним
        drop(resolved);
        drop(pin);
        if removed {
            self.metrics
                .unsubscribe_count
                .fetch_add(1, Ordering::Relaxed);
            self.drop_if_empty(&event);
            trace!("unsubscribed {} from '{}'", id, event);
        }
    }

    /// Удаляет строку события целиком: все подписки, обратные записи и пины.
    ///
    /// Неизвестное событие — тихий no-op. Следующая подписка создаст строку
    /// заново.
    pub fn unsubscribe_all(&self, event: &str) {
        if let Some((key, entry)) = self.events.remove(event) {
            let dropped = entry.subs.len() as u64;
            self.metrics
                .unsubscribe_count
                .fetch_add(dropped, Ordering::Relaxed);
            release_event(&key);
            debug!("removed event '{}' with {} subscriptions", key, dropped);
        }
    }

    /// Полная очистка: удаляет все строки и выпускает их имена из пула.
    pub fn clear(&self) {
        let keys: Vec<EventKey> = self.events.iter().map(|e| e.key().clone()).collect();
        let mut dropped = 0u64;
        for key in keys {
            if let Some((_, entry)) = self.events.remove(&*key) {
                dropped += entry.subs.len() as u64;
                release_event(&key);
            }
        }
        self.metrics
            .unsubscribe_count
            .fetch_add(dropped, Ordering::Relaxed);
        debug!("registry cleared: {} subscriptions dropped", dropped);
    }

    ////////////////////////////////////////////////////////////////////////////
    // Публикация
    ////////////////////////////////////////////////////////////////////////////

    /// Публикует событие с позиционными аргументами.
    ///
    /// Сначала строка чистится от умерших записей, затем под замком снимается
    /// снимок живых ячеек в порядке подписки, и уже без замка обработчики
    /// вызываются по одному. Ячейка, умершая между снимком и вызовом, молча
    /// пропускается. Обработчик может подписываться, отписываться (включая
    /// самого себя) и публиковать из собственного вызова; такие изменения
    /// видны со следующей публикации, а не в текущем снимке.
    ///
    /// Паники обработчиков не изолируются и уходят вызывающей стороне;
    /// таблицы при этом остаются согласованными, т.к. вся правка закончена
    /// до первого вызова. Событие без таблицы — тихий no-op.
    pub fn emit(&self, event: &str, args: EventArgs) {
        self.metrics.emit_count.fetch_add(1, Ordering::Relaxed);
        let snapshot = match self.events.get_mut(event) {
            None => return,
            Some(mut entry) => {
                let purged = entry.clean();
                if purged > 0 {
                    self.metrics.purged_count.fetch_add(purged, Ordering::Relaxed);
                }
                entry.invocation_order()
            }
        };
        self.drop_if_empty(event);

        let mut invoked = 0u64;
        for cell in &snapshot {
            match cell.upgrade() {
                Some(handler) => {
                    handler(&args);
                    invoked += 1;
                }
                None => {
                    self.metrics.skipped_dead.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        if invoked > 0 {
            self.metrics.invoke_count.fetch_add(invoked, Ordering::Relaxed);
        }
        trace!("emitted '{}' to {} handlers", event, invoked);
    }

    /// Публикует событие с одним строковым аргументом.
    pub fn emit_str(&self, event: &str, value: impl Into<String>) {
        self.emit(event, EventArgs::one(value.into()));
    }

    /// Публикует событие с одним бинарным аргументом.
    pub fn emit_bytes(&self, event: &str, payload: Bytes) {
        self.emit(event, EventArgs::one(payload));
    }

    /// Сериализует значение в JSON и публикует его одним аргументом.
    pub fn emit_json<T: Serialize>(&self, event: &str, value: &T) -> RegistryResult<()> {
        let json = serde_json::to_value(value)?;
        self.emit(event, EventArgs::one(json));
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    // Уборка
    ////////////////////////////////////////////////////////////////////////////

    /// Вычищает умершие записи по всем событиям и снимает опустевшие строки.
    ///
    /// Возвращает число удалённых подписок. Повторный вызов без изменений
    /// между ними вернёт 0; живые подписки не затрагиваются.
    pub fn sweep(&self) -> usize {
        let keys: Vec<EventKey> = self.events.iter().map(|e| e.key().clone()).collect();
        let mut purged = 0u64;
        for key in keys {
            if let Some(mut entry) = self.events.get_mut(&*key) {
                purged += entry.clean();
            }
            self.drop_if_empty(&key);
        }
        if purged > 0 {
            self.metrics.purged_count.fetch_add(purged, Ordering::Relaxed);
            debug!("sweep purged {} dead subscriptions", purged);
        }
        purged as usize
    }

    /// Снимает строку события, если она опустела, и выпускает её имя.
    /// Проверка и удаление атомарны относительно конкурентной подписки.
    fn drop_if_empty(&self, event: &str) {
        if let Some((key, _)) = self
            .events
            .remove_if(event, |_, entry| entry.subs.is_empty())
        {
            release_event(&key);
            debug!("event '{}' has no subscriptions left, row dropped", key);
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Интроспекция
    ////////////////////////////////////////////////////////////////////////////

    /// Имена событий, имеющих хотя бы одну запись (включая ещё не вычищенные),
    /// по алфавиту.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.events.iter().map(|e| e.key().to_string()).collect();
        names.sort();
        names
    }

    /// Число записей подписок события, включая умершие до уборки.
    pub fn subscription_count(&self, event: &str) -> usize {
        self.events.get(event).map(|e| e.subs.len()).unwrap_or(0)
    }

    pub fn contains_event(&self, event: &str) -> bool {
        self.events.contains_key(event)
    }

    /// Полный снимок реестра: события, подписки, состояние ячеек, счётчики.
    ///
    /// Только чтение: записи, ждущие уборки, остаются на месте и видны в
    /// снимке как [`HandlerState::Reclaimed`].
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut events: Vec<EventSnapshot> = self
            .events
            .iter()
            .map(|entry| EventSnapshot {
                event: entry.key().to_string(),
                subscriptions: entry
                    .value()
                    .subs
                    .iter()
                    .map(|(id, cell)| SubscriptionSnapshot {
                        id: *id,
                        // адрес берётся из слабой ячейки без поднятия сильной
                        // ссылки: аллокация удерживается самой ячейкой
                        state: if cell.strong_count() > 0 {
                            HandlerState::Live(format!(
                                "{:p}",
                                cell.as_ptr() as *const ()
                            ))
                        } else {
                            HandlerState::Reclaimed
                        },
                        pinned: entry.value().pinned.contains_key(id),
                    })
                    .collect(),
            })
            .collect();
        events.sort_by(|a, b| a.event.cmp(&b.event));
        RegistrySnapshot {
            events,
            metrics: self.metrics.snapshot(),
        }
    }

    /// Человекочитаемый дамп состояния для отладки. Реестр не изменяется.
    pub fn debug_dump(&self) -> String {
        self.snapshot().to_string()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
