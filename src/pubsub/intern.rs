use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;

/// Пул для повторного использования `Arc<str>` по одинаковым именам событий.
/// Crate-private: другие модули внутри этого крейта видят, а внешние — нет.
static EVENT_INTERN: Lazy<DashMap<String, Arc<str>>> = Lazy::new(DashMap::new);

/// Возвращает interned `Arc<str>` для данного имени события.
/// При первом вызове для нового имени создаёт `Arc<str>` и сохраняет его в пуле.
#[inline(always)]
pub(crate) fn intern_event<S: AsRef<str>>(name: S) -> Arc<str> {
    let key = name.as_ref();
    if let Some(existing) = EVENT_INTERN.get(key) {
        return existing.clone();
    }
    EVENT_INTERN
        .entry(key.to_string())
        .or_insert_with(|| Arc::from(key))
        .clone()
}

/// Выпускает имя из пула: строка события, удалённая из реестра, не должна
/// удерживать свою аллокацию. Уже выданные `Arc<str>` остаются валидными;
/// следующий intern того же имени создаст новую аллокацию.
#[inline]
pub(crate) fn release_event(name: &str) {
    EVENT_INTERN.remove(name);
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    /// Проверяет, что при первом вызове создаётся `Arc<str>` с правильным
    /// содержимым, а при повторном — возвращается тот же самый объект.
    #[test]
    fn intern_new_and_repeats() {
        let a1 = intern_event("intern_kin");
        assert_eq!(&*a1, "intern_kin");

        // второй раз pointer должен совпадать
        let a2 = intern_event("intern_kin");
        assert!(
            Arc::ptr_eq(&a1, &a2),
            "Должен вернуть тот же Arc по указателю"
        );
    }

    /// Проверяет, что для разных имён событий создаются разные `Arc<str>`.
    #[test]
    fn intern_different_keys() {
        let a1 = intern_event("intern_dzadza");
        let a2 = intern_event("intern_maz");
        assert_eq!(&*a1, "intern_dzadza");
        assert_eq!(&*a2, "intern_maz");
        assert!(!Arc::ptr_eq(&a1, &a2), "Разные ключи - разные Arc");
    }

    /// Проверяет, что строка из `String` и строковый литерал с одинаковым
    /// содержимым интернируются в один `Arc<str>`.
    #[test]
    fn intern_mixed_static_and_string() {
        let s = String::from("intern_hello");
        let a1 = intern_event(&s as &str);
        let a2 = intern_event("intern_hello");
        assert!(Arc::ptr_eq(&a1, &a2), "Arc должен выдаваться единообразно");
    }

    /// Проверяет, что после `release_event` имя не возвращается из пула:
    /// старый `Arc` живёт, но повторный intern даёт новую аллокацию.
    #[test]
    fn release_detaches_name_from_pool() {
        let a1 = intern_event("intern_released");
        release_event("intern_released");

        // старый Arc всё ещё валиден
        assert_eq!(&*a1, "intern_released");

        let a2 = intern_event("intern_released");
        assert_eq!(&*a2, "intern_released");
        assert!(
            !Arc::ptr_eq(&a1, &a2),
            "После release пул не должен помнить старую аллокацию"
        );
    }

    /// Проверяет, что `release_event` неизвестного имени — тихий no-op.
    #[test]
    fn release_unknown_is_noop() {
        release_event("intern_never_seen");
    }

    /// Проверяет, что при конкурентных вызовах `intern_event` для одинаковых
    /// строк в разных потоках возвращается один и тот же `Arc<str>`.
    #[test]
    fn intern_concurrent() {
        let keys = [
            "intern_par_a",
            "intern_par_b",
            "intern_par_a",
            "intern_par_c",
            "intern_par_b",
            "intern_par_a",
        ];
        let handles: Vec<_> = keys
            .iter()
            .map(|&k| std::thread::spawn(move || intern_event(k)))
            .collect();

        let arcs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // все "intern_par_a" должны указывать на один Arc.
        let a1 = arcs[0].clone();
        for arc in arcs.iter().filter(|arc| (*arc).as_ref() == "intern_par_a") {
            assert!(
                Arc::ptr_eq(&a1, arc),
                "Все interned для \"intern_par_a\" должны ссылаться на один Arc"
            );
        }
    }
}
