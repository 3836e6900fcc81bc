use thiserror::Error;

/// Результат операций реестра, способных завершиться ошибкой.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Ошибки реестра событий.
///
/// Базовые операции тотальны: неизвестные события, обработчики и
/// идентификаторы — тихие no-op, а не ошибки. Завершиться ошибкой может
/// только сериализационный слой (`emit_json`, выгрузка снимка).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Не удалось сериализовать значение в JSON.
    #[error("failed to serialize value to JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
