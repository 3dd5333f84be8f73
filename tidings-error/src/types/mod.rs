pub mod delivery;
pub mod router;

// Публичный экспорт всех типов ошибок из вложенных модулей.
pub use delivery::*;
pub use router::*;
