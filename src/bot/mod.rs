pub mod telegram;

pub use telegram::{LogNotifier, TelegramConfig, TelegramNotifier};
