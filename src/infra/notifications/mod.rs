pub mod log_notifier;
pub mod telegram_client;

pub use log_notifier::LogNotifier;
pub use telegram_client::TelegramClient;
