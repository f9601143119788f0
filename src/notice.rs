use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn label(&self) -> &'static str {
        match self {
            NoticeLevel::Info => "INFO",
            NoticeLevel::Warning => "WARN",
            NoticeLevel::Error => "ERROR",
        }
    }
}

/// A user-visible message. Empty or partial results are reported this way,
/// never as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn enter_asin() -> Self {
        Self::info("Please enter an ASIN to see Inventory & Orders.")
    }

    pub fn no_inventory(asin: &str) -> Self {
        Self::warning(format!("No Inventory data found for {asin} in this period."))
    }

    pub fn no_orders_table() -> Self {
        Self::info("No order table loaded; showing inventory only.")
    }

    pub fn no_regional_orders(region: &str) -> Self {
        Self::info(format!("No {region} Orders found."))
    }
}
