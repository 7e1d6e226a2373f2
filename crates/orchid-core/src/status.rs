use serde::{Deserialize, Serialize};

/// Lifecycle status of a storefront order.
///
/// The wire token is the SCREAMING_SNAKE enum value; the storefront also
/// submits the Thai display labels, so parsing accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    NotProcessed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::NotProcessed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Wire token stored in the database, e.g. `"NOT_PROCESSED"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::NotProcessed => "NOT_PROCESSED",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Thai display label shown in the storefront.
    #[must_use]
    pub fn thai_label(self) -> &'static str {
        match self {
            OrderStatus::NotProcessed => "รอดำเนินการ",
            OrderStatus::Processing => "กำลังดำเนินการ",
            OrderStatus::Shipped => "จัดส่งแล้ว",
            OrderStatus::Delivered => "จัดส่งสำเร็จ",
            OrderStatus::Cancelled => "ยกเลิก",
        }
    }

    /// Parse either the wire token or the Thai display label.
    ///
    /// Input is trimmed first; anything else returns `None`.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == trimmed || s.thai_label() == trimmed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
