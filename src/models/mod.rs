pub mod goods_receipt;
pub mod product;
pub mod receipt_line_item;
pub mod receipt_sequence;
pub mod receipt_status_history;
pub mod supplier;

pub use goods_receipt::ReceiptStatus;
