pub mod catalog;
pub mod discrepancy;
pub mod numbering;
pub mod receiving;
pub mod statistics;
pub mod stock;

pub use catalog::MasterDataService;
pub use discrepancy::DiscrepancyFinding;
pub use numbering::ReceiptNumberService;
pub use receiving::{
    LineItemChanges, NewLineItem, NewReceipt, ReceiptChanges, ReceivingService,
};
pub use statistics::{ReceivingStatistics, ReceivingStatsService};
pub use stock::{SqlStockAdjustment, StockAdjustment};
