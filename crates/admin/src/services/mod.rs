//! Business logic services for admin.
//!
//! # Services
//!
//! - `order_status` - Status transitions with customer notifications
//! - `dashboard` - Revenue and order statistics
//! - `invoice` - Invoice rendering and delivery

pub mod dashboard;
pub mod invoice;
pub mod order_status;

pub use dashboard::DashboardService;
pub use invoice::{InvoiceError, InvoiceService, render_invoice};
pub use order_status::{OrderStatusService, StatusUpdateError};
