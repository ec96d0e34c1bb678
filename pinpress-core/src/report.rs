//! Admin queue and completed-orders report.

use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

use crate::export::print_filename;
use crate::order::{Order, OrderStatus};

/// Orders still to fulfil, oldest first.
pub fn queue(orders: &[Order]) -> Vec<&Order> {
    let mut pending: Vec<_> = orders.iter().filter(|o| o.status != OrderStatus::Completed).collect();
    pending.sort_by_key(|o| o.timestamp);
    pending
}

/// Fulfilled orders, newest first.
pub fn completed(orders: &[Order]) -> Vec<&Order> {
    let mut done: Vec<_> = orders.iter().filter(|o| o.status == OrderStatus::Completed).collect();
    done.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    done
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub orders: usize,
    pub items: u64,
    pub revenue: u64,
}

pub fn summarize(orders: &[&Order]) -> ReportSummary {
    orders.iter().fold(ReportSummary::default(), |acc, o| ReportSummary {
        orders: acc.orders + 1,
        items: acc.items + o.quantity() as u64,
        revenue: acc.revenue + o.draft.total_price(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Order ID")]
    pub id: String,
    #[serde(rename = "Order Date")]
    pub date: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Size")]
    pub size_label: String,
    #[serde(rename = "Diameter (cm)")]
    pub diameter_cm: Option<f64>,
    #[serde(rename = "Qty")]
    pub quantity: u32,
    #[serde(rename = "Unit Price (Rp)")]
    pub unit_price: u64,
    #[serde(rename = "Total Price (Rp)")]
    pub total_price: u64,
    #[serde(rename = "Image File")]
    pub file_name: String,
}

impl ReportRow {
    pub fn from_order(order: &Order) -> Self {
        let size = order.size_details();
        Self {
            id: order.id.to_string(),
            date: order.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            name: order.name().to_string(),
            size_label: size.map_or_else(|| "Unknown Size".to_string(), |s| s.label.clone()),
            diameter_cm: size.map(|s| s.outer_diameter_cm),
            quantity: order.quantity(),
            unit_price: size.map_or(0, |s| s.price),
            total_price: order.draft.total_price(),
            file_name: size.map_or_else(String::new, |s| {
                print_filename(order.product_type(), order.name(), order.quantity(), s.outer_diameter_cm)
            }),
        }
    }
}

pub fn write_csv<W: Write>(orders: &[&Order], writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);
    for order in orders {
        out.serialize(ReportRow::from_order(order))?;
    }
    out.flush()?;
    Ok(())
}

pub fn report_filename(date: NaiveDate) -> String {
    format!("REPORT_ORDER_PIN_{}.csv", date.format("%Y-%m-%d"))
}
