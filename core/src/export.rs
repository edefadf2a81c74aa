//! CSV export for vendor line items and risk-flagged devices.
//!
//! Every file carries a header row and quotes every field.

use crate::{
    error::ForecastResult,
    risk::RiskMarginRow,
    vendor::VendorRollup,
};
use csv::{QuoteStyle, Writer, WriterBuilder};
use std::fs::File;
use std::io;
use std::path::Path;

const VENDOR_HEADER: &[&str] = &[
    "Supplier",
    "Equipment",
    "SKU",
    "Cartridge",
    "Style",
    "Color",
    "Quantity",
    "Unit_Price",
    "Extended_Spend",
];

const RISK_HEADER: &[&str] = &[
    "Customer",
    "Serial_Number",
    "Printer_Model",
    "Contract_Status",
    "Black_Volume",
    "Color_Volume",
    "Revenue",
    "Cost",
    "GM_Dollar",
    "Risk_Level",
    "Offline",
];

fn quoted<W: io::Write>(out: W) -> Writer<W> {
    WriterBuilder::new().quote_style(QuoteStyle::Always).from_writer(out)
}

pub fn write_vendor_lines<W: io::Write>(rollup: &VendorRollup, out: W) -> ForecastResult<()> {
    let mut writer = quoted(out);
    writer.write_record(VENDOR_HEADER)?;
    for line in rollup.lines() {
        let equipment = line.equipment.iter().cloned().collect::<Vec<_>>().join("; ");
        writer.write_record([
            line.supplier.clone(),
            equipment,
            line.sku.clone(),
            line.cartridge.clone(),
            line.style.clone(),
            line.color.label().to_string(),
            line.quantity.to_string(),
            format!("{:.2}", line.unit_price),
            format!("{:.2}", line.spend),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_risk_rows<W: io::Write>(rows: &[RiskMarginRow], out: W) -> ForecastResult<()> {
    let mut writer = quoted(out);
    writer.write_record(RISK_HEADER)?;
    for row in rows {
        writer.write_record([
            row.customer.clone(),
            row.serial.clone(),
            row.model.clone(),
            row.status.clone(),
            format!("{:.0}", row.black_volume),
            format!("{:.0}", row.color_volume),
            format!("{:.2}", row.revenue),
            format!("{:.2}", row.cost),
            format!("{:.2}", row.gm_dollar),
            row.risk.label().to_string(),
            if row.offline { "Yes" } else { "No" }.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn vendor_csv_file(rollup: &VendorRollup, path: impl AsRef<Path>) -> ForecastResult<()> {
    let file = File::create(path.as_ref())?;
    write_vendor_lines(rollup, file)?;
    log::info!("export: vendor lines written to {}", path.as_ref().display());
    Ok(())
}

pub fn risk_csv_file(rows: &[RiskMarginRow], path: impl AsRef<Path>) -> ForecastResult<()> {
    let file = File::create(path.as_ref())?;
    write_risk_rows(rows, file)?;
    log::info!("export: {} risk row(s) written to {}", rows.len(), path.as_ref().display());
    Ok(())
}
