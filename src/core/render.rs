use crate::core::{OutputFile, OutputFormat};
use crate::domain::model::{LabelTotal, SettlementReport, TransactionLine};
use crate::domain::services::currency::format_amount;
use crate::utils::error::Result;
use std::io::{Cursor, Write};
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_JSON: &str = "report.json";
pub const BALANCES_CSV: &str = "balances.csv";
pub const BY_CATEGORY_CSV: &str = "by_category.csv";
pub const BY_PAYEE_CSV: &str = "by_payee.csv";
pub const BY_PAYER_SHARE_CSV: &str = "by_payer_share.csv";
pub const BY_DAY_CSV: &str = "by_day.csv";
pub const TRANSACTIONS_CSV: &str = "transactions.csv";
pub const RECENT_TRANSACTIONS_CSV: &str = "recent_transactions.csv";

/// 將結算報表轉為輸出檔案，金額固定兩位小數
pub fn render(report: &SettlementReport, formats: &[OutputFormat]) -> Result<Vec<OutputFile>> {
    let mut outputs = Vec::new();

    if formats.contains(&OutputFormat::Json) {
        outputs.push(OutputFile {
            name: REPORT_JSON.to_string(),
            contents: serde_json::to_vec_pretty(report)?,
        });
    }

    if formats.contains(&OutputFormat::Csv) {
        outputs.push(OutputFile {
            name: BALANCES_CSV.to_string(),
            contents: balances_csv(report)?,
        });
        for (name, totals) in [
            (BY_CATEGORY_CSV, &report.by_category),
            (BY_PAYEE_CSV, &report.by_payee),
            (BY_PAYER_SHARE_CSV, &report.by_payer_share),
            (BY_DAY_CSV, &report.by_day),
        ] {
            outputs.push(OutputFile {
                name: name.to_string(),
                contents: totals_csv(totals)?,
            });
        }
        for (name, lines) in [
            (TRANSACTIONS_CSV, &report.transactions),
            (RECENT_TRANSACTIONS_CSV, &report.recent_transactions),
        ] {
            outputs.push(OutputFile {
                name: name.to_string(),
                contents: transactions_csv(lines)?,
            });
        }
    }

    Ok(outputs)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

fn balances_csv(report: &SettlementReport) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["memberId", "displayName", "totalPaid", "totalOwed", "netBalance"])?;
    for balance in &report.balances {
        writer.write_record([
            balance.member_id.as_str(),
            balance.display_name.as_str(),
            format_amount(balance.total_paid).as_str(),
            format_amount(balance.total_owed).as_str(),
            format_amount(balance.net_balance).as_str(),
        ])?;
    }
    finish(writer)
}

fn totals_csv(totals: &[LabelTotal]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["label", "total"])?;
    for entry in totals {
        writer.write_record([entry.label.as_str(), format_amount(entry.total).as_str()])?;
    }
    finish(writer)
}

fn transactions_csv(lines: &[TransactionLine]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "groupId",
        "date",
        "description",
        "category",
        "payees",
        "total",
        "rows",
    ])?;
    for line in lines {
        let date = line
            .date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        writer.write_record([
            line.group_id.as_str(),
            date.as_str(),
            line.description.as_str(),
            line.category.as_str(),
            line.payee_list().as_str(),
            format_amount(line.total).as_str(),
            line.rows.to_string().as_str(),
        ])?;
    }
    finish(writer)
}

/// Packs every output into one zip archive.
pub fn bundle(outputs: &[OutputFile]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    for output in outputs {
        zip.start_file::<_, ()>(output.name.as_str(), FileOptions::default())?;
        zip.write_all(&output.contents)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
