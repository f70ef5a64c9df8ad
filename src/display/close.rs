//! Cash close display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{CashClose, PaymentMethod, PaymentMethodId, StoreId};
use crate::services::reconciliation::UNKNOWN_METHOD_LABEL;

#[derive(Tabled)]
struct CloseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Store")]
    store: String,
    #[tabled(rename = "Compiler")]
    compiler: String,
    #[tabled(rename = "Sales")]
    sales: String,
    #[tabled(rename = "Difference")]
    difference: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

/// Format closes as a table; `store_names` maps ids to names
pub fn format_close_list(closes: &[CashClose], store_names: &HashMap<StoreId, String>) -> String {
    if closes.is_empty() {
        return "No closes found.".to_string();
    }

    let rows = closes.iter().map(|c| CloseRow {
        id: c.id.to_string(),
        date: c.date.to_string(),
        store: store_names
            .get(&c.store_id)
            .cloned()
            .unwrap_or_else(|| c.store_id.to_string()),
        compiler: c.compiler_name.clone(),
        sales: c.total_sales_amount.to_string(),
        difference: c.difference.format_signed(),
        status: c.status.label(),
    });
    Table::new(rows).with(Style::psql()).to_string()
}

/// Full breakdown of one close
pub fn format_close_details(
    close: &CashClose,
    store_name: &str,
    methods: &[PaymentMethod],
    currency: &str,
) -> String {
    let names: HashMap<PaymentMethodId, &str> =
        methods.iter().map(|m| (m.id, m.name.as_str())).collect();
    let money = |m: crate::models::Money| m.format_with_symbol(currency);

    let mut output = String::new();
    output.push_str(&format!("Close {} - {} {}\n", close.id, store_name, close.date));
    output.push_str(&format!("  Compiler:         {}\n", close.compiler_name));
    output.push_str(&format!("  Status:           {}\n", close.status.label()));
    output.push('\n');
    output.push_str(&format!("  Opening fund:     {}\n", money(close.opening_cash_fund)));
    output.push_str(&format!("  Total sales:      {}\n", money(close.total_sales_amount)));
    output.push_str(&format!("  Bank withdrawal:  {}\n", money(close.bank_withdrawal_amount)));
    output.push_str(&format!("  Theoretical fund: {}\n", money(close.theoretical_cash_fund)));
    output.push_str(&format!("  Actual fund:      {}\n", money(close.actual_cash_fund)));
    output.push_str(&format!("  Difference:       {}\n", close.difference.format_signed()));

    if !close.payments.is_empty() {
        output.push_str("\n  Payments:\n");
        for payment in &close.payments {
            let name = names
                .get(&payment.payment_method_id)
                .copied()
                .unwrap_or(UNKNOWN_METHOD_LABEL);
            output.push_str(&format!("    {:<16} {}\n", name, money(payment.amount)));
        }
    }

    if !close.expenses.is_empty() {
        output.push_str("\n  Expenses:\n");
        for expense in &close.expenses {
            output.push_str(&format!("    {:<16} {}\n", expense.description, money(expense.amount)));
        }
    }

    if let Some(receipt) = &close.receipt_image {
        output.push_str(&format!("\n  Receipt: {}\n", receipt));
    }
    if let Some(notes) = &close.notes {
        output.push_str(&format!("  Notes: {}\n", notes));
    }
    output.push_str(&format!(
        "\n  Submitted: {}\n",
        close.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}
