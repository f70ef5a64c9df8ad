//! Store and payment method display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{PaymentMethod, Store};

#[derive(Tabled)]
struct StoreRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Opening Fund")]
    fund: String,
    #[tabled(rename = "Recipients")]
    recipients: usize,
    #[tabled(rename = "Status")]
    status: &'static str,
}

/// Format stores as a table
pub fn format_store_list(stores: &[Store], currency: &str) -> String {
    if stores.is_empty() {
        return "No stores found.".to_string();
    }

    let rows = stores.iter().map(|s| StoreRow {
        id: s.id.to_string(),
        name: s.name.clone(),
        fund: s.opening_cash_fund.format_with_symbol(currency),
        recipients: s.recipients().len(),
        status: if s.active { "Active" } else { "Inactive" },
    });
    Table::new(rows).with(Style::psql()).to_string()
}

pub fn format_store_details(store: &Store, currency: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Store: {}\n", store.name));
    output.push_str(&format!("  ID:           {}\n", store.id));
    output.push_str(&format!(
        "  Status:       {}\n",
        if store.active { "Active" } else { "Inactive" }
    ));
    output.push_str(&format!(
        "  Opening Fund: {}\n",
        store.opening_cash_fund.format_with_symbol(currency)
    ));

    let recipients = store.recipients();
    if recipients.is_empty() {
        output.push_str("  Recipients:   none\n");
    } else {
        output.push_str(&format!("  Recipients:   {}\n", recipients.join(", ")));
    }

    output.push_str(&format!(
        "  Created:      {}\n",
        store.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output
}

#[derive(Tabled)]
struct PaymentMethodRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Cash")]
    cash: &'static str,
    #[tabled(rename = "Status")]
    status: &'static str,
}

pub fn format_payment_method_list(methods: &[PaymentMethod]) -> String {
    if methods.is_empty() {
        return "No payment methods found.".to_string();
    }

    let rows = methods.iter().map(|m| PaymentMethodRow {
        id: m.id.to_string(),
        name: m.name.clone(),
        cash: if m.is_cash { "yes" } else { "no" },
        status: if m.active { "Active" } else { "Inactive" },
    });
    Table::new(rows).with(Style::psql()).to_string()
}
